//! # Evaluation Context
//!
//! The explicit scope record threaded through block evaluation. Entering
//! a block pushes a context derived from its parent; exiting restores the
//! parent on every path, including errors and cancellation, because the
//! stack discipline lives in one place (`Evaluator::with_scope`).
//!
//! A context carries the block's accumulated sibling transform (the
//! "cursor" advanced by `translate`/`rotate`/`scale`), the node-local
//! transform set by `position`/`orientation`/`size`, inherited material
//! and detail state, the scoped random sequence, user symbol bindings,
//! and the child values the block consumes when it closes.

use std::collections::HashMap;

use carve_mesh::math::Transform;
use carve_mesh::{Color, Material, Texture};
use carve_parser::Span;

use crate::random::RandomSequence;
use crate::value::Value;

use config::constants::DEFAULT_DETAIL;

// =============================================================================
// BLOCK CLASSES
// =============================================================================

/// Categories of block, determining the allowed member symbols and what
/// the block produces when it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockClass {
    /// Top level of a document.
    Root,
    /// `group` and the boolean containers.
    Container,
    /// Solid primitives (`cube`, `sphere`, ...).
    Primitive,
    /// Path-producing shapes (`circle`, `square`, `polygon`, `roundrect`).
    PathShape,
    /// The `path` block with `point`/`curve`/`polygon` commands.
    PathBlock,
    /// Path-consuming builders (`extrude`, `lathe`, `loft`, `fill`, `hull`).
    Builder,
    /// `camera`.
    Camera,
    /// `light`.
    Light,
    /// `text` (degrades to empty paths without a font engine).
    TextBlock,
    /// `svgpath` (degrades to empty paths; no SVG sub-parser is hosted).
    SvgPath,
    /// `debug` (passes children through, logging them).
    Debug,
    /// `mesh` (collects raw polygons/meshes).
    MeshBlock,
}

impl BlockClass {
    /// True when this block type can contain mesh-producing children.
    pub fn accepts_meshes(&self) -> bool {
        matches!(
            self,
            Self::Root | Self::Container | Self::Debug | Self::MeshBlock
        )
    }

    /// True when this block type consumes path children.
    pub fn accepts_paths(&self) -> bool {
        matches!(
            self,
            Self::Builder | Self::PathBlock | Self::Root | Self::Container | Self::Debug
        )
    }
}

/// Background of a scene or camera.
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    /// Flat color.
    Color(Color),
    /// Image.
    Texture(Texture),
}

/// Per-block extras set by block-specific option commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockExtras {
    /// Side count for `polygon`, `pyramid`, and `prism`.
    pub sides: Option<u32>,
    /// Corner radius for `roundrect`, circumradius for `polygon`.
    pub radius: Option<f64>,
    /// Guide path for `extrude`.
    pub along: Option<carve_mesh::Path>,
    /// Camera field of view in half-turns.
    pub fov: Option<f64>,
    /// Camera output width hint.
    pub width: Option<f64>,
    /// Camera output height hint.
    pub height: Option<f64>,
    /// Light spread angle in half-turns.
    pub spread: f64,
    /// Light penumbra fraction.
    pub penumbra: f64,
}

// =============================================================================
// CONTEXT
// =============================================================================

/// One evaluation scope.
#[derive(Debug, Clone)]
pub struct Context {
    /// What kind of block this scope belongs to.
    pub block: BlockClass,
    /// Source span of the block call.
    pub span: Span,
    /// Sibling cursor: accumulated `translate`/`rotate`/`scale`, applied
    /// to children created after those commands.
    pub cursor: Transform,
    /// This block's own placement from `position`/`orientation`/`size`.
    pub local: Transform,
    /// Inherited material state.
    pub material: Material,
    /// Curve tessellation quality.
    pub detail: u32,
    /// Normal-smoothing threshold in half-turns.
    pub smoothing: Option<f64>,
    /// Current font name.
    pub font: Option<String>,
    /// Name for the node this block produces.
    pub name: Option<String>,
    /// Scene or camera background.
    pub background: Option<Background>,
    /// Scoped random sequence (inherited by value: reseeding inside a
    /// block does not disturb the parent).
    pub random: RandomSequence,
    /// Camera/light extras.
    pub extras: BlockExtras,
    /// Child values accumulated for the block to consume.
    pub children: Vec<Value>,
    /// User-defined symbols in this scope.
    pub symbols: HashMap<String, Value>,
}

impl Context {
    /// The root context of a document.
    pub fn root() -> Self {
        Self {
            block: BlockClass::Root,
            span: Span::zero(),
            cursor: Transform::IDENTITY,
            local: Transform::IDENTITY,
            material: Material::default(),
            detail: DEFAULT_DETAIL,
            smoothing: None,
            font: None,
            name: None,
            background: None,
            random: RandomSequence::default(),
            extras: BlockExtras::default(),
            children: Vec::new(),
            symbols: HashMap::new(),
        }
    }

    /// A child scope for entering a block.
    ///
    /// Material, detail, smoothing, font, and the random state are
    /// inherited; transforms, name, children, and bindings start fresh.
    pub fn child(&self, block: BlockClass, span: Span) -> Self {
        Self {
            block,
            span,
            cursor: Transform::IDENTITY,
            local: Transform::IDENTITY,
            material: self.material.clone(),
            detail: self.detail,
            smoothing: self.smoothing,
            font: self.font.clone(),
            name: None,
            background: None,
            random: self.random.clone(),
            extras: BlockExtras::default(),
            children: Vec::new(),
            symbols: HashMap::new(),
        }
    }

    /// Defines (or shadows) a symbol in this scope.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.symbols.insert(name.into(), value);
    }

    /// Looks up a symbol in this scope only.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.symbols.get(name)
    }
}

// =============================================================================
// TESTS
// =============================================================================
