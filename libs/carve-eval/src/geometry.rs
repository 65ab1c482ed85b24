//! # Geometry Nodes
//!
//! The scene graph produced by evaluation. Each node knows how to build
//! its mesh on demand: children build first (depth-first), boolean nodes
//! fold their children left to right, and every build step polls the
//! cancellation callback.
//!
//! Built meshes are memoized per node and shared through the
//! content-addressed [`crate::cache::GeometryCache`], so identical
//! subgraphs across a document build at most once.

use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use carve_mesh::math::Transform;
use carve_mesh::{builders, csg, primitives, CancelFn, Color, GeometryError, Material, Mesh, Path};
use carve_parser::Span;
use glam::{DQuat, DVec3};
use tracing::debug;

use crate::cache::GeometryCache;

// =============================================================================
// CAMERA AND LIGHT
// =============================================================================

/// Camera parameters carried on a scene node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Camera {
    /// Eye position, if set.
    pub position: Option<DVec3>,
    /// View orientation, if set.
    pub orientation: Option<DQuat>,
    /// Vertical field of view in half-turns.
    pub fov: Option<f64>,
    /// Output width hint.
    pub width: Option<f64>,
    /// Output height hint.
    pub height: Option<f64>,
    /// Camera-specific background override.
    pub background: Option<Color>,
}

/// Light parameters carried on a scene node.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Light color.
    pub color: Color,
    /// Position for point lights; `None` makes a directional light.
    pub position: Option<DVec3>,
    /// Beam orientation, if set.
    pub orientation: Option<DQuat>,
    /// Spot spread angle in half-turns (0 = point/directional).
    pub spread: f64,
    /// Soft-edge fraction in [0, 1].
    pub penumbra: f64,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            position: None,
            orientation: None,
            spread: 0.0,
            penumbra: 0.0,
        }
    }
}

// =============================================================================
// GEOMETRY KIND
// =============================================================================

/// What a scene node is.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryKind {
    /// Plain grouping; children merge without boolean interaction.
    Group,
    /// Boolean union of children.
    Union,
    /// First child minus the rest.
    Difference,
    /// Boolean intersection of children.
    Intersection,
    /// Symmetric difference of children.
    Xor,
    /// First child's geometry, painted where the rest overlap.
    Stencil,
    /// Unit cube.
    Cube,
    /// Unit sphere.
    Sphere {
        /// Angular segments.
        detail: u32,
    },
    /// Unit cylinder.
    Cylinder {
        /// Angular segments.
        detail: u32,
    },
    /// Unit cone.
    Cone {
        /// Angular segments.
        detail: u32,
    },
    /// Regular-base pyramid.
    Pyramid {
        /// Base sides.
        sides: u32,
    },
    /// Regular prism.
    Prism {
        /// Cross-section sides.
        sides: u32,
    },
    /// Extrusion of section paths, straight or along a guide.
    Extrude {
        /// Section paths.
        shapes: Vec<Path>,
        /// Optional guide path.
        along: Option<Path>,
    },
    /// Revolution of profile paths around the Y axis.
    Lathe {
        /// Profile paths.
        shapes: Vec<Path>,
        /// Angular segments.
        segments: u32,
    },
    /// Ruled surface through section paths.
    Loft {
        /// Section paths, in order.
        shapes: Vec<Path>,
    },
    /// Flat fill of closed paths.
    Fill {
        /// Paths to fill.
        shapes: Vec<Path>,
    },
    /// Convex hull of collected points.
    Hull {
        /// Input points.
        points: Vec<DVec3>,
    },
    /// A concrete mesh (imported or precomputed).
    Mesh(Mesh),
    /// Camera marker (builds no geometry).
    Camera(Camera),
    /// Light marker (builds no geometry).
    Light(Light),
}

// =============================================================================
// GEOMETRY NODE
// =============================================================================

/// A node in the scene graph.
///
/// Nodes own their children exclusively; meshes inside nodes are shared
/// handles. The built mesh is memoized in a one-shot cell.
#[derive(Debug, Clone)]
pub struct Geometry {
    /// What this node is.
    pub kind: GeometryKind,
    /// Optional user-assigned name.
    pub name: Option<String>,
    /// Local transform applied to the built mesh.
    pub transform: Transform,
    /// Material applied to polygons that have none.
    pub material: Material,
    /// Smoothing threshold in half-turns, when set.
    pub smoothing: Option<f64>,
    /// Child nodes.
    pub children: Vec<Geometry>,
    /// Source location of the originating block.
    pub span: Span,
    /// Memoized build result.
    mesh: OnceLock<Mesh>,
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.transform == other.transform
            && self.material == other.material
            && self.smoothing == other.smoothing
            && self.children == other.children
    }
}

impl Geometry {
    /// Creates a node with default transform and material.
    pub fn new(kind: GeometryKind, span: Span) -> Self {
        Self {
            kind,
            name: None,
            transform: Transform::IDENTITY,
            material: Material::default(),
            smoothing: None,
            children: Vec::new(),
            span,
            mesh: OnceLock::new(),
        }
    }

    /// Short display name of this node's kind.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            GeometryKind::Group => "group",
            GeometryKind::Union => "union",
            GeometryKind::Difference => "difference",
            GeometryKind::Intersection => "intersection",
            GeometryKind::Xor => "xor",
            GeometryKind::Stencil => "stencil",
            GeometryKind::Cube => "cube",
            GeometryKind::Sphere { .. } => "sphere",
            GeometryKind::Cylinder { .. } => "cylinder",
            GeometryKind::Cone { .. } => "cone",
            GeometryKind::Pyramid { .. } => "pyramid",
            GeometryKind::Prism { .. } => "prism",
            GeometryKind::Extrude { .. } => "extrude",
            GeometryKind::Lathe { .. } => "lathe",
            GeometryKind::Loft { .. } => "loft",
            GeometryKind::Fill { .. } => "fill",
            GeometryKind::Hull { .. } => "hull",
            GeometryKind::Mesh(_) => "mesh",
            GeometryKind::Camera(_) => "camera",
            GeometryKind::Light(_) => "light",
        }
    }

    /// The built mesh, if this node has been built.
    pub fn built_mesh(&self) -> Option<&Mesh> {
        self.mesh.get()
    }

    /// Builds this node's mesh, memoizing locally and in the cache.
    ///
    /// Children build first. The returned mesh is already transformed by
    /// this node's transform and carries its material.
    pub fn build(&self, cache: &GeometryCache, is_cancelled: CancelFn) -> Result<Mesh, GeometryError> {
        if let Some(mesh) = self.mesh.get() {
            return Ok(mesh.clone());
        }
        if is_cancelled() {
            return Err(GeometryError::Cancelled);
        }
        let mesh = cache.get_or_build(self.cache_key(), || self.build_uncached(cache, is_cancelled))?;
        let _ = self.mesh.set(mesh.clone());
        Ok(mesh)
    }

    fn build_uncached(
        &self,
        cache: &GeometryCache,
        is_cancelled: CancelFn,
    ) -> Result<Mesh, GeometryError> {
        debug!(kind = self.kind_name(), "building geometry node");
        let material = (!self.material.is_default()).then_some(&self.material);
        let local = match &self.kind {
            GeometryKind::Group => {
                let mut merged = Mesh::empty();
                for child in &self.children {
                    merged = merged.merged(&child.build(cache, is_cancelled)?);
                }
                merged
            }
            GeometryKind::Union => self.fold_children(cache, is_cancelled, csg::union)?,
            GeometryKind::Difference => {
                self.fold_children(cache, is_cancelled, csg::difference)?
            }
            GeometryKind::Intersection => {
                self.fold_children(cache, is_cancelled, csg::intersection)?
            }
            GeometryKind::Xor => {
                self.fold_children(cache, is_cancelled, csg::symmetric_difference)?
            }
            GeometryKind::Stencil => self.fold_children(cache, is_cancelled, csg::stencil)?,
            GeometryKind::Cube => primitives::cube_with_material(material),
            GeometryKind::Sphere { detail } => {
                primitives::sphere_with_material(*detail, material)
            }
            GeometryKind::Cylinder { detail } => {
                primitives::cylinder_with_material(*detail, material)
            }
            GeometryKind::Cone { detail } => primitives::cone_with_material(*detail, material),
            GeometryKind::Pyramid { sides } => primitives::pyramid(*sides, material),
            GeometryKind::Prism { sides } => primitives::prism(*sides, material),
            GeometryKind::Extrude { shapes, along } => {
                let mut merged = Mesh::empty();
                for shape in shapes {
                    let mesh = match along {
                        Some(rail) => builders::extrude_along(shape, rail, material)?,
                        None => builders::extrude(shape, DVec3::Z, material)?,
                    };
                    merged = merged.merged(&mesh);
                }
                merged
            }
            GeometryKind::Lathe { shapes, segments } => {
                let mut merged = Mesh::empty();
                for shape in shapes {
                    merged = merged.merged(&builders::lathe(shape, *segments, material)?);
                }
                merged
            }
            GeometryKind::Loft { shapes } => builders::loft(shapes, material)?,
            GeometryKind::Fill { shapes } => {
                let mut merged = Mesh::empty();
                for shape in shapes {
                    merged = merged.merged(&builders::fill(shape, material)?);
                }
                merged
            }
            GeometryKind::Hull { points } => builders::hull(points, material)?,
            GeometryKind::Mesh(mesh) => match material {
                Some(material) => mesh.with_default_material(material),
                None => mesh.clone(),
            },
            GeometryKind::Camera(_) | GeometryKind::Light(_) => Mesh::empty(),
        };
        Ok(local.transformed(&self.transform))
    }

    /// Folds child meshes left to right with a boolean operator.
    fn fold_children(
        &self,
        cache: &GeometryCache,
        is_cancelled: CancelFn,
        op: fn(&Mesh, &Mesh, CancelFn) -> Result<Mesh, GeometryError>,
    ) -> Result<Mesh, GeometryError> {
        let mut children = self.children.iter();
        let mut result = match children.next() {
            Some(first) => first.build(cache, is_cancelled)?,
            None => return Ok(Mesh::empty()),
        };
        for child in children {
            if is_cancelled() {
                return Err(GeometryError::Cancelled);
            }
            let mesh = child.build(cache, is_cancelled)?;
            result = op(&result, &mesh, is_cancelled)?;
        }
        Ok(result)
    }

    /// Content-addressed key: a structural hash of everything that
    /// affects the built mesh (kind, parameters, transform, material,
    /// smoothing, child keys). The node name is cosmetic and excluded.
    pub fn cache_key(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.feed_hash(&mut hasher);
        hasher.finish()
    }

    fn feed_hash(&self, hasher: &mut impl Hasher) {
        std::mem::discriminant(&self.kind).hash(hasher);
        match &self.kind {
            GeometryKind::Sphere { detail }
            | GeometryKind::Cylinder { detail }
            | GeometryKind::Cone { detail } => detail.hash(hasher),
            GeometryKind::Pyramid { sides } | GeometryKind::Prism { sides } => {
                sides.hash(hasher)
            }
            GeometryKind::Extrude { shapes, along } => {
                for shape in shapes {
                    hash_path(shape, hasher);
                }
                if let Some(rail) = along {
                    hash_path(rail, hasher);
                }
            }
            GeometryKind::Lathe { shapes, segments } => {
                segments.hash(hasher);
                for shape in shapes {
                    hash_path(shape, hasher);
                }
            }
            GeometryKind::Loft { shapes } | GeometryKind::Fill { shapes } => {
                for shape in shapes {
                    hash_path(shape, hasher);
                }
            }
            GeometryKind::Hull { points } => {
                for p in points {
                    hash_vec(*p, hasher);
                }
            }
            GeometryKind::Mesh(mesh) => mesh.instance_id().hash(hasher),
            _ => {}
        }
        hash_transform(&self.transform, hasher);
        hash_material(&self.material, hasher);
        self.smoothing.map(f64::to_bits).hash(hasher);
        self.children.len().hash(hasher);
        for child in &self.children {
            child.cache_key().hash(hasher);
        }
    }
}

fn hash_vec(v: DVec3, hasher: &mut impl Hasher) {
    v.x.to_bits().hash(hasher);
    v.y.to_bits().hash(hasher);
    v.z.to_bits().hash(hasher);
}

fn hash_transform(t: &Transform, hasher: &mut impl Hasher) {
    hash_vec(t.offset, hasher);
    hash_vec(t.scale, hasher);
    t.rotation.x.to_bits().hash(hasher);
    t.rotation.y.to_bits().hash(hasher);
    t.rotation.z.to_bits().hash(hasher);
    t.rotation.w.to_bits().hash(hasher);
}

fn hash_material(m: &Material, hasher: &mut impl Hasher) {
    if let Some(c) = &m.color {
        c.r.to_bits().hash(hasher);
        c.g.to_bits().hash(hasher);
        c.b.to_bits().hash(hasher);
        c.a.to_bits().hash(hasher);
    }
    m.texture.hash(hasher);
    m.opacity.map(f64::to_bits).hash(hasher);
}

fn hash_path(path: &Path, hasher: &mut impl Hasher) {
    path.points().len().hash(hasher);
    for point in path.points() {
        hash_vec(point.position, hasher);
        point.is_curved.hash(hasher);
    }
}

// =============================================================================
// TESTS
// =============================================================================
