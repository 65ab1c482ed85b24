//! # Scene
//!
//! The result of evaluating a document: a background, top-level geometry
//! nodes, and the shared mesh cache the build phase fills in.

use carve_mesh::CancelFn;

use crate::cache::GeometryCache;
use crate::context::Background;
use crate::error::RuntimeError;
use crate::geometry::{Geometry, GeometryKind};

/// An evaluated scene.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Scene background, if set.
    pub background: Option<Background>,
    /// Top-level geometry nodes (including camera and light markers).
    pub children: Vec<Geometry>,
    /// Mesh cache shared by every node build in this scene.
    pub cache: GeometryCache,
}

impl Scene {
    /// An empty scene.
    pub fn empty() -> Self {
        Self {
            background: None,
            children: Vec::new(),
            cache: GeometryCache::new(),
        }
    }

    /// Builds every node's mesh, children before parents.
    ///
    /// Geometry errors are wrapped with the span of the node that raised
    /// them; cancellation stays a sentinel.
    pub fn build_meshes(&self, is_cancelled: CancelFn) -> Result<(), RuntimeError> {
        for child in &self.children {
            child
                .build(&self.cache, is_cancelled)
                .map_err(|e| RuntimeError::from_geometry(e, child.span))?;
        }
        Ok(())
    }

    /// Camera nodes in document order.
    pub fn cameras(&self) -> impl Iterator<Item = &Geometry> {
        self.children
            .iter()
            .filter(|g| matches!(g.kind, GeometryKind::Camera(_)))
    }

    /// Light nodes in document order.
    pub fn lights(&self) -> impl Iterator<Item = &Geometry> {
        self.children
            .iter()
            .filter(|g| matches!(g.kind, GeometryKind::Light(_)))
    }

    /// Geometry nodes that produce visible meshes.
    pub fn shapes(&self) -> impl Iterator<Item = &Geometry> {
        self.children.iter().filter(|g| {
            !matches!(g.kind, GeometryKind::Camera(_) | GeometryKind::Light(_))
        })
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
