//! # Mesh
//!
//! Immutable polygon mesh behind a shared handle. Derived invariants
//! (bounds, watertightness, convexity, submeshes, materials) are computed
//! lazily, at most once, and shared by every clone of the handle.

use std::sync::{Arc, OnceLock};

use glam::DVec3;

use crate::bsp::{Bsp, CancelFn, NEVER_CANCELLED};
use crate::error::GeometryError;
use crate::material::Material;
use crate::math::{Bounds, Transform};
use crate::plane::PointClass;
use crate::polygon::Polygon;
use crate::watertight;

// =============================================================================
// STORAGE
// =============================================================================

#[derive(Debug)]
struct MeshStorage {
    polygons: Vec<Polygon>,
    /// Convexity established by the constructor, when the builder knows.
    known_convex: Option<bool>,
    bounds: OnceLock<Bounds>,
    watertight: OnceLock<bool>,
    convex: OnceLock<bool>,
    submeshes: OnceLock<Vec<Mesh>>,
    materials: OnceLock<Vec<Material>>,
}

impl MeshStorage {
    fn new(polygons: Vec<Polygon>, known_convex: Option<bool>) -> Self {
        Self {
            polygons,
            known_convex,
            bounds: OnceLock::new(),
            watertight: OnceLock::new(),
            convex: OnceLock::new(),
            submeshes: OnceLock::new(),
            materials: OnceLock::new(),
        }
    }
}

// =============================================================================
// MESH
// =============================================================================

/// An immutable mesh handle.
///
/// Cloning shares the underlying polygon storage; no polygon data is
/// copied. Equality takes a pointer-identity fast path before falling back
/// to polygon-list comparison.
///
/// The empty mesh is convex, watertight, and has no submeshes.
#[derive(Debug, Clone)]
pub struct Mesh {
    storage: Arc<MeshStorage>,
}

impl Mesh {
    /// The empty mesh.
    pub fn empty() -> Self {
        Self {
            storage: Arc::new(MeshStorage::new(Vec::new(), Some(true))),
        }
    }

    /// Mesh over polygons with unknown convexity.
    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        Self::with_convexity(polygons, None)
    }

    /// Mesh over polygons the builder has proven convex.
    pub fn convex(polygons: Vec<Polygon>) -> Self {
        Self::with_convexity(polygons, Some(true))
    }

    pub(crate) fn with_convexity(polygons: Vec<Polygon>, known_convex: Option<bool>) -> Self {
        let known_convex = if polygons.is_empty() {
            Some(true)
        } else {
            known_convex
        };
        Self {
            storage: Arc::new(MeshStorage::new(polygons, known_convex)),
        }
    }

    /// Mesh with convexity and watertightness established by the builder.
    pub(crate) fn with_flags(
        polygons: Vec<Polygon>,
        known_convex: Option<bool>,
        known_watertight: Option<bool>,
    ) -> Self {
        let mesh = Self::with_convexity(polygons, known_convex);
        if let Some(watertight) = known_watertight {
            let _ = mesh.storage.watertight.set(watertight);
        }
        mesh
    }

    /// Returns a mesh whose material-less polygons carry the given
    /// material. Polygons with their own material are left alone.
    #[must_use]
    pub fn with_default_material(&self, material: &Material) -> Mesh {
        if material.is_default() {
            return self.clone();
        }
        let polygons = self
            .storage
            .polygons
            .iter()
            .map(|p| {
                if p.material().is_some() {
                    p.clone()
                } else {
                    p.with_material_replaced(Some(material.clone()))
                }
            })
            .collect();
        let mesh = Self::with_convexity(polygons, self.storage.known_convex);
        if let Some(&known) = self.storage.watertight.get() {
            let _ = mesh.storage.watertight.set(known);
        }
        mesh
    }

    /// Polygon list.
    pub fn polygons(&self) -> &[Polygon] {
        &self.storage.polygons
    }

    /// Opaque identity of the shared storage block.
    ///
    /// Stable for the life of the mesh and every clone of the handle;
    /// caches use it as a cheap content stand-in.
    pub fn instance_id(&self) -> usize {
        Arc::as_ptr(&self.storage) as usize
    }

    /// Returns true when there are no polygons.
    pub fn is_empty(&self) -> bool {
        self.storage.polygons.is_empty()
    }

    /// Axis-aligned bounds of all vertices (lazy).
    pub fn bounds(&self) -> Bounds {
        *self.storage.bounds.get_or_init(|| {
            Bounds::from_points(
                self.storage
                    .polygons
                    .iter()
                    .flat_map(|p| p.vertices().iter().map(|v| v.position)),
            )
        })
    }

    /// Returns true when every undirected edge has even multiplicity
    /// (lazy).
    pub fn is_watertight(&self) -> bool {
        *self
            .storage
            .watertight
            .get_or_init(|| watertight::is_watertight(&self.storage.polygons))
    }

    /// Returns true when the mesh encloses a convex solid.
    ///
    /// Answers from construction knowledge when available, otherwise
    /// computes (and caches) by checking that no vertex lies in front of
    /// any polygon's plane.
    pub fn is_convex(&self) -> bool {
        if let Some(known) = self.storage.known_convex {
            return known;
        }
        *self.storage.convex.get_or_init(|| {
            self.storage.polygons.iter().all(|poly| {
                self.storage.polygons.iter().all(|other| {
                    other
                        .vertices()
                        .iter()
                        .all(|v| poly.plane().classify_point(v.position) != PointClass::Front)
                })
            })
        })
    }

    /// Maximal connected components under edge sharing (lazy).
    ///
    /// A connected mesh returns a single submesh sharing this storage;
    /// the empty mesh returns none.
    pub fn submeshes(&self) -> &[Mesh] {
        self.storage.submeshes.get_or_init(|| {
            if self.is_empty() {
                return Vec::new();
            }
            let components = watertight::connected_components(&self.storage.polygons);
            if components.len() <= 1 {
                return vec![self.clone()];
            }
            components
                .into_iter()
                .map(Mesh::from_polygons)
                .collect()
        })
    }

    /// Distinct materials in first-use order (lazy).
    pub fn materials(&self) -> &[Material] {
        self.storage.materials.get_or_init(|| {
            let mut out: Vec<Material> = Vec::new();
            for poly in &self.storage.polygons {
                let material = poly.material().cloned().unwrap_or_default();
                if !out.contains(&material) {
                    out.push(material);
                }
            }
            out
        })
    }

    /// Tests solid membership.
    ///
    /// Convex meshes test against every face plane directly; general
    /// meshes descend a BSP built on demand.
    pub fn contains_point(&self, point: DVec3) -> bool {
        if self.is_empty() || !self.bounds().contains_point(point) {
            return false;
        }
        if self.is_convex() {
            return self
                .storage
                .polygons
                .iter()
                .all(|p| p.plane().classify_point(point) != PointClass::Front);
        }
        match Bsp::new(self.storage.polygons.clone(), false, NEVER_CANCELLED) {
            Ok(tree) => tree.contains_point(point),
            Err(_) => false,
        }
    }

    /// The mesh turned inside-out: every polygon flipped.
    ///
    /// Watertightness is preserved; convexity of the enclosed region is
    /// not, so it is left for lazy recomputation.
    #[must_use]
    pub fn inverted(&self) -> Mesh {
        let polygons = self.storage.polygons.iter().map(Polygon::flipped).collect();
        let mesh = Self::with_convexity(polygons, None);
        if let Some(&known) = self.storage.watertight.get() {
            let _ = mesh.storage.watertight.set(known);
        }
        mesh
    }

    /// Applies a transform to every polygon.
    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Mesh {
        if transform.is_identity() {
            return self.clone();
        }
        let polygons = self
            .storage
            .polygons
            .iter()
            .map(|p| p.transformed(transform))
            .collect();
        // Affine transforms preserve convexity and edge multiplicity.
        let mesh = Self::with_convexity(polygons, self.storage.known_convex);
        if let Some(&known) = self.storage.watertight.get() {
            let _ = mesh.storage.watertight.set(known);
        }
        mesh
    }

    /// Concatenates two meshes without any boolean interaction.
    #[must_use]
    pub fn merged(&self, other: &Mesh) -> Mesh {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let mut polygons = self.storage.polygons.clone();
        polygons.extend(other.storage.polygons.iter().cloned());
        Self::from_polygons(polygons)
    }

    /// Best-effort watertight repair (T-junction insertion).
    ///
    /// Returns a repaired mesh; check [`Mesh::is_watertight`] on the
    /// result, repair cannot close every hole.
    #[must_use]
    pub fn make_watertight(&self) -> Mesh {
        if self.is_watertight() {
            return self.clone();
        }
        Self::with_convexity(
            watertight::make_watertight(&self.storage.polygons),
            self.storage.known_convex,
        )
    }

    /// Builds a BSP for this mesh, using the convex fast path when the
    /// constructor established convexity.
    pub fn to_bsp(&self, is_cancelled: CancelFn) -> Result<Bsp, GeometryError> {
        Bsp::new(
            self.storage.polygons.clone(),
            self.storage.known_convex == Some(true),
            is_cancelled,
        )
    }
}

impl PartialEq for Mesh {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
            || self.storage.polygons == other.storage.polygons
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
