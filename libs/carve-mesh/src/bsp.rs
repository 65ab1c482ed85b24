//! # BSP Tree
//!
//! Binary space partition over polygon-supporting planes, used to clip
//! polygon sets against solids during CSG.
//!
//! ## Operations
//!
//! - `clip`: partition polygons against the tree, keeping the outside
//! - `invert`: flip the represented solid inside-out
//! - `contains_point`: solid membership test by signed-distance descent
//!
//! Construction and clipping poll a cancellation callback between
//! polygons and abort with the cancellation signal.

use config::constants::{BSP_PLANE_SAMPLE, BSP_SPLIT_PENALTY};
use tracing::trace;

use crate::error::GeometryError;
use crate::plane::{Plane, PointClass, PolygonClass};
use crate::polygon::Polygon;

/// Cooperative cancellation callback.
///
/// Returning `true` aborts the surrounding operation at its next
/// checkpoint.
pub type CancelFn<'a> = &'a dyn Fn() -> bool;

/// A cancellation callback that never fires.
pub const NEVER_CANCELLED: &dyn Fn() -> bool = &|| false;

// =============================================================================
// NODE
// =============================================================================

#[derive(Debug, Clone)]
struct BspNode {
    /// Dividing plane.
    plane: Plane,
    /// Polygons coplanar with the dividing plane.
    coplanar: Vec<Polygon>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
}

// =============================================================================
// TREE
// =============================================================================

/// A BSP tree over a polygon set.
///
/// The empty tree represents the empty solid: it clips nothing away and
/// contains no points.
#[derive(Debug, Clone)]
pub struct Bsp {
    root: Option<Box<BspNode>>,
}

impl Bsp {
    /// Builds a tree from polygons.
    ///
    /// When `convex` is true the input is a convex solid and the tree
    /// degenerates to a back-linked chain using each polygon's own plane,
    /// skipping plane selection entirely. Otherwise each node's plane is
    /// the best-scoring candidate from a bounded sample, minimizing
    /// `|front - back| + penalty * splits`.
    pub fn new(
        polygons: Vec<Polygon>,
        convex: bool,
        is_cancelled: CancelFn,
    ) -> Result<Self, GeometryError> {
        let root = if polygons.is_empty() {
            None
        } else {
            Some(Box::new(build_node(polygons, convex, is_cancelled)?))
        };
        Ok(Self { root })
    }

    /// Tree over no polygons.
    pub fn empty() -> Self {
        Self { root: None }
    }

    /// Clips a polygon set against this tree.
    ///
    /// Pieces that end up in front of every leaf plane survive; pieces
    /// inside the solid are discarded. Coplanar pieces facing the same way
    /// as the dividing plane follow the front path when
    /// `keep_coplanar_front` is set and the back path otherwise; pieces
    /// facing the opposite way always follow the back path. Callers choose
    /// the flag per operand so that identical coplanar fragments from two
    /// operands cancel deterministically.
    pub fn clip(
        &self,
        polygons: Vec<Polygon>,
        keep_coplanar_front: bool,
        is_cancelled: CancelFn,
    ) -> Result<Vec<Polygon>, GeometryError> {
        match &self.root {
            None => Ok(polygons),
            Some(node) => clip_node(node, polygons, keep_coplanar_front, is_cancelled),
        }
    }

    /// Flips the represented solid inside-out.
    ///
    /// Every plane and coplanar polygon is inverted and front/back
    /// subtrees swap, recursively.
    pub fn invert(&mut self) {
        if let Some(node) = &mut self.root {
            invert_node(node);
        }
    }

    /// Returns this tree inverted.
    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.invert();
        self
    }

    /// Tests whether a point is inside the solid.
    ///
    /// Descends by signed distance; a point that reaches a missing back
    /// child is inside, a missing front child outside. On-plane points
    /// follow the back path so surface points count as contained.
    pub fn contains_point(&self, point: glam::DVec3) -> bool {
        let mut node = match &self.root {
            None => return false,
            Some(n) => n,
        };
        loop {
            match node.plane.classify_point(point) {
                PointClass::Front => match &node.front {
                    Some(front) => node = front,
                    None => return false,
                },
                PointClass::Back | PointClass::Coplanar => match &node.back {
                    Some(back) => node = back,
                    None => return true,
                },
            }
        }
    }

    /// Collects every polygon stored in the tree.
    pub fn all_polygons(&self) -> Vec<Polygon> {
        let mut out = Vec::new();
        if let Some(node) = &self.root {
            collect_polygons(node, &mut out);
        }
        out
    }
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

fn build_node(
    mut polygons: Vec<Polygon>,
    convex: bool,
    is_cancelled: CancelFn,
) -> Result<BspNode, GeometryError> {
    if is_cancelled() {
        return Err(GeometryError::Cancelled);
    }

    let plane = if convex {
        *polygons[0].plane()
    } else {
        pick_plane(&polygons)
    };

    let mut coplanar_front = Vec::new();
    let mut coplanar_back = Vec::new();
    let mut front = Vec::new();
    let mut back = Vec::new();
    for poly in polygons.drain(..) {
        poly.split_into(&plane, &mut coplanar_front, &mut coplanar_back, &mut front, &mut back);
    }
    coplanar_front.extend(coplanar_back);

    let front = if front.is_empty() {
        None
    } else {
        Some(Box::new(build_node(front, convex, is_cancelled)?))
    };
    let back = if back.is_empty() {
        None
    } else {
        Some(Box::new(build_node(back, convex, is_cancelled)?))
    };

    Ok(BspNode {
        plane,
        coplanar: coplanar_front,
        front,
        back,
    })
}

/// Scores a bounded sample of candidate planes and returns the best.
///
/// Balanced partitions score low, each polygon split adds a fixed penalty.
fn pick_plane(polygons: &[Polygon]) -> Plane {
    debug_assert!(!polygons.is_empty());
    let mut best = *polygons[0].plane();
    let mut best_score = f64::INFINITY;
    for candidate in polygons.iter().take(BSP_PLANE_SAMPLE) {
        let plane = candidate.plane();
        let mut fronts = 0i64;
        let mut backs = 0i64;
        let mut splits = 0i64;
        for poly in polygons {
            match poly.classify(plane) {
                PolygonClass::Front => fronts += 1,
                PolygonClass::Back => backs += 1,
                PolygonClass::Spanning => splits += 1,
                PolygonClass::Coplanar => {}
            }
        }
        let score = (fronts - backs).abs() as f64 + BSP_SPLIT_PENALTY * splits as f64;
        if score < best_score {
            best_score = score;
            best = *plane;
        }
    }
    trace!(score = best_score, "selected BSP splitting plane");
    best
}

// =============================================================================
// CLIPPING
// =============================================================================

fn clip_node(
    node: &BspNode,
    polygons: Vec<Polygon>,
    keep_coplanar_front: bool,
    is_cancelled: CancelFn,
) -> Result<Vec<Polygon>, GeometryError> {
    let mut coplanar_front = Vec::new();
    let mut coplanar_back = Vec::new();
    let mut front = Vec::new();
    let mut back = Vec::new();
    for poly in polygons {
        if is_cancelled() {
            return Err(GeometryError::Cancelled);
        }
        poly.split_into(&node.plane, &mut coplanar_front, &mut coplanar_back, &mut front, &mut back);
    }

    // Same-facing coplanar pieces are routed by the caller's flag;
    // opposite-facing pieces always head inward.
    if keep_coplanar_front {
        front.extend(coplanar_front);
    } else {
        back.extend(coplanar_front);
    }
    back.extend(coplanar_back);

    let mut result = match &node.front {
        Some(child) => clip_node(child, front, keep_coplanar_front, is_cancelled)?,
        None => front, // reached open space: keep
    };
    if let Some(child) = &node.back {
        result.extend(clip_node(child, back, keep_coplanar_front, is_cancelled)?);
    }
    // No back child: pieces are inside the solid and are discarded.
    Ok(result)
}

fn invert_node(node: &mut BspNode) {
    node.plane = node.plane.flipped();
    for poly in &mut node.coplanar {
        *poly = poly.flipped();
    }
    std::mem::swap(&mut node.front, &mut node.back);
    if let Some(front) = &mut node.front {
        invert_node(front);
    }
    if let Some(back) = &mut node.back {
        invert_node(back);
    }
}

fn collect_polygons(node: &BspNode, out: &mut Vec<Polygon>) {
    out.extend(node.coplanar.iter().cloned());
    if let Some(front) = &node.front {
        collect_polygons(front, out);
    }
    if let Some(back) = &node.back {
        collect_polygons(back, out);
    }
}

// =============================================================================
// TESTS
// =============================================================================
