//! # CSG Operators
//!
//! Boolean set operations on solids, realized as clip/invert sequences
//! over BSP trees per operand. Clip order and coplanar routing are fixed:
//! the first operand's surface wins ties against the second's, so
//! identical coplanar fragments cancel deterministically.
//!
//! Results are passed through the conservative detessellator (fragments of
//! one split group merge back when the merged loop stays convex) and their
//! watertightness/convexity are left for lazy recomputation.

use tracing::debug;

use crate::bsp::CancelFn;
use crate::error::GeometryError;
use crate::mesh::Mesh;
use crate::polygon::{detessellate, Polygon};

/// Union of two solids.
///
/// `a | b`: surface pieces of either operand outside the other, with
/// `a`'s copy of any shared coplanar surface kept and `b`'s dropped.
pub fn union(a: &Mesh, b: &Mesh, is_cancelled: CancelFn) -> Result<Mesh, GeometryError> {
    if a.is_empty() {
        return Ok(b.clone());
    }
    if b.is_empty() {
        return Ok(a.clone());
    }
    let ta = a.to_bsp(is_cancelled)?;
    let tb = b.to_bsp(is_cancelled)?;
    let mut out = tb.clip(a.polygons().to_vec(), true, is_cancelled)?;
    out.extend(ta.clip(b.polygons().to_vec(), false, is_cancelled)?);
    finish("union", out)
}

/// Intersection of two solids.
///
/// Clips each operand's inverted surface against the other's inverted
/// tree (keeping what lies inside the other), then restores orientation.
pub fn intersection(a: &Mesh, b: &Mesh, is_cancelled: CancelFn) -> Result<Mesh, GeometryError> {
    if a.is_empty() || b.is_empty() {
        return Ok(Mesh::empty());
    }
    let ta_inv = a.to_bsp(is_cancelled)?.inverted();
    let tb_inv = b.to_bsp(is_cancelled)?.inverted();
    let pa = tb_inv.clip(inverted(a.polygons()), true, is_cancelled)?;
    let pb = ta_inv.clip(inverted(b.polygons()), false, is_cancelled)?;
    let mut out = inverted(&pa);
    out.extend(inverted(&pb));
    finish("intersection", out)
}

/// Difference `a - b`.
///
/// Keeps `a`'s surface outside `b` plus `b`'s surface inside `a`,
/// inverted to face the cavity. Not commutative.
pub fn difference(a: &Mesh, b: &Mesh, is_cancelled: CancelFn) -> Result<Mesh, GeometryError> {
    if a.is_empty() {
        return Ok(Mesh::empty());
    }
    if b.is_empty() {
        return Ok(a.clone());
    }
    let tb = b.to_bsp(is_cancelled)?;
    let ta_inv = a.to_bsp(is_cancelled)?.inverted();
    let pa = tb.clip(inverted(a.polygons()), true, is_cancelled)?;
    let pb = ta_inv.clip(inverted(b.polygons()), false, is_cancelled)?;
    let mut out = inverted(&pa);
    out.extend(pb);
    finish("difference", out)
}

/// Symmetric difference: `(a - b) | (b - a)`.
///
/// Both differences are evaluated against one shared set of trees, so the
/// coplanar tie-breaks agree and the shared-boundary fragments cancel
/// rather than double.
pub fn symmetric_difference(
    a: &Mesh,
    b: &Mesh,
    is_cancelled: CancelFn,
) -> Result<Mesh, GeometryError> {
    if a.is_empty() {
        return Ok(b.clone());
    }
    if b.is_empty() {
        return Ok(a.clone());
    }
    let ta = a.to_bsp(is_cancelled)?;
    let tb = b.to_bsp(is_cancelled)?;
    let ta_inv = ta.clone().inverted();
    let tb_inv = tb.clone().inverted();

    // a - b
    let mut out = inverted(&tb.clip(inverted(a.polygons()), true, is_cancelled)?);
    out.extend(ta_inv.clip(inverted(b.polygons()), false, is_cancelled)?);
    // b - a
    out.extend(inverted(&ta.clip(inverted(b.polygons()), true, is_cancelled)?));
    out.extend(tb_inv.clip(inverted(a.polygons()), false, is_cancelled)?);
    finish("xor", out)
}

/// Stencil: replaces `b`'s polygons that lie inside `a` with `a`'s
/// material; `a`'s geometry is kept unchanged outside `b`.
pub fn stencil(a: &Mesh, b: &Mesh, is_cancelled: CancelFn) -> Result<Mesh, GeometryError> {
    if a.is_empty() {
        return Ok(Mesh::empty());
    }
    if b.is_empty() {
        return Ok(a.clone());
    }
    let tb = b.to_bsp(is_cancelled)?;
    let ta_inv = a.to_bsp(is_cancelled)?.inverted();

    let outside = tb.clip(a.polygons().to_vec(), true, is_cancelled)?;
    let inside = inverted(&ta_inv.clip(inverted(b.polygons()), false, is_cancelled)?);

    let paint = a
        .polygons()
        .first()
        .and_then(|p| p.material().cloned());
    let mut out = outside;
    out.extend(
        inside
            .into_iter()
            .map(|p| p.with_material_replaced(paint.clone())),
    );
    finish("stencil", out)
}

/// Flips every polygon in a list.
fn inverted(polygons: &[Polygon]) -> Vec<Polygon> {
    polygons.iter().map(Polygon::flipped).collect()
}

/// Detessellates and wraps the result; derived flags recompute lazily.
fn finish(op: &'static str, polygons: Vec<Polygon>) -> Result<Mesh, GeometryError> {
    let before = polygons.len();
    let polygons = detessellate(polygons);
    debug!(op, before, after = polygons.len(), "csg operation complete");
    Ok(Mesh::from_polygons(polygons))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::NEVER_CANCELLED;
    use crate::math::Transform;
    use crate::primitives;
    use glam::DVec3;

    fn cube() -> Mesh {
        primitives::cube()
    }

    fn shifted_cube(offset: DVec3) -> Mesh {
        primitives::cube().transformed(&Transform::offset(offset))
    }

    #[test]
    fn test_union_with_empty_is_identity() {
        let a = cube();
        let out = union(&a, &Mesh::empty(), NEVER_CANCELLED).unwrap();
        assert_eq!(out, a);
        let out = union(&Mesh::empty(), &a, NEVER_CANCELLED).unwrap();
        assert_eq!(out, a);
    }

    #[test]
    fn test_union_self_is_identity() {
        let a = cube();
        let out = union(&a, &a.clone(), NEVER_CANCELLED).unwrap();
        assert_eq!(out.polygons().len(), a.polygons().len());
        assert!(out.is_watertight());
    }

    #[test]
    fn test_union_overlapping_cubes() {
        let a = cube();
        let b = shifted_cube(DVec3::new(0.5, 0.0, 0.0));
        let out = union(&a, &b, NEVER_CANCELLED).unwrap();
        assert!(out.make_watertight().is_watertight());
        assert!(out.contains_point(DVec3::ZERO));
        assert!(out.contains_point(DVec3::new(0.9, 0.0, 0.0)));
        assert!(!out.contains_point(DVec3::new(1.5, 0.0, 0.0)));
        let bounds = out.bounds();
        assert!((bounds.max.x - 1.0).abs() < 1e-9);
        assert!((bounds.min.x + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_union_touching_cubes_drops_interior_wall() {
        let a = cube();
        let b = shifted_cube(DVec3::new(1.0, 0.0, 0.0));
        let out = union(&a, &b, NEVER_CANCELLED).unwrap();
        // No polygon's centroid sits on the x=0.5 seam interior.
        assert!(out.contains_point(DVec3::new(0.5, 0.0, 0.0)));
        assert!(out.make_watertight().is_watertight());
    }

    #[test]
    fn test_intersection_self_is_identity() {
        let a = cube();
        let out = intersection(&a, &a.clone(), NEVER_CANCELLED).unwrap();
        assert_eq!(out.polygons().len(), a.polygons().len());
        assert_eq!(out.bounds(), a.bounds());
    }

    #[test]
    fn test_intersection_overlap() {
        let a = cube();
        let b = shifted_cube(DVec3::new(0.5, 0.0, 0.0));
        let out = intersection(&a, &b, NEVER_CANCELLED).unwrap();
        let bounds = out.bounds();
        assert!((bounds.min.x - 0.0).abs() < 1e-9);
        assert!((bounds.max.x - 0.5).abs() < 1e-9);
        assert!(out.make_watertight().is_watertight());
    }

    #[test]
    fn test_intersection_disjoint_is_empty() {
        let a = cube();
        let b = shifted_cube(DVec3::splat(5.0));
        let out = intersection(&a, &b, NEVER_CANCELLED).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_difference_self_is_empty() {
        let a = cube();
        let out = difference(&a, &a.clone(), NEVER_CANCELLED).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_difference_empty_is_identity() {
        let a = cube();
        let out = difference(&a, &Mesh::empty(), NEVER_CANCELLED).unwrap();
        assert_eq!(out, a);
    }

    #[test]
    fn test_difference_bite() {
        let a = cube();
        let b = shifted_cube(DVec3::new(0.5, 0.0, 0.0));
        let out = difference(&a, &b, NEVER_CANCELLED).unwrap();
        assert!(out.contains_point(DVec3::new(-0.25, 0.0, 0.0)));
        assert!(!out.contains_point(DVec3::new(0.25, 0.0, 0.0)));
        assert!(out.make_watertight().is_watertight());
    }

    #[test]
    fn test_difference_not_commutative() {
        let a = cube();
        let b = shifted_cube(DVec3::new(0.5, 0.0, 0.0));
        let ab = difference(&a, &b, NEVER_CANCELLED).unwrap();
        let ba = difference(&b, &a, NEVER_CANCELLED).unwrap();
        assert!(ab.contains_point(DVec3::new(-0.25, 0.0, 0.0)));
        assert!(!ba.contains_point(DVec3::new(-0.25, 0.0, 0.0)));
        assert!(ba.contains_point(DVec3::new(0.75, 0.0, 0.0)));
    }

    #[test]
    fn test_xor_self_is_empty() {
        let a = cube();
        let out = symmetric_difference(&a, &a.clone(), NEVER_CANCELLED).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_xor_disjoint_is_both() {
        let a = cube();
        let b = shifted_cube(DVec3::splat(5.0));
        let out = symmetric_difference(&a, &b, NEVER_CANCELLED).unwrap();
        assert!(out.contains_point(DVec3::ZERO));
        assert!(out.contains_point(DVec3::splat(5.0)));
        assert_eq!(out.submeshes().len(), 2);
    }

    #[test]
    fn test_xor_overlap_excludes_middle() {
        let a = cube();
        let b = shifted_cube(DVec3::new(0.5, 0.0, 0.0));
        let out = symmetric_difference(&a, &b, NEVER_CANCELLED).unwrap();
        assert!(out.contains_point(DVec3::new(-0.25, 0.0, 0.0)));
        assert!(out.contains_point(DVec3::new(0.75, 0.0, 0.0)));
        assert!(!out.contains_point(DVec3::new(0.25, 0.0, 0.0)));
    }

    #[test]
    fn test_stencil_repaints_b_inside_a() {
        use crate::material::{Color, Material};

        let red = Material::color(Color::RED);
        let blue = Material::color(Color::BLUE);
        // b spans [0.25, 0.75] on x, half of it inside a.
        let a = cube().with_default_material(&red);
        let b = cube()
            .transformed(&Transform::scale(DVec3::splat(0.5)))
            .transformed(&Transform::offset(DVec3::new(0.5, 0.0, 0.0)))
            .with_default_material(&blue);
        let out = stencil(&a, &b, NEVER_CANCELLED).unwrap();

        // a's surface outside b is unchanged.
        let left = out
            .polygons()
            .iter()
            .find(|p| (p.center().x + 0.5).abs() < 1e-9)
            .expect("a's -X face survives");
        assert_eq!(left.material(), Some(&red));

        // The replaced patch has b's shape: b's -X cap at x = 0.25 lies
        // inside a, survives, and takes a's material.
        let cap: Vec<_> = out
            .polygons()
            .iter()
            .filter(|p| (p.center().x - 0.25).abs() < 1e-9)
            .collect();
        assert!(!cap.is_empty(), "b's inside-a cap is part of the output");
        assert!(cap.iter().all(|p| p.material() == Some(&red)));

        // b's own material never survives the repaint.
        assert!(out.polygons().iter().all(|p| p.material() != Some(&blue)));

        // b's +X cap at x = 0.75 is outside a and contributes nothing.
        assert!(out
            .polygons()
            .iter()
            .all(|p| (p.center().x - 0.75).abs() > 1e-6));

        // The patch stays within a's extents.
        assert_eq!(out.bounds(), a.bounds());
    }

    #[test]
    fn test_cancellation_propagates() {
        let a = cube();
        let b = shifted_cube(DVec3::new(0.5, 0.0, 0.0));
        let result = union(&a, &b, &|| true);
        assert_eq!(result.unwrap_err(), GeometryError::Cancelled);
    }
}
