//! # Planes
//!
//! Plane representation and point/polygon classification for BSP
//! partitioning and polygon splitting.

use config::constants::EPSILON;
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::math::approx_eq;

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Classification of a point relative to a plane.
///
/// The discriminants are bit flags: OR-ing the classes of a polygon's
/// vertices yields the polygon class directly (`Front | Back == Spanning`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PointClass {
    /// On the plane (within tolerance).
    Coplanar = 0,
    /// Positive side.
    Front = 1,
    /// Negative side.
    Back = 2,
}

/// Classification of a polygon relative to a plane, the bitwise aggregate
/// of its vertex classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PolygonClass {
    /// All vertices on the plane.
    Coplanar = 0,
    /// All vertices in front (or on the plane).
    Front = 1,
    /// All vertices behind (or on the plane).
    Back = 2,
    /// Vertices on both sides.
    Spanning = 3,
}

impl PolygonClass {
    /// Aggregates one more vertex class into the running polygon class.
    #[inline]
    pub fn union(self, point: PointClass) -> PolygonClass {
        match (self as u8) | (point as u8) {
            0 => PolygonClass::Coplanar,
            1 => PolygonClass::Front,
            2 => PolygonClass::Back,
            _ => PolygonClass::Spanning,
        }
    }
}

// =============================================================================
// PLANE
// =============================================================================

/// A plane in normal/distance form: `p` is on the plane when
/// `normal . p == w` (within tolerance).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal pointing to the front side.
    pub normal: DVec3,
    /// Signed distance from the origin along the normal.
    pub w: f64,
}

impl Plane {
    /// Creates a plane, normalizing the given normal.
    pub fn new(normal: DVec3, w: f64) -> Self {
        let len = normal.length();
        Self {
            normal: normal / len,
            w: w / len,
        }
    }

    /// Plane through a point with the given normal.
    pub fn from_normal_and_point(normal: DVec3, point: DVec3) -> Self {
        let n = normal.normalize();
        Self {
            normal: n,
            w: n.dot(point),
        }
    }

    /// Plane through three points with counter-clockwise winding.
    ///
    /// Returns `None` when the points are collinear.
    pub fn from_points(a: DVec3, b: DVec3, c: DVec3) -> Option<Self> {
        let normal = (b - a).cross(c - a);
        if normal.length_squared() < EPSILON * EPSILON {
            return None;
        }
        Some(Self::from_normal_and_point(normal, a))
    }

    /// Best-fit plane for a closed vertex loop using Newell's method.
    ///
    /// More robust than three-point construction when the loop carries
    /// near-collinear runs. Returns `None` for degenerate loops.
    pub fn from_loop(points: &[DVec3]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let mut normal = DVec3::ZERO;
        let mut centroid = DVec3::ZERO;
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            normal += DVec3::new(
                (a.y - b.y) * (a.z + b.z),
                (a.z - b.z) * (a.x + b.x),
                (a.x - b.x) * (a.y + b.y),
            );
            centroid += *a;
        }
        if normal.length_squared() < EPSILON * EPSILON {
            return None;
        }
        centroid /= points.len() as f64;
        Some(Self::from_normal_and_point(normal, centroid))
    }

    /// Signed distance from a point; positive in front.
    #[inline]
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.w
    }

    /// Classifies a point with tolerance.
    #[inline]
    pub fn classify_point(&self, point: DVec3) -> PointClass {
        let d = self.signed_distance(point);
        if d > EPSILON {
            PointClass::Front
        } else if d < -EPSILON {
            PointClass::Back
        } else {
            PointClass::Coplanar
        }
    }

    /// Returns true when a point lies on the plane.
    pub fn contains_point(&self, point: DVec3) -> bool {
        self.signed_distance(point).abs() <= EPSILON
    }

    /// The same plane facing the other way.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            w: -self.w,
        }
    }

    /// Tolerant equality on normal and distance.
    pub fn approx_eq(&self, other: &Plane) -> bool {
        crate::math::approx_eq_vec(self.normal, other.normal) && approx_eq(self.w, other.w)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_points_ccw_normal() {
        let plane = Plane::from_points(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap();
        assert_relative_eq!(plane.normal.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.w, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_points_collinear() {
        assert!(Plane::from_points(DVec3::ZERO, DVec3::X, DVec3::X * 2.0).is_none());
    }

    #[test]
    fn test_newell_matches_three_point() {
        let points = [
            DVec3::new(0.0, 0.0, 2.0),
            DVec3::new(1.0, 0.0, 2.0),
            DVec3::new(1.0, 1.0, 2.0),
            DVec3::new(0.0, 1.0, 2.0),
        ];
        let plane = Plane::from_loop(&points).unwrap();
        assert_relative_eq!(plane.normal.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.w, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_classify_point() {
        let plane = Plane::new(DVec3::Z, 1.0);
        assert_eq!(plane.classify_point(DVec3::new(0.0, 0.0, 2.0)), PointClass::Front);
        assert_eq!(plane.classify_point(DVec3::ZERO), PointClass::Back);
        assert_eq!(plane.classify_point(DVec3::new(5.0, -3.0, 1.0)), PointClass::Coplanar);
    }

    #[test]
    fn test_class_aggregation() {
        let c = PolygonClass::Coplanar
            .union(PointClass::Front)
            .union(PointClass::Back);
        assert_eq!(c, PolygonClass::Spanning);

        let f = PolygonClass::Coplanar
            .union(PointClass::Front)
            .union(PointClass::Coplanar);
        assert_eq!(f, PolygonClass::Front);
    }

    #[test]
    fn test_flipped() {
        let plane = Plane::new(DVec3::Z, 1.5).flipped();
        assert_relative_eq!(plane.normal.z, -1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.w, -1.5, epsilon = 1e-12);
    }
}
