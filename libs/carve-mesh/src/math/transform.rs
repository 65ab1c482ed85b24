//! # Transforms
//!
//! Offset/rotation/scale transforms applied to points, normals, polygons,
//! and composed along the scene graph.

use glam::{DMat4, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

use super::tolerance::approx_eq_vec;

// =============================================================================
// ROTATION
// =============================================================================

/// Rotation helpers over `glam::DQuat`.
///
/// Script-space rotations are expressed in half-turns (1.0 = 180 degrees)
/// as roll/yaw/pitch, matching the `rotate` command.
pub fn rotation_from_half_turns(roll: f64, yaw: f64, pitch: f64) -> DQuat {
    use std::f64::consts::PI;
    DQuat::from_euler(EulerRot::YXZ, yaw * PI, pitch * PI, roll * PI)
}

/// Axis-angle rotation, angle in radians.
pub fn rotation_around_axis(axis: DVec3, angle: f64) -> DQuat {
    DQuat::from_axis_angle(axis.normalize(), angle)
}

// =============================================================================
// TRANSFORM
// =============================================================================

/// A scene transform: scale, then rotation, then offset.
///
/// # Example
///
/// ```rust
/// use glam::DVec3;
/// use carve_mesh::math::Transform;
///
/// let t = Transform::offset(DVec3::X).scaled(DVec3::splat(2.0));
/// assert_eq!(t.apply(DVec3::ONE), DVec3::new(3.0, 2.0, 2.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation applied last.
    pub offset: DVec3,
    /// Rotation applied after scaling.
    pub rotation: DQuat,
    /// Per-axis scale applied first.
    pub scale: DVec3,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Transform = Transform {
        offset: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
        scale: DVec3::ONE,
    };

    /// Pure translation.
    pub fn offset(offset: DVec3) -> Self {
        Self {
            offset,
            ..Self::IDENTITY
        }
    }

    /// Pure rotation.
    pub fn rotation(rotation: DQuat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Pure scale.
    pub fn scale(scale: DVec3) -> Self {
        Self {
            scale,
            ..Self::IDENTITY
        }
    }

    /// Returns a copy with the scale multiplied per-axis.
    #[must_use]
    pub fn scaled(mut self, by: DVec3) -> Self {
        self.scale *= by;
        self
    }

    /// Returns a copy with the rotation composed on the right.
    #[must_use]
    pub fn rotated(mut self, by: DQuat) -> Self {
        self.rotation *= by;
        self
    }

    /// Returns a copy translated in local space.
    #[must_use]
    pub fn translated(mut self, by: DVec3) -> Self {
        self.offset += self.rotation * (by * self.scale);
        self
    }

    /// Returns true when this is (exactly) the identity.
    pub fn is_identity(&self) -> bool {
        approx_eq_vec(self.offset, DVec3::ZERO)
            && approx_eq_vec(self.scale, DVec3::ONE)
            && self.rotation.abs_diff_eq(DQuat::IDENTITY, config::constants::EPSILON)
    }

    /// True when the scale flips handedness (odd number of negative axes).
    ///
    /// Polygon windings must be reversed when applying such a transform.
    pub fn is_flipped(&self) -> bool {
        (self.scale.x * self.scale.y * self.scale.z) < 0.0
    }

    /// Applies the transform to a point.
    pub fn apply(&self, point: DVec3) -> DVec3 {
        self.rotation * (point * self.scale) + self.offset
    }

    /// Applies the transform to a direction, renormalizing.
    ///
    /// Non-uniform scale uses the inverse-scale rule for normals.
    pub fn apply_normal(&self, normal: DVec3) -> DVec3 {
        let scaled = normal / self.scale;
        (self.rotation * scaled).normalize_or_zero()
    }

    /// Composes `self * child`: the child transform happens first.
    #[must_use]
    pub fn combined(&self, child: &Transform) -> Self {
        Self {
            offset: self.apply(child.offset),
            rotation: self.rotation * child.rotation,
            scale: self.scale * child.scale,
        }
    }

    /// Converts to a column-major 4x4 matrix.
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(self.scale, self.rotation, self.offset)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_identity() {
        let t = Transform::IDENTITY;
        assert!(t.is_identity());
        assert_eq!(t.apply(DVec3::ONE), DVec3::ONE);
    }

    #[test]
    fn test_apply_order_scale_rotate_offset() {
        // Scale by 2, rotate quarter turn around Z, then move +X.
        let t = Transform {
            offset: DVec3::X,
            rotation: rotation_around_axis(DVec3::Z, PI / 2.0),
            scale: DVec3::splat(2.0),
        };
        let p = t.apply(DVec3::X);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_combined_matches_sequential_apply() {
        let parent = Transform::offset(DVec3::Y).scaled(DVec3::splat(3.0));
        let child = Transform::rotation(rotation_around_axis(DVec3::X, PI / 4.0));
        let combined = parent.combined(&child);
        let p = DVec3::new(0.3, -1.2, 2.0);
        let expected = parent.apply(child.apply(p));
        assert_relative_eq!(combined.apply(p).x, expected.x, epsilon = 1e-9);
        assert_relative_eq!(combined.apply(p).y, expected.y, epsilon = 1e-9);
        assert_relative_eq!(combined.apply(p).z, expected.z, epsilon = 1e-9);
    }

    #[test]
    fn test_flipped_detection() {
        assert!(Transform::scale(DVec3::new(-1.0, 1.0, 1.0)).is_flipped());
        assert!(!Transform::scale(DVec3::new(-1.0, -1.0, 1.0)).is_flipped());
    }

    #[test]
    fn test_rotation_half_turns() {
        let q = rotation_from_half_turns(0.0, 1.0, 0.0); // 180 degrees yaw
        let p = q * DVec3::X;
        assert_relative_eq!(p.x, -1.0, epsilon = 1e-12);
    }
}
