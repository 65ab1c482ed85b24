//! # Vertices
//!
//! Mesh vertex carrying position, normal, texture coordinate, and an
//! optional color. Attributes interpolate linearly when polygons are split.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::material::Color;
use crate::math::{approx_eq_vec, Transform};

/// A polygon vertex with shading attributes.
///
/// The normal is never zero on a finished polygon: constructors that
/// receive a zero normal leave it for the owning polygon to recompute from
/// its plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Position in scene space.
    pub position: DVec3,
    /// Shading normal (unit length on finished polygons).
    pub normal: DVec3,
    /// Texture coordinate; `z` is unused by flat materials.
    pub texcoord: DVec3,
    /// Optional per-vertex color.
    pub color: Option<Color>,
}

impl Vertex {
    /// Creates a vertex with no shading attributes.
    ///
    /// The zero normal is a recompute request serviced by polygon
    /// construction.
    pub fn new(position: DVec3) -> Self {
        Self {
            position,
            normal: DVec3::ZERO,
            texcoord: DVec3::ZERO,
            color: None,
        }
    }

    /// Creates a vertex with an explicit normal.
    pub fn with_normal(position: DVec3, normal: DVec3) -> Self {
        Self {
            position,
            normal: normal.normalize_or_zero(),
            texcoord: DVec3::ZERO,
            color: None,
        }
    }

    /// Returns a copy with the given texture coordinate.
    #[must_use]
    pub fn with_texcoord(mut self, texcoord: DVec3) -> Self {
        self.texcoord = texcoord;
        self
    }

    /// Returns a copy with the given color.
    #[must_use]
    pub fn with_color(mut self, color: Option<Color>) -> Self {
        self.color = color;
        self
    }

    /// Linear interpolation of position and all attributes.
    ///
    /// Used by plane splitting to synthesize edge-crossing vertices.
    pub fn lerp(&self, other: &Vertex, t: f64) -> Vertex {
        let color = match (self.color, other.color) {
            (Some(a), Some(b)) => Some(a.lerp(&b, t)),
            (a, b) => a.or(b),
        };
        Vertex {
            position: self.position.lerp(other.position, t),
            normal: self.normal.lerp(other.normal, t).normalize_or_zero(),
            texcoord: self.texcoord.lerp(other.texcoord, t),
            color,
        }
    }

    /// Returns the vertex with its normal negated (for polygon flips).
    #[must_use]
    pub fn inverted(&self) -> Vertex {
        Vertex {
            normal: -self.normal,
            ..*self
        }
    }

    /// Applies a transform to position and normal.
    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Vertex {
        Vertex {
            position: transform.apply(self.position),
            normal: transform.apply_normal(self.normal),
            ..*self
        }
    }

    /// Tolerant positional equality (attributes ignored).
    pub fn is_coincident(&self, other: &Vertex) -> bool {
        approx_eq_vec(self.position, other.position)
    }
}

// =============================================================================
// TESTS
// =============================================================================
