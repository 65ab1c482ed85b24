//! # Math Primitives
//!
//! Value types shared by the geometry kernel: tolerant comparison and
//! hashing, bounds, canonical line segments, and transforms. Vectors are
//! `glam::DVec3` throughout.

mod bounds;
mod segment;
mod tolerance;
mod transform;

pub use bounds::Bounds;
pub use segment::LineSegment;
pub use tolerance::{approx_eq, approx_eq_vec, quantize, VectorKey};
pub use transform::{rotation_around_axis, rotation_from_half_turns, Transform};
