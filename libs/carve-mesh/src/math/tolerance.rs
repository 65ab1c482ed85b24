//! # Tolerant Comparison and Hashing
//!
//! Floating-point comparison helpers and the quantized vector key that keeps
//! hash-equals consistent with tolerant-equals.
//!
//! All geometric comparisons in the kernel go through this module so the
//! whole pipeline agrees on a single tolerance.

use config::constants::EPSILON;
use glam::DVec3;

/// Tolerant scalar equality.
///
/// # Example
///
/// ```rust
/// use carve_mesh::math::approx_eq;
///
/// assert!(approx_eq(1.0, 1.0 + 1e-9));
/// assert!(!approx_eq(1.0, 1.1));
/// ```
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// Tolerant per-component vector equality.
#[inline]
pub fn approx_eq_vec(a: DVec3, b: DVec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

/// Quantizes a scalar to the comparison tolerance.
///
/// Values that compare tolerant-equal quantize to the same integer in all
/// but boundary-straddling cases, which is what hashing requires.
#[inline]
pub fn quantize(value: f64) -> i64 {
    (value / EPSILON).round() as i64
}

/// A hashable key derived from a vector by per-axis quantization.
///
/// Used wherever vectors index a hash map (edge multiplicity counting,
/// vertex merging, seam detection). Two vectors that are tolerant-equal
/// produce equal keys.
///
/// # Example
///
/// ```rust
/// use glam::DVec3;
/// use carve_mesh::math::VectorKey;
///
/// let a = VectorKey::new(DVec3::new(1.0, 2.0, 3.0));
/// let b = VectorKey::new(DVec3::new(1.0 + 1e-10, 2.0, 3.0));
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VectorKey {
    x: i64,
    y: i64,
    z: i64,
}

impl VectorKey {
    /// Creates a key by quantizing each axis.
    pub fn new(v: DVec3) -> Self {
        Self {
            x: quantize(v.x),
            y: quantize(v.y),
            z: quantize(v.z),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(0.0, 0.0));
        assert!(approx_eq(1.0, 1.0 + EPSILON * 0.5));
        assert!(!approx_eq(1.0, 1.0 + EPSILON * 10.0));
    }

    #[test]
    fn test_vector_key_agrees_with_approx_eq() {
        let a = DVec3::new(0.1 + 0.2, 1.0, -3.5);
        let b = DVec3::new(0.3, 1.0, -3.5);
        assert!(approx_eq_vec(a, b));
        assert_eq!(VectorKey::new(a), VectorKey::new(b));
    }

    #[test]
    fn test_vector_key_distinguishes() {
        let a = VectorKey::new(DVec3::ZERO);
        let b = VectorKey::new(DVec3::X);
        assert_ne!(a, b);
    }
}
