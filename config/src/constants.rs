//! # Configuration Constants
//!
//! Centralized constants for the Carve pipeline. Precision tolerances,
//! tessellation defaults, BSP tuning, and recursion limits are defined here.
//!
//! ## Categories
//!
//! - **Precision**: floating-point comparison and hashing tolerances
//! - **Resolution**: default tessellation parameters (`detail`)
//! - **BSP**: splitting-plane selection tuning
//! - **Limits**: recursion and import safety bounds

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Epsilon for floating-point comparisons.
///
/// Two coordinates are considered equal when they differ by less than this
/// per component. Hashing quantizes to the same value so that hash-equals
/// agrees with tolerant-equals.
///
/// # Example
///
/// ```rust
/// use config::constants::EPSILON;
///
/// fn approximately_equal(a: f64, b: f64) -> bool {
///     (a - b).abs() < EPSILON
/// }
///
/// assert!(approximately_equal(1.0, 1.0 + 1e-9));
/// ```
pub const EPSILON: f64 = 1e-8;

// =============================================================================
// RESOLUTION CONSTANTS
// =============================================================================

/// Default `detail` value: segments per full revolution for curved shapes.
///
/// Applies to circles, spheres, lathed solids, and curved path sampling when
/// a document does not set `detail` explicitly.
pub const DEFAULT_DETAIL: u32 = 16;

/// Minimum usable `detail` value.
///
/// Curved shapes need at least this many segments to enclose volume.
pub const MIN_DETAIL: u32 = 3;

// =============================================================================
// BSP TUNING
// =============================================================================

/// Cost multiplier applied to polygon splits when scoring candidate
/// splitting planes.
///
/// A candidate's score is `|front - back| + BSP_SPLIT_PENALTY * splits`;
/// the lowest score wins.
pub const BSP_SPLIT_PENALTY: f64 = 8.0;

/// Number of leading polygons sampled as splitting-plane candidates.
///
/// Bounding the sample keeps plane selection linear in practice for large
/// non-convex inputs.
pub const BSP_PLANE_SAMPLE: usize = 32;

// =============================================================================
// LIMITS
// =============================================================================

/// Remaining-stack threshold below which the evaluator grows the stack.
pub const STACK_RED_ZONE_BYTES: usize = 64 * 1024;

/// Bytes of stack space allocated when growing recursion headroom.
pub const STACK_GROW_BYTES: usize = 4 * 1024 * 1024;

/// Maximum depth of nested `import` statements before the evaluator reports
/// an import cycle.
pub const MAX_IMPORT_DEPTH: usize = 16;

// =============================================================================
// TESTS
// =============================================================================
