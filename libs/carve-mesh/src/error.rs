//! # Geometry Errors
//!
//! Error types for the geometry kernel.

use thiserror::Error;

/// Errors that can occur while constructing or combining geometry.
///
/// `Cancelled` is a cooperative-cancellation signal rather than a failure;
/// callers that forward errors upward should check [`GeometryError::is_cancellation`]
/// before reporting.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeometryError {
    /// Polygon vertices do not lie on a common plane.
    #[error("polygon vertices are not coplanar")]
    NonPlanarPolygon,

    /// Fewer than three distinct vertices, or all vertices collinear.
    #[error("degenerate polygon: {0}")]
    DegeneratePolygon(String),

    /// A path was unusable for the requested builder.
    #[error("degenerate path: {0}")]
    DegeneratePath(String),

    /// Convex hull input had fewer than 3 non-collinear points.
    #[error("hull requires at least 3 non-collinear points")]
    DegenerateHull,

    /// Persisted mesh document could not be decoded.
    #[error("invalid mesh document: {0}")]
    InvalidDocument(String),

    /// The operation was cancelled cooperatively.
    #[error("operation cancelled")]
    Cancelled,
}

impl GeometryError {
    /// Returns true when this value is the cancellation sentinel.
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// =============================================================================
// TESTS
// =============================================================================
