//! # Carve Eval
//!
//! The Carve evaluator: symbol tables, block-scoped standard library,
//! scene-graph construction, content-addressed mesh caching, and
//! background builds with progress reporting.
//!
//! ## Architecture
//!
//! ```text
//! carve-parser (AST) -> carve-eval (Scene of Geometry) -> carve-mesh (Mesh)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use carve_eval::{evaluate, NullDelegate};
//! use carve_mesh::NEVER_CANCELLED;
//!
//! let scene = evaluate("cube { size 2 }", Arc::new(NullDelegate)).unwrap();
//! scene.build_meshes(NEVER_CANCELLED).unwrap();
//! assert_eq!(scene.children.len(), 1);
//! ```

pub mod cache;
pub mod context;
pub mod delegate;
pub mod error;
pub mod evaluator;
pub mod geometry;
pub mod progress;
pub mod random;
pub mod scene;
pub mod stdlib;
pub mod symbols;
pub mod value;

// Re-export public API
pub use cache::GeometryCache;
pub use context::{Background, BlockClass, Context};
pub use delegate::{Delegate, FileError, InMemoryFiles, NullDelegate};
pub use error::{DocumentError, ImportedError, RuntimeError, RuntimeErrorKind};
pub use evaluator::Evaluator;
pub use geometry::{Camera, Geometry, GeometryKind, Light};
pub use progress::{BuildHandle, BuildStatus, DocumentBuilder};
pub use random::RandomSequence;
pub use scene::Scene;
pub use value::{Value, ValueType};

use std::sync::Arc;

// =============================================================================
// PUBLIC API
// =============================================================================

/// Parses and evaluates Carve source into a scene.
///
/// Meshes are not built yet; call [`Scene::build_meshes`] (or use a
/// [`DocumentBuilder`] for background builds with progress).
///
/// ## Parameters
///
/// - `source`: Carve source text
/// - `delegate`: host services (file access, logging, cancellation)
pub fn evaluate(source: &str, delegate: Arc<dyn Delegate>) -> Result<Scene, DocumentError> {
    let parsed = carve_parser::parse(source).map_err(DocumentError::Parse)?;
    if let Some(error) = parsed.errors.first() {
        return Err(DocumentError::Parse(error.clone()));
    }
    Evaluator::new(delegate)
        .evaluate(&parsed.program)
        .map_err(DocumentError::Runtime)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use carve_mesh::NEVER_CANCELLED;

    #[test]
    fn test_evaluate_smoke() {
        let scene = evaluate(
            "difference {\ncube { size 2 }\nsphere { size 1.2 }\n}",
            Arc::new(NullDelegate),
        )
        .unwrap();
        scene.build_meshes(NEVER_CANCELLED).unwrap();
        let mesh = scene.children[0].built_mesh().unwrap();
        assert!(!mesh.is_empty());
    }

    #[test]
    fn test_parse_errors_surface() {
        let error = evaluate("cube {", Arc::new(NullDelegate)).unwrap_err();
        assert!(matches!(error, DocumentError::Parse(_)));
        assert!(!error.hint().is_empty());
    }
}
