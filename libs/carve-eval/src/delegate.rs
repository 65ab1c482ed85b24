//! # Host Delegate
//!
//! The contract between the evaluator and its host: file resolution for
//! `import`, foreign-geometry loading, log output, and cooperative
//! cancellation. Hosts implement [`Delegate`]; tests and sandboxed
//! embeddings use [`InMemoryFiles`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use carve_mesh::Mesh;
use thiserror::Error;

// =============================================================================
// FILE ACCESS
// =============================================================================

/// Why a file could not be read.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FileError {
    /// No file at the path.
    #[error("file not found: {0}")]
    NotFound(String),
    /// The file exists but the sandbox forbids reading it.
    #[error("file access restricted: {0}")]
    AccessRestricted(String),
}

// =============================================================================
// DELEGATE
// =============================================================================

/// Services the host provides to an evaluation.
///
/// Every method has a safe default so minimal hosts implement only what
/// they need.
pub trait Delegate: Send + Sync {
    /// Reads an imported file as text.
    fn read_file(&self, path: &str) -> Result<String, FileError> {
        Err(FileError::NotFound(path.to_string()))
    }

    /// Loads geometry from a foreign model format, when the host can.
    ///
    /// The default host supports none, so imports of non-Carve,
    /// non-mesh-document files fail with a type mismatch.
    fn import_geometry(&self, _path: &str) -> Option<Mesh> {
        None
    }

    /// Receives `print` output.
    fn debug_log(&self, message: &str) {
        tracing::info!(target: "carve::print", "{message}");
    }

    /// Polled at statement and polygon boundaries; returning true aborts
    /// the evaluation with the cancellation sentinel.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A delegate with no files, no fonts, and no cancellation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDelegate;

impl Delegate for NullDelegate {}

// =============================================================================
// IN-MEMORY HOST
// =============================================================================

/// In-memory delegate for tests and sandboxed embeddings.
///
/// Captures `print` output and supports cooperative cancellation via a
/// shared flag.
#[derive(Debug, Default)]
pub struct InMemoryFiles {
    files: HashMap<String, String>,
    log: Mutex<Vec<String>>,
    cancelled: Arc<AtomicBool>,
}

impl InMemoryFiles {
    /// An empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }

    /// Messages printed so far.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().expect("log poisoned").clone()
    }

    /// A flag that cancels evaluations using this delegate when set.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }
}

impl Delegate for InMemoryFiles {
    fn read_file(&self, path: &str) -> Result<String, FileError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FileError::NotFound(path.to_string()))
    }

    fn debug_log(&self, message: &str) {
        self.log.lock().expect("log poisoned").push(message.to_string());
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

// =============================================================================
// TESTS
// =============================================================================
