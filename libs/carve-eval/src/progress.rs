//! # Background Builds
//!
//! One build job at a time per document, on a worker thread. The
//! foreground observes progress through a [`BuildHandle`]; submitting a
//! new build supersedes (cancels) the in-flight one.
//!
//! Status updates form a monotonic sequence:
//!
//! ```text
//! waiting -> (partial)* -> success | failure | cancelled
//! ```
//!
//! `Partial` carries the evaluated scene before its meshes are built, so
//! hosts can show structure while geometry is still computing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

use tracing::debug;

use crate::cache::GeometryCache;
use crate::delegate::{Delegate, FileError};
use crate::error::DocumentError;
use crate::evaluator::Evaluator;
use crate::scene::Scene;

// =============================================================================
// STATUS
// =============================================================================

/// Progress of a background build.
#[derive(Debug, Clone)]
pub enum BuildStatus {
    /// Queued, not yet started.
    Waiting,
    /// Evaluated; meshes still building. The scene's nodes may not have
    /// built meshes yet.
    Partial(Scene),
    /// Finished; every mesh is built.
    Success(Scene),
    /// Evaluation or building failed.
    Failure(DocumentError),
    /// Superseded or cancelled cooperatively.
    Cancelled,
}

impl BuildStatus {
    /// True for the three terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success(_) | Self::Failure(_) | Self::Cancelled
        )
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Foreground view of one background build.
pub struct BuildHandle {
    receiver: mpsc::Receiver<BuildStatus>,
    flag: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl BuildHandle {
    /// Requests cooperative cancellation.
    ///
    /// Idempotent; the build stops at its next checkpoint.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Non-blocking poll for the next status update.
    pub fn poll(&self) -> Option<BuildStatus> {
        self.receiver.try_recv().ok()
    }

    /// Waits for the build to finish and returns the full status
    /// sequence, terminal state last.
    pub fn finish(mut self) -> Vec<BuildStatus> {
        let mut statuses = Vec::new();
        while let Ok(status) = self.receiver.recv() {
            statuses.push(status);
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        statuses
    }
}

// =============================================================================
// DOCUMENT BUILDER
// =============================================================================

/// Per-document build scheduler.
///
/// Holds the document's shared mesh cache so successive builds reuse
/// unchanged subgraphs, and guarantees at most one in-flight build: a new
/// submission cancels the previous one.
pub struct DocumentBuilder {
    delegate: Arc<dyn Delegate>,
    cache: GeometryCache,
    active: Option<Arc<AtomicBool>>,
}

/// Delegate wrapper that also observes the supersede flag.
struct SupersedableDelegate {
    inner: Arc<dyn Delegate>,
    flag: Arc<AtomicBool>,
}

impl Delegate for SupersedableDelegate {
    fn read_file(&self, path: &str) -> Result<String, FileError> {
        self.inner.read_file(path)
    }

    fn import_geometry(&self, path: &str) -> Option<carve_mesh::Mesh> {
        self.inner.import_geometry(path)
    }

    fn debug_log(&self, message: &str) {
        self.inner.debug_log(message);
    }

    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.inner.is_cancelled()
    }
}

impl DocumentBuilder {
    /// A builder for one document.
    pub fn new(delegate: Arc<dyn Delegate>) -> Self {
        Self {
            delegate,
            cache: GeometryCache::new(),
            active: None,
        }
    }

    /// Submits a build of the given source, superseding any in-flight
    /// build.
    pub fn submit(&mut self, source: String) -> BuildHandle {
        if let Some(previous) = self.active.take() {
            debug!("superseding in-flight build");
            previous.store(true, Ordering::Relaxed);
        }
        let flag = Arc::new(AtomicBool::new(false));
        self.active = Some(flag.clone());

        let (sender, receiver) = mpsc::channel();
        let delegate = Arc::new(SupersedableDelegate {
            inner: self.delegate.clone(),
            flag: flag.clone(),
        });
        let cache = self.cache.clone();

        let worker = std::thread::spawn(move || {
            run_build(&source, delegate, cache, &sender);
        });

        BuildHandle {
            receiver,
            flag,
            worker: Some(worker),
        }
    }
}

fn run_build(
    source: &str,
    delegate: Arc<SupersedableDelegate>,
    cache: GeometryCache,
    sender: &mpsc::Sender<BuildStatus>,
) {
    let _ = sender.send(BuildStatus::Waiting);

    // Parse.
    let parsed = match carve_parser::parse(source) {
        Ok(parsed) => parsed,
        Err(error) => {
            let _ = sender.send(BuildStatus::Failure(DocumentError::Parse(error)));
            return;
        }
    };
    if let Some(error) = parsed.errors.first() {
        let _ = sender.send(BuildStatus::Failure(DocumentError::Parse(error.clone())));
        return;
    }

    // Evaluate.
    let evaluator = Evaluator::new(delegate.clone() as Arc<dyn Delegate>).with_cache(cache);
    let scene = match evaluator.evaluate(&parsed.program) {
        Ok(scene) => scene,
        Err(error) if error.is_cancellation() => {
            let _ = sender.send(BuildStatus::Cancelled);
            return;
        }
        Err(error) => {
            let _ = sender.send(BuildStatus::Failure(DocumentError::Runtime(error)));
            return;
        }
    };
    let _ = sender.send(BuildStatus::Partial(scene.clone()));

    // Build meshes.
    let cancel = || delegate.is_cancelled();
    match scene.build_meshes(&cancel) {
        Ok(()) => {
            let _ = sender.send(BuildStatus::Success(scene));
        }
        Err(error) if error.is_cancellation() => {
            let _ = sender.send(BuildStatus::Cancelled);
        }
        Err(error) => {
            let _ = sender.send(BuildStatus::Failure(DocumentError::Runtime(error)));
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
