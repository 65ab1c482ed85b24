//! # Geometry Cache
//!
//! Content-addressed cache of built meshes, shared across a document.
//! Keys are structural hashes of geometry nodes. Reads are a lock-free
//! check of a one-shot cell; a miss takes a per-key lock so concurrent
//! builds of identical subgraphs compute at most once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use carve_mesh::{GeometryError, Mesh};
use tracing::trace;

/// One cache slot: a build lock plus the one-shot result cell.
#[derive(Debug, Default)]
struct Entry {
    lock: Mutex<()>,
    cell: OnceLock<Mesh>,
}

/// Content-addressed mesh cache.
///
/// Cloning shares the cache.
#[derive(Debug, Clone, Default)]
pub struct GeometryCache {
    entries: Arc<Mutex<HashMap<u64, Arc<Entry>>>>,
}

impl GeometryCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached mesh for a key, building it if needed.
    ///
    /// The global map lock is held only to find the entry; the build
    /// itself runs under the entry's own lock. Errors (including
    /// cancellation) are not cached, so a later build can retry.
    pub fn get_or_build(
        &self,
        key: u64,
        build: impl FnOnce() -> Result<Mesh, GeometryError>,
    ) -> Result<Mesh, GeometryError> {
        let entry = {
            let mut entries = self.entries.lock().expect("cache map poisoned");
            entries.entry(key).or_default().clone()
        };

        // Fast path: already built.
        if let Some(mesh) = entry.cell.get() {
            trace!(key, "geometry cache hit");
            return Ok(mesh.clone());
        }

        // Slow path: serialize builders of this key.
        let _guard = entry.lock.lock().expect("cache entry poisoned");
        if let Some(mesh) = entry.cell.get() {
            trace!(key, "geometry cache hit after wait");
            return Ok(mesh.clone());
        }
        trace!(key, "geometry cache miss");
        let mesh = build()?;
        let _ = entry.cell.set(mesh.clone());
        Ok(mesh)
    }

    /// Number of built entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("cache map poisoned")
            .values()
            .filter(|e| e.cell.get().is_some())
            .count()
    }

    /// True when nothing has been built yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use carve_mesh::primitives;

    #[test]
    fn test_build_once() {
        let cache = GeometryCache::new();
        let mut builds = 0;
        for _ in 0..3 {
            let mesh = cache.get_or_build(42, || {
                builds += 1;
                Ok(primitives::cube())
            });
            assert!(mesh.is_ok());
        }
        assert_eq!(builds, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_keys_build_separately() {
        let cache = GeometryCache::new();
        cache.get_or_build(1, || Ok(primitives::cube())).unwrap();
        cache
            .get_or_build(2, || Ok(primitives::sphere(8)))
            .unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = GeometryCache::new();
        let failed: Result<Mesh, _> =
            cache.get_or_build(7, || Err(GeometryError::Cancelled));
        assert!(failed.is_err());
        // A retry succeeds and caches.
        let mesh = cache.get_or_build(7, || Ok(primitives::cube()));
        assert!(mesh.is_ok());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_shared_between_clones() {
        let cache = GeometryCache::new();
        let copy = cache.clone();
        cache.get_or_build(5, || Ok(primitives::cube())).unwrap();
        assert_eq!(copy.len(), 1);
    }
}
