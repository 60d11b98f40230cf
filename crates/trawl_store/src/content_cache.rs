//! Path-to-object cache with symlink awareness.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::StoreError;
use crate::object_store::{ObjectRef, ObjectStore};

/// Maps filesystem paths to content-addressed references.
///
/// Reads each distinct file once, stores its bytes in the shared
/// [`ObjectStore`], and remembers the resulting [`ObjectRef`] keyed by both
/// the path as given and its canonical (symlink-resolved) form. Aliases of
/// the same file therefore resolve to the same reference without a second
/// read, and even an uncached alias converges to the same reference because
/// identical content always hashes identically.
pub struct FileContentCache {
    store: Arc<ObjectStore>,
    by_path: Mutex<HashMap<PathBuf, ObjectRef>>,
}

impl FileContentCache {
    /// Creates an empty cache writing into the given object store.
    pub fn new(store: Arc<ObjectStore>) -> Self {
        Self {
            store,
            by_path: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the object store this cache writes into.
    pub fn store(&self) -> &Arc<ObjectStore> {
        &self.store
    }

    /// Resolves a path to the content reference of its bytes.
    ///
    /// The file is read and stored on first use; later calls for the same
    /// path (or any symlink alias of it) hit the cache.
    pub fn content_ref_for(&self, path: &Path) -> Result<ObjectRef, StoreError> {
        if let Some(r) = self.by_path.lock().unwrap().get(path) {
            return Ok(*r);
        }

        // Resolve symlink chains so aliases share one cache entry. A path
        // that cannot be canonicalized (dangling link, missing file) is
        // reported against the path as given.
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if let Some(r) = self.by_path.lock().unwrap().get(&canonical).copied() {
            self.by_path.lock().unwrap().insert(path.to_path_buf(), r);
            return Ok(r);
        }

        let bytes = std::fs::read(&canonical).map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let r = self.store.store(&bytes);

        let mut by_path = self.by_path.lock().unwrap();
        by_path.insert(canonical, r);
        by_path.insert(path.to_path_buf(), r);
        Ok(r)
    }
}
