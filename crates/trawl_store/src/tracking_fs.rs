//! Filesystem access tracking for coarse dependency capture.
//!
//! The include tree only records files entered through preprocessing events;
//! directory-level accesses (header search probes, the working directory) are
//! invisible to it. [`TrackingFs`] fills that gap: it logs every path touched
//! after a mark and materializes the log as a content-addressed tree.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::content_cache::FileContentCache;
use crate::error::StoreError;
use crate::object_store::{ObjectRef, ObjectStore};

/// Whether a tracked access touched a file or a directory.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum AccessKind {
    /// A regular file whose content was read.
    File,
    /// A directory probed or entered during header search.
    Directory,
}

/// One path in a materialized filesystem tree.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FsTreeEntry {
    /// The accessed path (after any caller-supplied remapping).
    pub path: PathBuf,
    /// File or directory.
    pub kind: AccessKind,
    /// Content reference for file entries; `None` for directories.
    pub content: Option<ObjectRef>,
}

/// A sorted snapshot of every path newly accessed since the last mark.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FsTree {
    /// Entries sorted by path for deterministic identity.
    pub entries: Vec<FsTreeEntry>,
}

impl FsTree {
    /// Loads a previously materialized tree from the store.
    pub fn load(store: &ObjectStore, r: ObjectRef) -> Result<Self, StoreError> {
        store.load_node(r)
    }
}

/// Per-call access state. `accesses` is `None` while not tracking.
#[derive(Default)]
struct TrackState {
    cwd: Option<PathBuf>,
    accesses: Option<BTreeMap<PathBuf, AccessKind>>,
}

/// Filesystem wrapper that records newly accessed paths between a mark and
/// a collection point.
///
/// The access log is scoped to one scanning call: `track_new_accesses` marks
/// the start, and `tree_from_new_accesses` drains the log. Instances must
/// not be shared between concurrent scans of different translation units.
pub struct TrackingFs {
    contents: Arc<FileContentCache>,
    state: Mutex<TrackState>,
}

impl TrackingFs {
    /// Creates a tracking filesystem reading through the given content cache.
    pub fn new(contents: Arc<FileContentCache>) -> Self {
        Self {
            contents,
            state: Mutex::new(TrackState::default()),
        }
    }

    /// Starts a fresh access log, discarding any previous one.
    pub fn track_new_accesses(&self) {
        self.state.lock().unwrap().accesses = Some(BTreeMap::new());
    }

    /// Sets the working directory for the current scan.
    ///
    /// The directory itself counts as an access: a compile depends on its
    /// working directory even though no include event ever mentions it.
    pub fn set_working_directory(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut state = self.state.lock().unwrap();
        if let Some(accesses) = state.accesses.as_mut() {
            accesses.insert(path.clone(), AccessKind::Directory);
        }
        state.cwd = Some(path);
    }

    /// Returns the working directory set for the current scan, if any.
    pub fn working_directory(&self) -> Option<PathBuf> {
        self.state.lock().unwrap().cwd.clone()
    }

    /// Reads a file's bytes, logging the access when tracking is active.
    ///
    /// Relative paths are resolved against the working directory.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        let path = self.absolute(path);
        let r = self.contents.content_ref_for(&path)?;
        let mut state = self.state.lock().unwrap();
        if let Some(accesses) = state.accesses.as_mut() {
            accesses.insert(path.clone(), AccessKind::File);
        }
        drop(state);
        self.contents
            .store()
            .get(r)
            .ok_or_else(|| StoreError::MissingObject {
                hash: r.hash().to_string(),
            })
    }

    /// Probes whether a path exists, logging the access when it does.
    pub fn exists(&self, path: &Path) -> bool {
        let path = self.absolute(path);
        match std::fs::metadata(&path) {
            Ok(meta) => {
                let kind = if meta.is_dir() {
                    AccessKind::Directory
                } else {
                    AccessKind::File
                };
                if let Some(accesses) = self.state.lock().unwrap().accesses.as_mut() {
                    accesses.insert(path, kind);
                }
                true
            }
            Err(_) => false,
        }
    }

    /// Materializes every path accessed since the last mark as a stored
    /// [`FsTree`], draining the log.
    ///
    /// File entries carry the content reference of their bytes; directory
    /// entries carry none. An optional remapper rewrites each path before
    /// the final sort, letting callers strip sandbox prefixes.
    pub fn tree_from_new_accesses(
        &self,
        remap: Option<&dyn Fn(&Path) -> PathBuf>,
    ) -> Result<ObjectRef, StoreError> {
        let accesses = self
            .state
            .lock()
            .unwrap()
            .accesses
            .take()
            .unwrap_or_default();

        // Remapping may reorder paths, so collect into a fresh sorted map.
        let mut remapped: BTreeMap<PathBuf, FsTreeEntry> = BTreeMap::new();
        for (path, kind) in accesses {
            let content = match kind {
                AccessKind::File => Some(self.contents.content_ref_for(&path)?),
                AccessKind::Directory => None,
            };
            let out_path = match remap {
                Some(f) => f(&path),
                None => path,
            };
            remapped.insert(
                out_path.clone(),
                FsTreeEntry {
                    path: out_path,
                    kind,
                    content,
                },
            );
        }

        let tree = FsTree {
            entries: remapped.into_values().collect(),
        };
        self.contents.store().store_node(&tree)
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.working_directory() {
            Some(cwd) => cwd.join(path),
            None => path.to_path_buf(),
        }
    }
}
