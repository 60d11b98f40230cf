//! Content-addressed storage collaborators for the Trawl scanner.
//!
//! This crate provides the [`ObjectStore`] (an idempotent, content-addressed
//! blob store), the [`FileContentCache`] mapping filesystem paths to object
//! references with symlink awareness, and the [`TrackingFs`] that records
//! which paths a scan newly accessed and materializes them as a
//! content-addressed tree.

#![warn(missing_docs)]

pub mod content_cache;
pub mod error;
pub mod object_store;
pub mod tracking_fs;

pub use content_cache::FileContentCache;
pub use error::StoreError;
pub use object_store::{ObjectRef, ObjectStore};
pub use tracking_fs::{AccessKind, FsTree, FsTreeEntry, TrackingFs};
