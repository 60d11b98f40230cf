//! Content-addressed include trees.
//!
//! This crate turns the stream of file-enter/exit and `__has_include` probe
//! events from one preprocessing session into an [`IncludeTreeRoot`]: a
//! nested, content-addressed record of exactly which files were entered, at
//! which byte offsets, and which conditional-inclusion probes were taken.
//! The tree plus its [`FileManifest`] is sufficient to replay the
//! preprocessing of a translation unit without touching the filesystem.

#![warn(missing_docs)]

pub mod builder;
pub mod node;

pub use builder::IncludeTreeBuilder;
pub use node::{FileManifest, FileNode, IncludeNode, IncludeTreeRoot, ManifestEntry};
