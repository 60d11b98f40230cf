//! Dependency aggregation for explicit-module builds.
//!
//! This crate reduces the raw output of one dependency scan (file paths,
//! discovered modules, a context hash) into a single [`DependencyRecord`]
//! with a dependency-free command line, filters out modules the caller has
//! already been told about, and renders make-format dependency files for
//! legacy build tools.

#![warn(missing_docs)]

pub mod aggregator;
pub mod command_line;
pub mod depfile;
pub mod module;

pub use aggregator::{DependencyAggregator, FullScanResult};
pub use depfile::DepFileOptions;
pub use module::{
    DependencyRecord, ModuleDeps, ModuleId, ModuleOutputKind, PrebuiltModuleDep,
};
