//! Reduction of raw scan output into a single dependency record.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use trawl_store::{ObjectRef, StoreError};

use crate::command_line::without_implicit_module_flags;
use crate::module::{
    DependencyRecord, ModuleDeps, ModuleId, ModuleOutputKind, PrebuiltModuleDep,
};

/// Result of finalizing a full-dependency scan: the record for this
/// translation unit plus the modules the caller has not been told about yet.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FullScanResult {
    /// The aggregated dependency record for the translation unit.
    pub record: DependencyRecord,
    /// Discovered modules whose identity was not in the caller's
    /// already-seen set, in encounter order.
    pub discovered_modules: Vec<ModuleDeps>,
}

/// Accumulates file, module, and prebuilt-module dependencies discovered
/// during one scan, then reduces them into a [`DependencyRecord`].
///
/// Uses the same record-first-failure policy as the include tree builder:
/// after [`fail`](Self::fail) is called, further additions are accepted but
/// ignored and [`finalize`](Self::finalize) surfaces the stored error.
#[derive(Default)]
pub struct DependencyAggregator {
    context_hash: String,
    files: Vec<PathBuf>,
    /// Modules in encounter order, with an index for identity-keyed dedup.
    modules: Vec<ModuleDeps>,
    module_index: HashMap<ModuleId, usize>,
    prebuilt: Vec<PrebuiltModuleDep>,
    error: Option<StoreError>,
}

impl DependencyAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the context hash of the scanned compilation.
    pub fn set_context_hash(&mut self, hash: impl Into<String>) {
        if self.error.is_some() {
            return;
        }
        self.context_hash = hash.into();
    }

    /// Appends a file path to the flat dependency list.
    ///
    /// No deduplication is performed; the front end is expected not to
    /// report duplicates, and downstream consumers treat the list as a set.
    pub fn add_file_dependency(&mut self, path: impl Into<PathBuf>) {
        if self.error.is_some() {
            return;
        }
        self.files.push(path.into());
    }

    /// Records a discovered module, keyed by identity.
    ///
    /// The first record for an identity wins; encounter order is preserved
    /// for reporting.
    pub fn add_module_dependency(&mut self, dep: ModuleDeps) {
        if self.error.is_some() {
            return;
        }
        if self.module_index.contains_key(&dep.id) {
            return;
        }
        self.module_index.insert(dep.id.clone(), self.modules.len());
        self.modules.push(dep);
    }

    /// Records a prebuilt module dependency.
    pub fn add_prebuilt_module(&mut self, dep: PrebuiltModuleDep) {
        if self.error.is_some() {
            return;
        }
        self.prebuilt.push(dep);
    }

    /// Poisons the aggregator with a failure to be surfaced at finalize.
    pub fn fail(&mut self, error: StoreError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Reduces the accumulated state into a [`FullScanResult`].
    ///
    /// The command line is rewritten to be dependency-free, then extended
    /// with a `-fmodule-file=` flag for every prebuilt module and for every
    /// directly-imported from-source module; the latter paths come from the
    /// caller's `lookup_module_output`, which is only ever invoked with
    /// [`ModuleOutputKind::ModuleFile`]. Modules whose identity appears in
    /// `already_seen` are excluded from the discovered-modules output but
    /// still listed in the record's direct imports.
    pub fn finalize(
        mut self,
        original_command_line: &[String],
        already_seen: &HashSet<ModuleId>,
        fs_tree: Option<ObjectRef>,
        mut lookup_module_output: impl FnMut(&ModuleId, ModuleOutputKind) -> PathBuf,
    ) -> Result<FullScanResult, StoreError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let mut command_line = without_implicit_module_flags(original_command_line);
        for pmd in &self.prebuilt {
            command_line.push(format!("-fmodule-file={}", pmd.module_file.display()));
        }

        let mut module_deps = Vec::new();
        for dep in &self.modules {
            if dep.imported_by_main_file {
                module_deps.push(dep.id.clone());
                let path = lookup_module_output(&dep.id, ModuleOutputKind::ModuleFile);
                command_line.push(format!("-fmodule-file={}", path.display()));
            }
        }

        let discovered_modules = self
            .modules
            .into_iter()
            .filter(|dep| !already_seen.contains(&dep.id))
            .collect();

        Ok(FullScanResult {
            record: DependencyRecord {
                context_hash: self.context_hash,
                command_line,
                file_deps: self.files,
                module_deps,
                prebuilt_module_deps: self.prebuilt,
                fs_tree,
            },
            discovered_modules,
        })
    }
}
