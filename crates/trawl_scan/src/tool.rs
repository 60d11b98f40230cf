//! The scanning facade.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use trawl_deps::{DependencyAggregator, FullScanResult, ModuleDeps, ModuleId, ModuleOutputKind,
    PrebuiltModuleDep};
use trawl_source::{SessionEnd, SourceFile, SourceId};
use trawl_store::{FileContentCache, ObjectRef, ObjectStore, TrackingFs};
use trawl_tree::{IncludeTreeBuilder, IncludeTreeRoot};

use crate::consumer::{DepFilePrinter, EventSink, NullSink, Preprocess};
use crate::error::ScanError;

/// Adapter routing include events into an [`IncludeTreeBuilder`].
struct IncludeTreeSink {
    builder: IncludeTreeBuilder,
}

impl EventSink for IncludeTreeSink {
    fn file_entered(&mut self, file: &SourceFile) {
        self.builder.file_entered(file);
    }

    fn file_exited(&mut self, parent: SourceId, child: SourceId, offset: u32) {
        self.builder.file_exited(parent, child, offset);
    }

    fn has_include_probe(&mut self, result: bool) {
        self.builder.has_include_probe(result);
    }

    fn finalize(&mut self, session: &SessionEnd) {
        self.builder.finalize(session);
    }
}

/// Adapter routing dependency events into a [`DependencyAggregator`].
struct FullDepsSink {
    aggregator: DependencyAggregator,
}

impl EventSink for FullDepsSink {
    fn handle_file_dependency(&mut self, path: &Path) {
        self.aggregator.add_file_dependency(path);
    }

    fn handle_module_dependency(&mut self, dep: ModuleDeps) {
        self.aggregator.add_module_dependency(dep);
    }

    fn handle_prebuilt_module(&mut self, dep: PrebuiltModuleDep) {
        self.aggregator.add_prebuilt_module(dep);
    }

    fn handle_context_hash(&mut self, hash: &str) {
        self.aggregator.set_context_hash(hash);
    }
}

/// Orchestrates dependency scans over a preprocessing front end.
///
/// Each method drives one complete preprocessing run and returns one of
/// the four supported output shapes. The tool itself holds no per-scan
/// state; independent translation units can be scanned by separate tools
/// sharing one [`ObjectStore`] and [`FileContentCache`].
pub struct ScanTool<P> {
    front_end: P,
    contents: Arc<FileContentCache>,
    tracking_fs: Option<Arc<TrackingFs>>,
}

impl<P: Preprocess> ScanTool<P> {
    /// Creates a tool over the given front end, storing content through
    /// `contents`.
    pub fn new(front_end: P, contents: Arc<FileContentCache>) -> Self {
        Self {
            front_end,
            contents,
            tracking_fs: None,
        }
    }

    /// Attaches a tracking filesystem, enabling the tracked-tree output
    /// and filesystem snapshots in full-dependency results.
    ///
    /// The tracking filesystem's access log is scoped per scan; do not
    /// share one instance between concurrently scanning tools.
    pub fn with_tracking_fs(mut self, fs: Arc<TrackingFs>) -> Self {
        self.tracking_fs = Some(fs);
        self
    }

    /// Returns the object store this tool writes into.
    pub fn store(&self) -> &Arc<ObjectStore> {
        self.contents.store()
    }

    /// Scans the translation unit and renders its dependencies in make
    /// format.
    ///
    /// Module and prebuilt-module events are ignored in this mode; the
    /// legacy flat format cannot represent them.
    pub fn dependency_file(
        &mut self,
        command_line: &[String],
        cwd: &Path,
    ) -> Result<String, ScanError> {
        let mut printer = DepFilePrinter::new();
        self.front_end.preprocess(cwd, command_line, &mut printer)?;
        Ok(printer.render())
    }

    /// Scans the translation unit and materializes a tree of every path
    /// newly accessed during the run.
    ///
    /// Coarser but more complete than the include tree: directory-level
    /// accesses (including the working directory) are captured here and
    /// nowhere else.
    pub fn fs_tree(
        &mut self,
        command_line: &[String],
        cwd: &Path,
        remap: Option<&dyn Fn(&Path) -> PathBuf>,
    ) -> Result<ObjectRef, ScanError> {
        let fs = self.tracking_fs.clone().ok_or(ScanError::NoTrackingFs)?;
        fs.track_new_accesses();
        fs.set_working_directory(cwd);
        let mut sink = NullSink;
        self.front_end.preprocess(cwd, command_line, &mut sink)?;
        Ok(fs.tree_from_new_accesses(remap)?)
    }

    /// Scans the translation unit and returns its content-addressed
    /// include tree together with the tree's store identity.
    pub fn include_tree(
        &mut self,
        command_line: &[String],
        cwd: &Path,
    ) -> Result<(IncludeTreeRoot, ObjectRef), ScanError> {
        let mut sink = IncludeTreeSink {
            builder: IncludeTreeBuilder::new(
                Arc::clone(self.contents.store()),
                Arc::clone(&self.contents),
            ),
        };
        self.front_end.preprocess(cwd, command_line, &mut sink)?;
        Ok(sink.builder.into_root()?)
    }

    /// Scans the translation unit and returns the full dependency record
    /// plus the modules not yet in `already_seen`.
    ///
    /// When a tracking filesystem is attached, the record also carries a
    /// snapshot of every path the run touched. `lookup_module_output`
    /// supplies the on-disk path for each directly-imported module's
    /// compiled output; it is only invoked with
    /// [`ModuleOutputKind::ModuleFile`].
    pub fn full_dependencies(
        &mut self,
        command_line: &[String],
        cwd: &Path,
        already_seen: &HashSet<ModuleId>,
        lookup_module_output: impl FnMut(&ModuleId, ModuleOutputKind) -> PathBuf,
    ) -> Result<FullScanResult, ScanError> {
        if let Some(fs) = &self.tracking_fs {
            fs.track_new_accesses();
            fs.set_working_directory(cwd);
        }

        let mut sink = FullDepsSink {
            aggregator: DependencyAggregator::new(),
        };
        self.front_end.preprocess(cwd, command_line, &mut sink)?;

        let fs_tree = match &self.tracking_fs {
            Some(fs) => Some(fs.tree_from_new_accesses(None)?),
            None => None,
        };

        Ok(sink
            .aggregator
            .finalize(command_line, already_seen, fs_tree, lookup_module_output)?)
    }
}
