//! The consumer and front-end seams of the scanner.
//!
//! A preprocessing front end implements [`Preprocess`] and reports what it
//! sees through an [`EventSink`]. Consumers implement only the handlers
//! they care about; every handler defaults to a no-op, mirroring how the
//! flat make format deliberately ignores module events.

use std::path::Path;

use trawl_deps::{DepFileOptions, ModuleDeps, PrebuiltModuleDep};
use trawl_source::{SessionEnd, SourceFile, SourceId};

use crate::error::ScanError;

/// Receiver for the ordered event stream of one preprocessing session.
///
/// The front end calls these handlers synchronously, in strict
/// chronological order, finishing with exactly one [`finalize`](Self::finalize)
/// call carrying the end-of-session state.
pub trait EventSink {
    /// The dependency-output options resolved from the command line.
    fn handle_output_opts(&mut self, _opts: &DepFileOptions) {}

    /// A file path the translation unit depends on.
    fn handle_file_dependency(&mut self, _path: &Path) {}

    /// A module discovered from source.
    fn handle_module_dependency(&mut self, _dep: ModuleDeps) {}

    /// A module supplied as a prebuilt artifact.
    fn handle_prebuilt_module(&mut self, _dep: PrebuiltModuleDep) {}

    /// The context hash of the effective compilation configuration.
    fn handle_context_hash(&mut self, _hash: &str) {}

    /// A file was entered (the main file, an `#include`, or a synthetic
    /// buffer).
    fn file_entered(&mut self, _file: &SourceFile) {}

    /// The file `child` was exited back into `parent`; the include that
    /// opened `child` sits at `offset` bytes into `parent`.
    fn file_exited(&mut self, _parent: SourceId, _child: SourceId, _offset: u32) {}

    /// A `__has_include`-style probe was evaluated in the active file.
    fn has_include_probe(&mut self, _result: bool) {}

    /// Preprocessing completed; `session` carries the front-end state
    /// needed for final sweeps.
    fn finalize(&mut self, _session: &SessionEnd) {}
}

/// A preprocessing front end capable of scanning one translation unit.
///
/// Each call is a single, complete, one-shot run: the front end resolves
/// the command line, preprocesses the translation unit in `cwd`, reports
/// events to `sink` in order, and calls `sink.finalize` before returning.
pub trait Preprocess {
    /// Runs one preprocessing session against the given sink.
    fn preprocess(
        &mut self,
        cwd: &Path,
        command_line: &[String],
        sink: &mut dyn EventSink,
    ) -> Result<(), ScanError>;
}

/// Consumer for the flat make-format output.
///
/// Tracks only the output options and the flat file list. Module and
/// prebuilt-module events are intentionally ignored: the legacy format
/// cannot represent explicit module files, and the file list alone is
/// enough for implicitly built modules to work.
#[derive(Default)]
pub struct DepFilePrinter {
    opts: Option<DepFileOptions>,
    deps: Vec<String>,
}

impl DepFilePrinter {
    /// Creates an empty printer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders the gathered dependencies as a make-format dependency file.
    ///
    /// # Panics
    ///
    /// Panics if the front end never communicated dependency-output
    /// options; that indicates a desynchronized driver.
    pub fn render(&self) -> String {
        let opts = self
            .opts
            .as_ref()
            .expect("dependency output options were never communicated");
        trawl_deps::depfile::render(opts, &self.deps)
    }
}

impl EventSink for DepFilePrinter {
    fn handle_output_opts(&mut self, opts: &DepFileOptions) {
        self.opts = Some(opts.clone());
    }

    fn handle_file_dependency(&mut self, path: &Path) {
        self.deps.push(path.to_string_lossy().into_owned());
    }
}

/// A consumer that ignores every event.
///
/// Used when the interesting output comes from somewhere other than the
/// event stream, such as the tracked-filesystem tree.
#[derive(Default)]
pub struct NullSink;

impl EventSink for NullSink {}
