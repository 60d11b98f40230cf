//! End-of-session state handed to consumers at finalization.

use crate::source_file::SourceFile;
use std::path::PathBuf;

/// Front-end state available once preprocessing has completed.
///
/// Carries the full set of files the front end read during the session,
/// including files pulled in through a precompiled header that were never
/// entered through ordinary include events, plus the configured precompiled
/// header path if any. Consumers use this for their final manifest sweep.
#[derive(Clone, Debug, Default)]
pub struct SessionEnd {
    /// Every file the front end read content for during the session.
    ///
    /// Enumeration order is not guaranteed to be stable between runs;
    /// consumers must impose their own deterministic ordering.
    pub included_files: Vec<SourceFile>,
    /// Path of the precompiled header configured for the translation unit,
    /// if one was used.
    pub pch_path: Option<PathBuf>,
}

impl SessionEnd {
    /// Creates an empty end-of-session state (no extra files, no PCH).
    pub fn new() -> Self {
        Self::default()
    }
}
