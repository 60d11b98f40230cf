//! Description of a file opened by the preprocessing front end.

use crate::source_id::SourceId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Header classification assigned by the front end when a file is entered.
///
/// Recorded in the include tree so a replay can reproduce warnings and
/// language rules that depend on whether a header is a user header, a system
/// header, or an implementation-external header.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum FileCharacteristic {
    /// An ordinary user file or header.
    User,
    /// A system header (entered through a system search path).
    System,
    /// A header external to the implementation (e.g. `#pragma GCC system_header`-style).
    ExternalHeader,
}

/// Where a source file's bytes come from.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SourceOrigin {
    /// A real file on disk.
    OnDisk {
        /// Absolute logical path, as resolved by header search.
        path: PathBuf,
        /// The real path after resolving symlinks, when it differs from
        /// the logical path.
        real_path: Option<PathBuf>,
        /// Size in bytes as reported by the front end.
        size: u64,
    },
    /// A synthetic in-memory buffer with no on-disk path, such as the
    /// predefines preamble.
    Buffer {
        /// Display name for the buffer (e.g. `<built-in>`).
        name: String,
        /// The buffer contents.
        bytes: Vec<u8>,
    },
}

/// A file the front end has opened, as carried on enter events and in the
/// end-of-session file list.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SourceFile {
    /// Per-session identity assigned by the front end.
    pub id: SourceId,
    /// Header classification at the point the file was entered.
    pub characteristic: FileCharacteristic,
    /// Where the file's bytes come from.
    pub origin: SourceOrigin,
}

impl SourceFile {
    /// Creates an on-disk source file description.
    pub fn on_disk(
        id: SourceId,
        characteristic: FileCharacteristic,
        path: impl Into<PathBuf>,
        size: u64,
    ) -> Self {
        Self {
            id,
            characteristic,
            origin: SourceOrigin::OnDisk {
                path: path.into(),
                real_path: None,
                size,
            },
        }
    }

    /// Creates a synthetic buffer description (e.g. the predefines preamble).
    pub fn buffer(id: SourceId, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id,
            characteristic: FileCharacteristic::User,
            origin: SourceOrigin::Buffer {
                name: name.into(),
                bytes,
            },
        }
    }

    /// Attaches a real path that differs from the logical path.
    ///
    /// # Panics
    ///
    /// Panics if this file is a synthetic buffer.
    pub fn with_real_path(mut self, real: impl Into<PathBuf>) -> Self {
        match &mut self.origin {
            SourceOrigin::OnDisk { real_path, .. } => *real_path = Some(real.into()),
            SourceOrigin::Buffer { .. } => panic!("synthetic buffers have no real path"),
        }
        self
    }

    /// Returns the logical path for an on-disk file, `None` for buffers.
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            SourceOrigin::OnDisk { path, .. } => Some(path),
            SourceOrigin::Buffer { .. } => None,
        }
    }

    /// Returns `true` if this file is a synthetic in-memory buffer.
    pub fn is_buffer(&self) -> bool {
        matches!(self.origin, SourceOrigin::Buffer { .. })
    }
}
