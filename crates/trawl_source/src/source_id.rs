//! Opaque identifier for files opened during one preprocessing session.

use serde::{Deserialize, Serialize};

/// Opaque identifier for a file the front end has opened.
///
/// Ids are assigned by the front end in encounter order and are only
/// meaningful within a single preprocessing session. They are used to match
/// enter/exit events to the consumer's frame stack and as the key for the
/// per-session "already addressed" and "seen" sets. Anything that must be
/// stable across runs (manifest ordering, content identity) is keyed by path
/// or content hash instead.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SourceId(u32);

impl SourceId {
    /// Creates a `SourceId` from a raw `u32` value.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` value of this `SourceId`.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}
