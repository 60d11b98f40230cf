//! Error types for storage operations.

use std::path::PathBuf;

/// Errors that can occur while storing or retrieving content.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred while reading a file.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An object reference was not present in the store.
    #[error("object {hash} not found in store")]
    MissingObject {
        /// Hex digest of the missing object's content hash.
        hash: String,
    },

    /// A stored object could not be encoded or decoded.
    #[error("object serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
