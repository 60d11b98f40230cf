//! Error type for scanning calls.

use trawl_store::StoreError;

/// Errors surfaced by a scanning call.
///
/// A failed scan yields no artifact for its translation unit; the caller
/// decides whether to retry, skip, or abort the larger build.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A storage or file-content failure, including unreadable files
    /// recorded by a consumer mid-scan.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The front end failed to preprocess the translation unit.
    #[error("preprocessing failed: {reason}")]
    Preprocess {
        /// Description of the front-end failure.
        reason: String,
    },

    /// A tracked-filesystem output was requested but no tracking
    /// filesystem was attached to the tool.
    #[error("filesystem tracking is not configured for this tool")]
    NoTrackingFs,
}
