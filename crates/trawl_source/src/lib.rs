//! Source-file vocabulary shared between the preprocessing front end and the
//! scanning consumers.
//!
//! This crate defines [`SourceId`] for per-session file identity,
//! [`SourceFile`] describing a file the front end has opened (on-disk file or
//! synthetic buffer), [`FileCharacteristic`] for header classification, and
//! [`SessionEnd`] carrying the front-end state handed to consumers at
//! finalization.

#![warn(missing_docs)]

pub mod session;
pub mod source_file;
pub mod source_id;

pub use session::SessionEnd;
pub use source_file::{FileCharacteristic, SourceFile, SourceOrigin};
pub use source_id::SourceId;
