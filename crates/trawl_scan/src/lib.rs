//! The scanning facade: one preprocessing run, four output shapes.
//!
//! [`ScanTool`] drives a preprocessing front end (anything implementing
//! [`Preprocess`]) against the scanning consumers and exposes the results
//! as a make-format dependency file, a tracked-filesystem tree, a
//! content-addressed include tree, or a full structured dependency record
//! with newly discovered modules.

#![warn(missing_docs)]

pub mod consumer;
pub mod error;
pub mod tool;

pub use consumer::{DepFilePrinter, EventSink, NullSink, Preprocess};
pub use error::ScanError;
pub use tool::ScanTool;
