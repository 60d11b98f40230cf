//! Shared foundational types for the Trawl dependency scanner.
//!
//! This crate provides the content hash used for all content addressing.

#![warn(missing_docs)]

pub mod hash;

pub use hash::ContentHash;
