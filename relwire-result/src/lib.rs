//! Unified result and error types shared by every relwire crate.
//!
//! All fallible relwire APIs return [`Result`], and every failure mode in
//! the workspace is a variant of [`Error`]. Resolution APIs that treat
//! "not found" as an expected outcome return `Option`/empty collections
//! instead of an error; only operations that *require* the object to exist
//! (plan decoding, mostly) surface the not-found variants here.

#![forbid(unsafe_code)]

pub mod error;
pub use error::Error;

pub mod result;
pub use result::Result;
