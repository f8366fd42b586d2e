use crate::error::Error;

/// Result type used across all relwire crates.
pub type Result<T> = std::result::Result<T, Error>;
