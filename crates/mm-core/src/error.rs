//! Core error type.
//!
//! Sub-crates define their own error enums and either convert `CoreError`
//! via `#[from]` or keep it as a wrapped variant.  Both patterns are used;
//! prefer whichever keeps error sites clean.

use thiserror::Error;

/// Errors raised by core invariant checks and parsing helpers.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("trajectory {0} has no points")]
    EmptyTrajectory(String),

    #[error("trajectory {tid}: timestamp at point {index} precedes its predecessor")]
    NonMonotonicTimestamps { tid: String, index: usize },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),
}

/// Shorthand result type for `mm-core`.
pub type CoreResult<T> = Result<T, CoreError>;
