//! Error types for mm-output.

use mm_core::CoreError;
use thiserror::Error;

/// Errors that can occur while storing or parsing trajectory/path files.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Core invariant and timestamp-parse failures.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Alias for `Result<T, OutputError>`.
pub type OutputResult<T> = Result<T, OutputError>;
