//! Sampler error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for sampling operations.
pub type SampleResult<T> = Result<T, SampleError>;

/// Errors that can occur while reading tick counters.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("counter source not found: {0}")]
    SourceNotFound(String),

    #[error("malformed stat line: {0}")]
    Malformed(String),
}
