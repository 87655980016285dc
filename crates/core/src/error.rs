//! Structured error kinds for the core.
//!
//! Errors propagate up to the operational boundary, which maps them to
//! HTTP status codes: `InvalidArgument` → 400, `NotFound` → 404,
//! everything else → 500.

use thiserror::Error;

/// Core error type.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Caller supplied an invalid argument (bad `k`, wrong dimensionality,
    /// empty embedding, oversized batch).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Requested id is absent from the store.
    #[error("not found: {0}")]
    NotFound(String),

    /// External embedding call failed.
    #[error("embedder failure: {0}")]
    Embedder(String),

    /// Persisted bytes failed to decode. Fatal to the operation,
    /// non-fatal to the process.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// Anything else; surfaced as an opaque failure with a message.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Internal(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
