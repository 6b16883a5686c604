//! Error types for the core domain model.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors produced by the domain model and local store.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The local session store could not be read.
    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),

    /// A record failed a structural sanity check.
    #[error("invalid session record: {0}")]
    InvalidRecord(String),
}
