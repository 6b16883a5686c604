//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur inside the sync engine.
///
/// None of these are fatal to the embedding process: the orchestrator
/// folds every failure into backoff state and the last-error
/// observable instead of propagating it upward.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The local session store could not be read.
    #[error("local store error: {0}")]
    LocalStore(#[from] fitsync_core::CoreError),

    /// A remote upload attempt failed.
    #[error("upload error: {0}")]
    Upload(#[from] UploadError),

    /// The durable state store rejected a read or write.
    #[error("state persistence error: {0}")]
    Persistence(String),

    /// The persisted sync ledger could not be encoded or decoded.
    #[error("ledger codec error: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

/// Errors from the remote uploader collaborator.
///
/// The orchestrator treats every variant identically: record, engage
/// backoff, move on. The taxonomy exists for status display, not for
/// differentiated retry behavior.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The remote rejected the call because the caller is not
    /// authenticated.
    #[error("not authenticated")]
    Unauthorized,

    /// The remote could not be reached or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The remote accepted the connection but rejected the payload.
    #[error("upload rejected: {0}")]
    Rejected(String),
}
