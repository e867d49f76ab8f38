//! # Sync Errors

use thiserror::Error;

use kopi_db::DbError;

/// Errors raised by the sync worker and hydrator.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local storage failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The remote store rejected or failed an operation.
    #[error("Remote store error: {0}")]
    Remote(String),

    /// A payload or document could not be (de)serialized.
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// An outbox row carries an entity type this worker does not know.
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),
}

/// Convenience alias for Results with SyncError.
pub type SyncResult<T> = Result<T, SyncError>;
