//! # Engine Errors
//!
//! The error type operation callers see. Business rule violations arrive
//! wrapped from kopi-core, storage failures from kopi-db; the only errors
//! born here are authentication failures and hashing problems.

use thiserror::Error;

use kopi_core::CoreError;
use kopi_db::DbError;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule violation (insufficient stock, insufficient payment,
    /// validation failure, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Unknown username or wrong password. Deliberately does not say
    /// which, so the login screen cannot be used to probe for accounts.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Password hashing or verification infrastructure failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Outbox payload could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl EngineError {
    /// Shorthand for the product-not-found case.
    pub fn product_not_found(id: impl Into<String>) -> Self {
        EngineError::Core(CoreError::ProductNotFound(id.into()))
    }
}

/// Convenience alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
