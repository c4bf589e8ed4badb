//! Database error types.

use thiserror::Error;

/// Result type for store operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur in the transaction store.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Transaction not found: {0}")]
    AccessNotFound(String),

    #[error("Access already recorded: {0}")]
    DuplicateAccess(String),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    pub fn access_not_found(access_id: impl Into<String>) -> Self {
        Self::AccessNotFound(access_id.into())
    }
}
