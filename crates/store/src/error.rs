//! Store error model.

use thiserror::Error;

/// Failure modes of the user store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with this username already exists (atomic insert conflict).
    #[error("username already exists")]
    DuplicateUsername,

    /// No record with this username.
    #[error("user not found")]
    NotFound,

    /// The store did not answer within the caller's deadline.
    #[error("store call timed out")]
    Timeout,

    /// Backend fault (connectivity, protocol, unexpected database error).
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether the caller may retry the operation once.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Timeout | StoreError::Backend(_))
    }
}
