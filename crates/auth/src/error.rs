//! Error types for credential and token operations.

use thiserror::Error;

/// Authentication primitive error.
///
/// Each variant maps to a specific failure mode. Note that a *wrong*
/// password or an *invalid* credential pair is not an error at this layer;
/// those are ordinary `false`/`Err(Unauthorized)` outcomes upstream.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Token has expired (`exp` is in the past).
    #[error("token has expired")]
    TokenExpired,

    /// Token signature did not verify under the current signing key.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Token is malformed (bad structure, base64, or claims JSON).
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The hashing primitive itself failed (never a wrong password).
    #[error("password hashing failed: {0}")]
    HashingFailed(String),

    /// Stored hash is not a valid PHC string.
    #[error("invalid password hash format")]
    InvalidHashFormat,
}

impl AuthError {
    /// Whether this error indicates an expired token.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, AuthError::TokenExpired)
    }

    /// Whether this error relates to token verification (as opposed to
    /// password hashing).
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            AuthError::TokenExpired | AuthError::InvalidSignature | AuthError::InvalidToken(_)
        )
    }
}
