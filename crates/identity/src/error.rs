//! Identity service error taxonomy.
//!
//! Expected outcomes (policy violations, conflicts, bad logins) are typed
//! results the HTTP layer maps to client statuses; only primitive faults
//! and store connectivity use the remaining variants.

use crumble_auth::AuthError;
use crumble_store::StoreError;
use thiserror::Error;

/// Registration failure.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The pair violates the syntactic credential policy. Checked before
    /// any I/O; user-correctable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Another record with this username exists. Sourced from the store's
    /// atomic insert, not from the advisory pre-check.
    #[error("username already taken")]
    UsernameTaken,

    /// The hashing primitive failed; internal, fatal to the request.
    #[error("hashing failure")]
    Hashing(#[source] AuthError),

    /// Store timeout or connectivity fault (already retried once).
    #[error("store unavailable")]
    Network(#[source] StoreError),
}

/// Login / token verification failure.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Bad login: unknown username or wrong password — deliberately
    /// indistinguishable to prevent username enumeration.
    #[error("unauthorized")]
    Unauthorized,

    /// Token presented past its expiry.
    #[error("session expired")]
    Expired,

    /// Token signature did not verify, or the token is malformed.
    #[error("invalid session token")]
    Invalid,

    /// Internal primitive fault (hashing or token encoding); fatal to the
    /// request, logged, never detailed to the client.
    #[error("internal auth fault")]
    Internal(#[source] AuthError),

    /// Store timeout or connectivity fault (already retried once).
    #[error("store unavailable")]
    Network(#[source] StoreError),
}

impl SessionError {
    pub(crate) fn from_token_error(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => SessionError::Expired,
            AuthError::InvalidSignature | AuthError::InvalidToken(_) => SessionError::Invalid,
            other => SessionError::Internal(other),
        }
    }
}
