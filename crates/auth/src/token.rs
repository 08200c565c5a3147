//! Signed session tokens.
//!
//! Stateless bearer tokens (HS256 JWTs). Validity is decided entirely by
//! the signature and the expiry claim; nothing is stored server-side, so a
//! token cannot be revoked before its natural expiry.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// An opaque signed session token as handed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject — the username the session belongs to.
    pub sub: String,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds. The token is valid iff `now < exp`.
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
}

/// Mints and verifies session tokens under a single signing key.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    /// Signer over a shared secret with a fixed session TTL.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Session TTL applied to minted tokens.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a fresh token for `username`, expiring one TTL from now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if encoding fails.
    pub fn mint(&self, username: &str) -> Result<SessionToken, AuthError> {
        let now = Utc::now().timestamp();
        self.mint_claims(&SessionClaims {
            sub: username.to_owned(),
            iat: now,
            exp: now + self.ttl.num_seconds(),
            jti: Uuid::new_v4().to_string(),
        })
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// No leeway is applied: a token one second past `exp` is expired.
    ///
    /// # Errors
    ///
    /// - `AuthError::TokenExpired` — past `exp`;
    /// - `AuthError::InvalidSignature` — signature mismatch;
    /// - `AuthError::InvalidToken` — malformed token.
    pub fn verify(&self, token: &SessionToken) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data: TokenData<SessionClaims> =
            decode(token.as_str(), &self.decoding, &validation).map_err(map_jwt_error)?;

        Ok(data.claims)
    }

    /// Verify `token` and mint a replacement for the same subject.
    ///
    /// The new expiry is strictly later than the old one even when renewal
    /// happens within the same second as the original mint.
    ///
    /// # Errors
    ///
    /// Same as [`TokenSigner::verify`].
    pub fn renew(&self, token: &SessionToken) -> Result<SessionToken, AuthError> {
        let prior = self.verify(token)?;
        let now = Utc::now().timestamp();
        self.mint_claims(&SessionClaims {
            sub: prior.sub,
            iat: now,
            exp: (now + self.ttl.num_seconds()).max(prior.exp + 1),
            jti: Uuid::new_v4().to_string(),
        })
    }

    fn mint_claims(&self, claims: &SessionClaims) -> Result<SessionToken, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map(SessionToken::from_raw)
            .map_err(|e| AuthError::InvalidToken(format!("encoding failed: {e}")))
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidToken => AuthError::InvalidToken("malformed token".to_owned()),
        ErrorKind::Base64(_) => AuthError::InvalidToken("invalid base64".to_owned()),
        ErrorKind::Json(_) => AuthError::InvalidToken("invalid claims JSON".to_owned()),
        _ => AuthError::InvalidToken(err.to_string()),
    }
}
