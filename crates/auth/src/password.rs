//! Secret hashing with Argon2id.
//!
//! Salted, adaptive one-way hashing with a configurable work factor. Each
//! call draws a fresh random salt; verification is constant-time.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// A hashed secret in PHC string format.
///
/// The PHC string carries the algorithm, its parameters, the per-record
/// salt, and the digest — the whole (hash, salt) pair in one opaque value.
/// It is the only credential material the store ever sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretHash(String);

impl SecretHash {
    /// Wrap an existing PHC string (e.g. read back from the store).
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// The PHC string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The base64 salt segment of the PHC string, if parseable.
    ///
    /// Exposed so callers can assert salt freshness without re-parsing.
    #[must_use]
    pub fn salt(&self) -> Option<String> {
        let parsed = PasswordHash::new(&self.0).ok()?;
        parsed.salt.map(|s| s.as_str().to_owned())
    }
}

/// Argon2id password hasher.
///
/// Defaults to the OWASP-recommended parameters (m=19456 KiB, t=2, p=1).
/// Tests use `with_params` to trade hardness for speed.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    /// Hasher with the OWASP-recommended default parameters.
    #[must_use]
    pub fn new() -> Self {
        // m=19456 KiB, t=2, p=1. Constants known to be valid; a failure here
        // is a bug in the argon2 crate, not a runtime condition.
        let params = Params::new(19456, 2, 1, None).expect("default Argon2 parameters are valid");
        Self { params }
    }

    /// Hasher with an explicit work factor.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::HashingFailed` if the parameters are out of range.
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AuthError::HashingFailed(format!("invalid parameters: {e}")))?;
        Ok(Self { params })
    }

    /// Hash a plaintext secret with a freshly generated salt.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::HashingFailed` if the primitive fails; a usable
    /// credential is never returned on failure.
    pub fn hash(&self, plaintext: &str) -> Result<SecretHash, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingFailed(e.to_string()))?;

        Ok(SecretHash(hash.to_string()))
    }

    /// Verify a plaintext secret against a stored hash.
    ///
    /// Comparison time does not depend on where a mismatch occurs.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidHashFormat` if the stored value is not a
    /// valid PHC string, and `AuthError::HashingFailed` if the primitive
    /// faults (e.g. a parseable hash carrying unusable parameters). A wrong
    /// password is `Ok(false)`, not an error.
    pub fn verify(&self, plaintext: &str, hash: &SecretHash) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash.as_str()).map_err(|_| AuthError::InvalidHashFormat)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        match argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            // Any other failure is a primitive fault, never a mismatch.
            Err(e) => Err(AuthError::HashingFailed(e.to_string())),
        }
    }
}
