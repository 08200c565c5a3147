//! The persistent user record.

use crumble_auth::SecretHash;
use serde::{Deserialize, Serialize};

/// A stored user: username plus hashed credential material.
///
/// Owned exclusively by the store — never cached elsewhere. Created on
/// successful registration, never mutated, deleted only through the
/// authenticated deletion flow (which re-verifies the password first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique, immutable, case-sensitive username.
    pub username: String,
    /// PHC-encoded hash + salt; no plaintext ever reaches the store.
    pub password_hash: SecretHash,
}

impl UserRecord {
    pub fn new(username: impl Into<String>, password_hash: SecretHash) -> Self {
        Self {
            username: username.into(),
            password_hash,
        }
    }
}
