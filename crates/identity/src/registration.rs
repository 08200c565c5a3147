//! Registration service: validate, hash, insert.

use std::sync::Arc;
use std::time::Duration;

use crumble_auth::{AuthError, PasswordHasher, policy};
use crumble_store::{StoreError, UserRecord, UserStore};

use crate::retry::{STORE_TIMEOUT, store_call};
use crate::{Credentials, RegistrationError};

/// Admits new users: syntactic policy, uniqueness, hashed storage.
///
/// The lookup in step 2 is an advisory fast path only. Two concurrent
/// registrations for the same username can both pass it; the store's
/// atomic insert decides the winner and the loser surfaces as
/// [`RegistrationError::UsernameTaken`].
pub struct RegistrationService {
    store: Arc<dyn UserStore>,
    hasher: Arc<PasswordHasher>,
    store_timeout: Duration,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn UserStore>, hasher: Arc<PasswordHasher>) -> Self {
        Self {
            store,
            hasher,
            store_timeout: STORE_TIMEOUT,
        }
    }

    /// Override the per-call store deadline (tests).
    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Register a new user.
    ///
    /// Exactly one `UserRecord` is created on success; no store write
    /// happens on any failure path.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` — policy violation, checked before any I/O;
    /// - `UsernameTaken` — duplicate, authoritative from the atomic insert;
    /// - `Hashing` — the hashing primitive failed;
    /// - `Network` — the store stayed unreachable after one retry.
    pub async fn register(&self, credentials: &Credentials) -> Result<(), RegistrationError> {
        if !policy::validate(credentials.username(), credentials.password()) {
            return Err(RegistrationError::InvalidCredentials);
        }

        let username = credentials.username().to_owned();

        // Advisory early exit; the insert below remains the source of truth.
        let existing = store_call(self.store_timeout, || self.store.lookup(&username))
            .await
            .map_err(RegistrationError::Network)?;
        if existing.is_some() {
            return Err(RegistrationError::UsernameTaken);
        }

        let hash = hash_blocking(self.hasher.clone(), credentials.password().to_owned())
            .await
            .map_err(RegistrationError::Hashing)?;

        let record = UserRecord::new(username.clone(), hash);
        match store_call(self.store_timeout, || self.store.insert(record.clone())).await {
            Ok(()) => {
                tracing::info!(username = %username, "registered new user");
                Ok(())
            }
            Err(StoreError::DuplicateUsername) => Err(RegistrationError::UsernameTaken),
            Err(other) => Err(RegistrationError::Network(other)),
        }
    }
}

/// Run the CPU-bound hash off the async threads so a registration in
/// flight never stalls the accept loop.
pub(crate) async fn hash_blocking(
    hasher: Arc<PasswordHasher>,
    password: String,
) -> Result<crumble_auth::SecretHash, AuthError> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AuthError::HashingFailed(format!("hashing task failed: {e}")))?
}

/// Same, for verification.
pub(crate) async fn verify_blocking(
    hasher: Arc<PasswordHasher>,
    password: String,
    hash: crumble_auth::SecretHash,
) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| AuthError::HashingFailed(format!("verification task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use crumble_store::InMemoryUserStore;

    use super::*;

    fn service() -> (Arc<InMemoryUserStore>, RegistrationService) {
        let store = Arc::new(InMemoryUserStore::new());
        let hasher = Arc::new(PasswordHasher::with_params(4096, 1, 1).unwrap());
        let service = RegistrationService::new(store.clone(), hasher);
        (store, service)
    }

    #[tokio::test]
    async fn register_success_creates_one_record() {
        let (store, service) = service();

        service
            .register(&Credentials::new("alice_x", "abcd1234"))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        let record = store.lookup("alice_x").await.unwrap().unwrap();
        assert!(record.password_hash.as_str().starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn invalid_credentials_rejected_before_any_write() {
        let (store, service) = service();

        // Uppercase and too short.
        let err = service
            .register(&Credentials::new("AL", "abcd1234"))
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::InvalidCredentials));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let (store, service) = service();

        service
            .register(&Credentials::new("alice_x", "abcd1234"))
            .await
            .unwrap();
        let err = service
            .register(&Credentials::new("alice_x", "other5678"))
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::UsernameTaken));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_same_username_registrations_admit_exactly_one() {
        let (store, service) = service();
        let service = Arc::new(service);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .register(&Credentials::new("alice_x", "abcd1234"))
                        .await
                })
            })
            .collect();

        let mut ok = 0;
        let mut taken = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(RegistrationError::UsernameTaken) => taken += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(taken, 7);
        assert_eq!(store.len(), 1);
    }
}
