//! Session authority: login, renew, authenticate, account deletion.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crumble_auth::{PasswordHasher, SecretHash, SessionToken, TokenSigner};
use crumble_store::{StoreError, UserStore};

use crate::registration::verify_blocking;
use crate::retry::{STORE_TIMEOUT, store_call};
use crate::{Credentials, SessionError};

/// Issues, verifies, and renews signed session tokens.
///
/// Stateless: a minted token's validity is decided by signature and expiry
/// alone. There is no server-side session table, so logout cannot revoke a
/// token before its natural expiry — a known limitation of this design,
/// not something handlers should try to paper over.
pub struct SessionAuthority {
    store: Arc<dyn UserStore>,
    hasher: Arc<PasswordHasher>,
    signer: TokenSigner,
    store_timeout: Duration,
    /// Hash verified for unknown usernames so a login attempt costs the
    /// same work whether or not the user exists.
    decoy: OnceLock<SecretHash>,
}

impl SessionAuthority {
    pub fn new(store: Arc<dyn UserStore>, hasher: Arc<PasswordHasher>, signer: TokenSigner) -> Self {
        Self {
            store,
            hasher,
            signer,
            store_timeout: STORE_TIMEOUT,
            decoy: OnceLock::new(),
        }
    }

    /// Override the per-call store deadline (tests).
    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Verify credentials and mint a session token.
    ///
    /// An unknown username and a wrong password both return
    /// [`SessionError::Unauthorized`] with the same shape and comparable
    /// timing, so callers cannot enumerate usernames.
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionToken, SessionError> {
        let username = credentials.username().to_owned();
        let record = store_call(self.store_timeout, || self.store.lookup(&username))
            .await
            .map_err(SessionError::Network)?;

        let Some(record) = record else {
            self.burn_verification(credentials.password()).await;
            return Err(SessionError::Unauthorized);
        };

        let matches = verify_blocking(
            self.hasher.clone(),
            credentials.password().to_owned(),
            record.password_hash,
        )
        .await
        .map_err(SessionError::Internal)?;

        if !matches {
            return Err(SessionError::Unauthorized);
        }

        tracing::info!(username = %username, "login succeeded");
        self.signer.mint(&username).map_err(SessionError::Internal)
    }

    /// Verify a not-yet-expired token and mint a replacement with a fresh
    /// TTL window and a strictly later expiry.
    pub fn renew(&self, token: &SessionToken) -> Result<SessionToken, SessionError> {
        self.signer.renew(token).map_err(SessionError::from_token_error)
    }

    /// Gatekeeping check for protected routes: signature + expiry, no
    /// minting. Returns the username the token was issued to.
    pub fn authenticate(&self, token: &SessionToken) -> Result<String, SessionError> {
        self.signer
            .verify(token)
            .map(|claims| claims.sub)
            .map_err(SessionError::from_token_error)
    }

    /// Delete an account after re-verifying its password.
    ///
    /// The caller must already have authenticated the session token and
    /// pass the username it resolved to.
    pub async fn unregister(&self, username: &str, password: &str) -> Result<(), SessionError> {
        let owned = username.to_owned();
        let record = store_call(self.store_timeout, || self.store.lookup(&owned))
            .await
            .map_err(SessionError::Network)?
            .ok_or(SessionError::Unauthorized)?;

        let matches = verify_blocking(self.hasher.clone(), password.to_owned(), record.password_hash)
            .await
            .map_err(SessionError::Internal)?;
        if !matches {
            return Err(SessionError::Unauthorized);
        }

        match store_call(self.store_timeout, || self.store.delete(&owned)).await {
            Ok(()) => {
                tracing::info!(username = %username, "account deleted");
                Ok(())
            }
            // Deleted concurrently; the outcome the caller asked for holds.
            Err(StoreError::NotFound) => Ok(()),
            Err(other) => Err(SessionError::Network(other)),
        }
    }

    /// Spend one verification's worth of work on a decoy hash.
    async fn burn_verification(&self, password: &str) {
        let decoy = self
            .decoy
            .get_or_init(|| {
                self.hasher
                    .hash("decoy-password-0")
                    .unwrap_or_else(|_| SecretHash::from_phc("$argon2id$invalid"))
            })
            .clone();

        let _ = verify_blocking(self.hasher.clone(), password.to_owned(), decoy).await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use crumble_store::InMemoryUserStore;

    use crate::RegistrationService;

    use super::*;

    const SECRET: &[u8] = b"test-secret";

    async fn fixture(ttl: ChronoDuration) -> (Arc<InMemoryUserStore>, SessionAuthority) {
        let store = Arc::new(InMemoryUserStore::new());
        let hasher = Arc::new(PasswordHasher::with_params(4096, 1, 1).unwrap());

        let registration = RegistrationService::new(store.clone(), hasher.clone());
        registration
            .register(&Credentials::new("alice_x", "abcd1234"))
            .await
            .unwrap();

        let authority = SessionAuthority::new(store.clone(), hasher, TokenSigner::new(SECRET, ttl));
        (store, authority)
    }

    #[tokio::test]
    async fn login_then_authenticate_round_trip() {
        let (_, authority) = fixture(ChronoDuration::minutes(15)).await;

        let token = authority
            .login(&Credentials::new("alice_x", "abcd1234"))
            .await
            .unwrap();

        assert_eq!(authority.authenticate(&token).unwrap(), "alice_x");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let (_, authority) = fixture(ChronoDuration::minutes(15)).await;

        let wrong_password = authority
            .login(&Credentials::new("alice_x", "wrongpass1"))
            .await
            .unwrap_err();
        let unknown_user = authority
            .login(&Credentials::new("nobody_here", "abcd1234"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, SessionError::Unauthorized));
        assert!(matches!(unknown_user, SessionError::Unauthorized));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn renew_before_expiry_extends_the_session() {
        let (_, authority) = fixture(ChronoDuration::minutes(15)).await;

        let token = authority
            .login(&Credentials::new("alice_x", "abcd1234"))
            .await
            .unwrap();
        let renewed = authority.renew(&token).unwrap();

        assert_ne!(token, renewed);
        assert_eq!(authority.authenticate(&renewed).unwrap(), "alice_x");
    }

    #[tokio::test]
    async fn expired_token_is_rejected_everywhere() {
        // Negative TTL mints tokens that are already past expiry.
        let (_, authority) = fixture(ChronoDuration::seconds(-10)).await;

        let token = authority
            .login(&Credentials::new("alice_x", "abcd1234"))
            .await
            .unwrap();

        assert!(matches!(
            authority.authenticate(&token).unwrap_err(),
            SessionError::Expired
        ));
        assert!(matches!(authority.renew(&token).unwrap_err(), SessionError::Expired));
    }

    #[tokio::test]
    async fn forged_token_is_invalid() {
        let (_, authority) = fixture(ChronoDuration::minutes(15)).await;

        let forged = TokenSigner::new(b"other-secret", ChronoDuration::minutes(15))
            .mint("alice_x")
            .unwrap();

        assert!(matches!(
            authority.authenticate(&forged).unwrap_err(),
            SessionError::Invalid
        ));
    }

    #[tokio::test]
    async fn unregister_requires_the_password() {
        let (store, authority) = fixture(ChronoDuration::minutes(15)).await;

        let err = authority.unregister("alice_x", "wrongpass1").await.unwrap_err();
        assert!(matches!(err, SessionError::Unauthorized));
        assert_eq!(store.len(), 1);

        authority.unregister("alice_x", "abcd1234").await.unwrap();
        assert!(store.is_empty());
    }
}
