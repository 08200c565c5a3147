//! Application assembly: services plus the routing table.

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use chrono::Duration as ChronoDuration;
use crumble_auth::{PasswordHasher, TokenSigner};
use crumble_identity::{RegistrationService, SessionAuthority};
use crumble_store::UserStore;

use crate::middleware::{AuthState, session_middleware};

pub mod dto;
pub mod errors;
pub mod routes;

/// Shared service handles injected into handlers.
pub struct AppServices {
    pub registration: Arc<RegistrationService>,
    pub sessions: Arc<SessionAuthority>,
    /// `Max-Age` for the session cookie; matches the token TTL.
    pub cookie_max_age_secs: i64,
}

impl AppServices {
    pub fn new(store: Arc<dyn UserStore>, token_secret: &[u8], session_ttl: ChronoDuration) -> Self {
        Self::with_hasher(store, Arc::new(PasswordHasher::new()), token_secret, session_ttl)
    }

    /// Assemble with a specific hasher (tests use cheaper parameters).
    pub fn with_hasher(
        store: Arc<dyn UserStore>,
        hasher: Arc<PasswordHasher>,
        token_secret: &[u8],
        session_ttl: ChronoDuration,
    ) -> Self {
        let signer = TokenSigner::new(token_secret, session_ttl);
        Self {
            registration: Arc::new(RegistrationService::new(store.clone(), hasher.clone())),
            sessions: Arc::new(SessionAuthority::new(store, hasher, signer)),
            cookie_max_age_secs: session_ttl.num_seconds(),
        }
    }
}

/// Build the full routing table.
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = AuthState {
        sessions: services.sessions.clone(),
    };

    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        session_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public_router())
        .merge(protected)
        .fallback(routes::content::app_shell)
        .layer(Extension(services))
}
