//! Route tables.

use axum::{
    Router,
    routing::{get, post},
};

pub mod account;
pub mod content;
pub mod session;
pub mod system;

/// Routes reachable without a session.
pub fn public_router() -> Router {
    Router::new()
        .route("/api/register", post(account::register))
        .route("/api/login", post(session::login))
        .route("/api/logout", post(session::logout))
}

/// Routes that require an authenticated session. The session middleware is
/// layered on by the app builder.
pub fn protected_router() -> Router {
    Router::new()
        .route("/api/renew", post(session::renew))
        .route("/api/me", get(account::me))
        .route("/api/unregister", post(account::unregister))
}
