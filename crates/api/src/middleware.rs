//! Session gatekeeping for protected routes.

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use crumble_auth::SessionToken;
use crumble_identity::SessionAuthority;

use crate::app::errors;
use crate::context::SessionContext;
use crate::cookie;

#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<SessionAuthority>,
}

/// Authenticate the request before it reaches a protected handler.
///
/// Rejects with 401 on a missing, invalid, or expired token; otherwise
/// injects [`SessionContext`] and the presented token (the renew handler
/// needs it) into request extensions.
pub async fn session_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let Some(token) = extract_token(req.headers()) else {
        return Err(errors::json_error(
            axum::http::StatusCode::UNAUTHORIZED,
            "unauthorized",
            "authentication required",
        ));
    };

    let username = state
        .sessions
        .authenticate(&token)
        .map_err(errors::session_error_to_response)?;

    req.extensions_mut().insert(SessionContext::new(username));
    req.extensions_mut().insert(token);

    Ok(next.run(req).await)
}

/// Session cookie first, `Authorization: Bearer` as fallback.
fn extract_token(headers: &HeaderMap) -> Option<SessionToken> {
    if let Some(token) = cookie::extract_session_cookie(headers) {
        return Some(token);
    }

    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(SessionToken::from_raw(token))
}
