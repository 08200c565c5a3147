//! Session lifecycle: login, logout, renew.

use std::sync::Arc;

use axum::{
    Extension, Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use crumble_auth::SessionToken;
use crumble_identity::Credentials;

use crate::app::dto::{CredentialsBody, OkResponse, SessionResponse};
use crate::app::{AppServices, errors};
use crate::cookie;

/// `POST /api/login`
///
/// Verifies credentials and hands out a fresh session token, both in the
/// body and as the session cookie.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CredentialsBody>,
) -> Response {
    let credentials = Credentials::new(body.username, body.password);

    match services.sessions.login(&credentials).await {
        Ok(token) => session_response(&services, token),
        Err(err) => errors::session_error_to_response(err),
    }
}

/// `POST /api/logout`
///
/// Clears the session cookie. Tokens are stateless, so a copy the client
/// kept elsewhere stays valid until it expires.
pub async fn logout() -> Response {
    let mut headers = HeaderMap::new();
    cookie::set_cookie(&mut headers, &cookie::clear_session_cookie());
    (StatusCode::OK, headers, Json(OkResponse::yes())).into_response()
}

/// `POST /api/renew`
///
/// Replaces a valid session token with one expiring a full TTL from now.
/// The middleware has already authenticated the presented token.
pub async fn renew(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<SessionToken>,
) -> Response {
    match services.sessions.renew(&token) {
        Ok(renewed) => session_response(&services, renewed),
        Err(err) => errors::session_error_to_response(err),
    }
}

fn session_response(services: &AppServices, token: SessionToken) -> Response {
    let mut headers = HeaderMap::new();
    cookie::set_cookie(
        &mut headers,
        &cookie::session_cookie(&token, services.cookie_max_age_secs),
    );

    (
        StatusCode::OK,
        headers,
        Json(SessionResponse {
            token: token.as_str().to_owned(),
        }),
    )
        .into_response()
}
