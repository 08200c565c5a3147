//! Account lifecycle: register, inspect, delete.

use std::sync::Arc;

use axum::{
    Extension, Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use crumble_identity::Credentials;

use crate::app::dto::{CredentialsBody, MeResponse, OkResponse, RegisterResponse, UnregisterBody};
use crate::app::{AppServices, errors};
use crate::context::SessionContext;
use crate::cookie;

/// `POST /api/register`
///
/// Validates and stores a new account. Plaintext passwords never reach the
/// log or the store; only the derived hash is persisted.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CredentialsBody>,
) -> Response {
    let credentials = Credentials::new(body.username, body.password);

    match services.registration.register(&credentials).await {
        Ok(()) => {
            tracing::info!(username = %credentials.username(), "account registered");
            (
                StatusCode::OK,
                Json(RegisterResponse {
                    username: credentials.username().to_owned(),
                }),
            )
                .into_response()
        }
        Err(err) => errors::registration_error_to_response(err),
    }
}

/// `GET /api/me` — whoami for the authenticated session.
pub async fn me(Extension(ctx): Extension<SessionContext>) -> Response {
    (
        StatusCode::OK,
        Json(MeResponse {
            username: ctx.username().to_owned(),
        }),
    )
        .into_response()
}

/// `POST /api/unregister`
///
/// Deletes the authenticated account after re-verifying its password, and
/// clears the session cookie.
pub async fn unregister(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<UnregisterBody>,
) -> Response {
    match services.sessions.unregister(ctx.username(), &body.password).await {
        Ok(()) => {
            let mut headers = HeaderMap::new();
            cookie::set_cookie(&mut headers, &cookie::clear_session_cookie());
            (StatusCode::OK, headers, Json(OkResponse::yes())).into_response()
        }
        Err(err) => errors::session_error_to_response(err),
    }
}
