//! Mapping of domain errors onto HTTP responses.
//!
//! Every error leaves the server as `{"error": {"code", "message"}}`. The
//! two credential failure modes (unknown user, wrong password) share one
//! response body so the API never confirms whether a username exists.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crumble_identity::{RegistrationError, SessionError};
use serde_json::json;

/// Build a JSON error response.
pub fn json_error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        })),
    )
        .into_response()
}

pub fn registration_error_to_response(err: RegistrationError) -> Response {
    match err {
        RegistrationError::InvalidCredentials => json_error(
            StatusCode::BAD_REQUEST,
            "invalid_credentials",
            "username or password does not meet requirements",
        ),
        RegistrationError::UsernameTaken => json_error(
            StatusCode::CONFLICT,
            "username_taken",
            "username is already registered",
        ),
        RegistrationError::Hashing(err) => {
            tracing::error!(error = %err, "password hashing failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal server error",
            )
        }
        RegistrationError::Network(err) => {
            tracing::error!(error = %err, "user store unavailable");
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "service temporarily unavailable",
            )
        }
    }
}

pub fn session_error_to_response(err: SessionError) -> Response {
    match err {
        // One body for both failure modes; see module docs.
        SessionError::Unauthorized | SessionError::Invalid => json_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "invalid credentials or session",
        ),
        SessionError::Expired => json_error(
            StatusCode::UNAUTHORIZED,
            "session_expired",
            "session has expired",
        ),
        SessionError::Internal(err) => {
            tracing::error!(error = %err, "session processing failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal server error",
            )
        }
        SessionError::Network(err) => {
            tracing::error!(error = %err, "user store unavailable");
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "service temporarily unavailable",
            )
        }
    }
}
