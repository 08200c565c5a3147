//! Application shell served for anything that is not an API route.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

const APP_SHELL: &str = include_str!("../../../assets/index.html");

/// Fallback handler: any unmatched path gets the single-page shell so
/// client-side routes survive a hard refresh.
pub async fn app_shell() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        APP_SHELL,
    )
        .into_response()
}
