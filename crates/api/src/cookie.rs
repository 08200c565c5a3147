//! Session cookie helpers.
//!
//! The session token travels in an `HttpOnly; Secure; SameSite=Strict`
//! cookie so page scripts never see it. `Authorization: Bearer` is also
//! accepted (see the middleware) for non-browser clients.

use axum::http::{HeaderMap, HeaderValue, header::SET_COOKIE};
use crumble_auth::SessionToken;

/// Cookie name carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "crumble_session";

/// Render the session cookie header value.
#[must_use]
pub fn session_cookie(token: &SessionToken, max_age_secs: i64) -> String {
    format!(
        "{SESSION_COOKIE_NAME}={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={max_age_secs}",
        token.as_str()
    )
}

/// Render a cookie that clears the session.
#[must_use]
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE_NAME}=; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=0")
}

/// Attach a cookie to response headers.
pub fn set_cookie(headers: &mut HeaderMap, cookie: &str) {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        headers.insert(SET_COOKIE, value);
    }
}

/// Extract the session token from the request's `Cookie` header.
#[must_use]
pub fn extract_session_cookie(headers: &HeaderMap) -> Option<SessionToken> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    // "name1=value1; name2=value2"
    for part in cookie_str.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix(SESSION_COOKIE_NAME) {
            if let Some(value) = value.strip_prefix('=') {
                if !value.is_empty() {
                    return Some(SessionToken::from_raw(value.trim()));
                }
            }
        }
    }
    None
}
