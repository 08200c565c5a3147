//! Per-request context injected by the session middleware.

/// Authenticated identity for a request.
///
/// Present on all protected routes; handlers can rely on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    username: String,
}

impl SessionContext {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}
