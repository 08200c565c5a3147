//! Request and response bodies.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UnregisterBody {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn yes() -> Self {
        Self { ok: true }
    }
}
