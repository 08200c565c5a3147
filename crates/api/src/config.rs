//! Server configuration.
//!
//! A [`FrontDoorConfig`] is an immutable value applied as a single unit:
//! the front door either runs a whole configuration or none of it, and
//! reconfiguration swaps complete values rather than mutating fields in
//! place.

use std::net::SocketAddr;
use std::path::Path;

use axum::Router;

/// PEM-encoded TLS certificate chain and private key.
#[derive(Clone)]
pub struct TlsMaterial {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

impl TlsMaterial {
    pub fn new(cert_pem: impl Into<Vec<u8>>, key_pem: impl Into<Vec<u8>>) -> Self {
        Self {
            cert_pem: cert_pem.into(),
            key_pem: key_pem.into(),
        }
    }

    /// Read certificate and key from PEM files.
    pub fn from_files(cert_path: &Path, key_path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            cert_pem: std::fs::read(cert_path)?,
            key_pem: std::fs::read(key_path)?,
        })
    }
}

impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of logs.
        f.debug_struct("TlsMaterial")
            .field("cert_pem_len", &self.cert_pem.len())
            .field("key_pem_len", &self.key_pem.len())
            .finish()
    }
}

/// One complete front-door configuration: listen addresses, TLS material,
/// and the routing table.
#[derive(Clone)]
pub struct FrontDoorConfig {
    /// Plaintext listener (redirect-only). Port 80 in production.
    pub http_addr: SocketAddr,
    /// TLS listener. Port 443 in production.
    pub https_addr: SocketAddr,
    pub tls: TlsMaterial,
    /// The routing table served over TLS.
    pub routes: Router,
}

/// Environment-derived process settings (binary entrypoint only).
#[derive(Debug)]
pub struct Settings {
    pub http_addr: SocketAddr,
    pub https_addr: SocketAddr,
    pub tls_cert_path: std::path::PathBuf,
    pub tls_key_path: std::path::PathBuf,
    pub token_secret: String,
    pub session_ttl_secs: i64,
    pub database_url: Option<String>,
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// `CRUMBLE_TLS_CERT` and `CRUMBLE_TLS_KEY` are required; everything
    /// else has a (dev-grade) default.
    pub fn from_env() -> anyhow::Result<Self> {
        let http_addr = env_or("CRUMBLE_HTTP_ADDR", "0.0.0.0:80").parse()?;
        let https_addr = env_or("CRUMBLE_HTTPS_ADDR", "0.0.0.0:443").parse()?;

        let tls_cert_path = require_env("CRUMBLE_TLS_CERT")?.into();
        let tls_key_path = require_env("CRUMBLE_TLS_KEY")?.into();

        let token_secret = std::env::var("CRUMBLE_TOKEN_SECRET").unwrap_or_else(|_| {
            tracing::warn!("CRUMBLE_TOKEN_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });

        let session_ttl_secs = env_or("CRUMBLE_SESSION_TTL_SECS", "900").parse()?;
        let database_url = std::env::var("DATABASE_URL").ok();

        Ok(Self {
            http_addr,
            https_addr,
            tls_cert_path,
            tls_key_path,
            token_secret,
            session_ttl_secs,
            database_url,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> anyhow::Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("{key} must be set"))
}
