//! `crumble-auth` — pure credential and session-token primitives.
//!
//! This crate is intentionally decoupled from HTTP and storage: policy
//! checks, password hashing, and token signing/verification only.

pub mod error;
pub mod password;
pub mod policy;
pub mod token;

pub use error::AuthError;
pub use password::{PasswordHasher, SecretHash};
pub use policy::validate;
pub use token::{SessionClaims, SessionToken, TokenSigner};
