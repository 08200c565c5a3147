//! `crumble-identity` — registration and session orchestration.
//!
//! Wires the pure auth primitives (`crumble-auth`) to the user store
//! (`crumble-store`). Both services are stateless and safe to share across
//! concurrent requests; the only cross-request invariant (one record per
//! username) is delegated to the store's atomic insert.

pub mod credentials;
pub mod error;
pub mod registration;
mod retry;
pub mod session;

pub use credentials::Credentials;
pub use error::{RegistrationError, SessionError};
pub use registration::RegistrationService;
pub use session::SessionAuthority;
