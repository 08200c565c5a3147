//! `crumble-store` — persistent user records behind a capability interface.
//!
//! The auth components depend only on the [`UserStore`] trait; adapters
//! (in-memory, Postgres) are interchangeable. Uniqueness of usernames is
//! enforced here, at insert time, atomically — callers must treat an
//! insert-time duplicate as the single source of truth, not any prior
//! lookup.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;

pub use error::StoreError;
pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;
pub use record::UserRecord;

use async_trait::async_trait;

/// Capability interface over persistent user records.
///
/// Implementations must make `insert` atomic and uniqueness-enforcing:
/// exactly one of N concurrent inserts for the same username may succeed,
/// the rest fail with [`StoreError::DuplicateUsername`].
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a record by exact (case-sensitive) username.
    async fn lookup(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a new record; fails atomically on a duplicate username.
    async fn insert(&self, record: UserRecord) -> Result<(), StoreError>;

    /// Delete a record by username.
    async fn delete(&self, username: &str) -> Result<(), StoreError>;
}
