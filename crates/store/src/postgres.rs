//! Postgres-backed user store.
//!
//! Uniqueness is delegated to the primary key on `users.username`; a
//! `23505` unique violation on insert is the authoritative duplicate
//! signal, closing the check-then-insert race at the storage layer.

use async_trait::async_trait;
use crumble_auth::SecretHash;
use sqlx::{PgPool, Row};

use crate::{StoreError, UserRecord, UserStore};

/// Schema for the user table. Applied once at startup.
pub const USERS_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    username      TEXT PRIMARY KEY,
    password_hash TEXT NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
)
";

/// User store on a Postgres connection pool.
///
/// The pool is `Send + Sync`; no additional locking is held across calls,
/// so concurrent registrations contend only inside the database.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` on database failure.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(USERS_SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn lookup(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query("SELECT username, password_hash FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        Ok(row.map(|row| UserRecord {
            username: row.get("username"),
            password_hash: SecretHash::from_phc(row.get::<String, _>("password_hash")),
        }))
    }

    async fn insert(&self, record: UserRecord) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (username, password_hash) VALUES ($1, $2)")
            .bind(&record.username)
            .bind(record.password_hash.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::DuplicateUsername
                } else {
                    backend(e)
                }
            })?;
        Ok(())
    }

    async fn delete(&self, username: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Postgres unique constraint violation (SQLSTATE 23505).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(code) = db.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}
