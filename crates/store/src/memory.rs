//! In-memory user store.
//!
//! The dev/test adapter. Insert atomicity comes from holding the map lock
//! across the occupancy check and the write.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{StoreError, UserRecord, UserStore};

/// Process-local user store backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records (test helper).
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.lock().expect("user map lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn lookup(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.lock().expect("user map lock poisoned");
        Ok(users.get(username).cloned())
    }

    async fn insert(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.lock().expect("user map lock poisoned");
        match users.entry(record.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateUsername),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn delete(&self, username: &str) -> Result<(), StoreError> {
        let mut users = self.users.lock().expect("user map lock poisoned");
        match users.remove(username) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crumble_auth::SecretHash;

    use super::*;

    fn record(username: &str) -> UserRecord {
        UserRecord::new(username, SecretHash::from_phc("$argon2id$test"))
    }

    #[tokio::test]
    async fn insert_then_lookup() {
        let store = InMemoryUserStore::new();
        store.insert(record("alice_x")).await.unwrap();

        let found = store.lookup("alice_x").await.unwrap().unwrap();
        assert_eq!(found.username, "alice_x");
        assert!(store.lookup("bob_y").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let store = InMemoryUserStore::new();
        store.insert(record("alice_x")).await.unwrap();
        assert!(store.lookup("ALICE_X").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_insert_rejected() {
        let store = InMemoryUserStore::new();
        store.insert(record("alice_x")).await.unwrap();

        let err = store.insert(record("alice_x")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_inserts_admit_exactly_one() {
        let store = Arc::new(InMemoryUserStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.insert(record("alice_x")).await })
            })
            .collect();

        let mut ok = 0;
        let mut dup = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(StoreError::DuplicateUsername) => dup += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(dup, 15);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = InMemoryUserStore::new();
        store.insert(record("alice_x")).await.unwrap();

        store.delete("alice_x").await.unwrap();
        assert!(store.lookup("alice_x").await.unwrap().is_none());
        assert!(matches!(
            store.delete("alice_x").await.unwrap_err(),
            StoreError::NotFound
        ));
    }
}
