//! In-memory durable store for tests
//!
//! Backs the `DurableStore` contract with a HashMap so tests can run
//! without touching disk, and supports failure injection so callers can
//! verify that storage errors surface instead of reading as empty state.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::store::{DurableStore, Result, StorageError};

/// HashMap-backed store with failure injection
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    failing: AtomicBool,
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a backend error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the store holds no keys
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn check_failure(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_failure()?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.check_failure()?;
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check_failure()?;
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.check_failure()?;
        Ok(self
            .entries
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();

        store.set("key", b"value".to_vec()).await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some(b"value".to_vec()));

        store.remove("key").await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.set("key", b"value".to_vec()).await.unwrap();

        store.set_failing(true);
        assert!(matches!(
            store.get("key").await,
            Err(StorageError::Backend(_))
        ));
        assert!(store.set("other", b"x".to_vec()).await.is_err());

        // Recovers once the switch is flipped back
        store.set_failing(false);
        assert_eq!(store.get("key").await.unwrap(), Some(b"value".to_vec()));
    }

    #[tokio::test]
    async fn test_keys_with_prefix() {
        let store = MemoryStore::new();

        store.set("cache:one", b"1".to_vec()).await.unwrap();
        store.set("cache:two", b"2".to_vec()).await.unwrap();
        store.set("other", b"3".to_vec()).await.unwrap();

        let mut keys = store.keys_with_prefix("cache:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["cache:one", "cache:two"]);
    }
}
