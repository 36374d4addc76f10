//! TTL-bounded response cache
//!
//! Stores previously fetched read responses under a reserved durable-store
//! namespace so screens can render without a live connection. Expiry is
//! checked lazily at read time: an expired entry is purged and reported
//! as a miss, never served.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::debug;

use storage::{DurableStore, StorageError};

/// Namespace prefix reserved for cache entries
const CACHE_PREFIX: &str = "cache:";

/// Cache error types
#[derive(Debug, Error)]
pub enum CacheError {
    /// Durable store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Snapshot of a prior read response
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    data: serde_json::Value,
    stored_at: SystemTime,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: SystemTime) -> bool {
        match now.duration_since(self.stored_at) {
            Ok(age) => age >= self.ttl,
            // Clock moved backwards; treat the entry as still fresh.
            Err(_) => false,
        }
    }
}

/// Keyed, TTL-bound storage of read responses
pub struct ResponseCache {
    store: Arc<dyn DurableStore>,
}

impl ResponseCache {
    /// Create a cache backed by the given durable store
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self { store }
    }

    /// Store a fresh snapshot under `key`, replacing any prior snapshot
    pub async fn put(&self, key: &str, data: serde_json::Value, ttl: Duration) -> Result<()> {
        let entry = CacheEntry { data, stored_at: SystemTime::now(), ttl };
        let bytes = serde_json::to_vec(&entry)?;
        self.store.set(&Self::storage_key(key), bytes).await?;
        Ok(())
    }

    /// Get the cached snapshot for `key` if it is still fresh.
    ///
    /// A stale entry is removed as a side effect and reported as a miss;
    /// stale data is never returned.
    pub async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let storage_key = Self::storage_key(key);

        let bytes = match self.store.get(&storage_key).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes)?;

        if entry.is_expired(SystemTime::now()) {
            debug!(key, "purging stale cache entry");
            self.store.remove(&storage_key).await?;
            return Ok(None);
        }

        Ok(Some(entry.data))
    }

    /// Remove every cache entry, leaving unrelated durable keys untouched
    pub async fn clear(&self) -> Result<usize> {
        let keys = self.store.keys_with_prefix(CACHE_PREFIX).await?;
        let count = keys.len();

        for key in keys {
            self.store.remove(&key).await?;
        }

        debug!(count, "cleared response cache");
        Ok(count)
    }

    fn storage_key(key: &str) -> String {
        format!("{CACHE_PREFIX}{key}")
    }
}
