//! Request façade
//!
//! `OfflineClient` is the only surface application code talks to. It
//! wraps a transport call with queueing (`offline_api_call`) or caching
//! (`cached_api_call`) and hides the durable store and connectivity
//! monitor from callers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use connectivity::{ConnectivityMonitor, NetworkState};
use storage::DurableStore;
use transport::{ApiError, HttpMethod, Transport};

use crate::cache::{CacheError, ResponseCache};
use crate::queue::{OfflineQueue, PendingRequest, QueueError};
use crate::worker::{SyncConfig, SyncWorker};

/// Façade error types
#[derive(Debug, Error)]
pub enum OfflineError {
    /// Transport error surfaced unchanged (HTTP rejections land here)
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Offline queue failure
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Response cache failure
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result type for façade operations
pub type Result<T> = std::result::Result<T, OfflineError>;

/// Outcome of a mutating call through the façade.
///
/// Callers must treat `Queued` as pending/unsynced, not as a server
/// acknowledgment.
#[derive(Debug, Clone)]
pub enum ApiOutcome {
    /// The server acknowledged the request; the response is attached
    Completed(serde_json::Value),

    /// The request was durably queued for replay once connectivity returns
    Queued {
        /// Identifier of the queued item
        queue_id: String,
    },
}

impl ApiOutcome {
    /// Check whether the request was queued rather than completed
    pub fn is_queued(&self) -> bool {
        matches!(self, ApiOutcome::Queued { .. })
    }

    /// The queue identifier, if the request was queued
    pub fn queue_id(&self) -> Option<&str> {
        match self {
            ApiOutcome::Queued { queue_id } => Some(queue_id),
            ApiOutcome::Completed(_) => None,
        }
    }
}

/// A read response with its provenance
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// The response payload
    pub data: serde_json::Value,
    /// Whether the payload came from the cache rather than the network
    pub from_cache: bool,
}

/// Entry point wrapping transport calls with queueing and caching
pub struct OfflineClient {
    queue: Arc<OfflineQueue>,
    cache: Arc<ResponseCache>,
    transport: Arc<dyn Transport>,
    monitor: Arc<ConnectivityMonitor>,
    config: SyncConfig,
}

impl OfflineClient {
    /// Create a client wiring the queue and cache to the given store
    pub fn new(
        store: Arc<dyn DurableStore>,
        transport: Arc<dyn Transport>,
        monitor: Arc<ConnectivityMonitor>,
        config: SyncConfig,
    ) -> Self {
        Self {
            queue: Arc::new(OfflineQueue::new(store.clone())),
            cache: Arc::new(ResponseCache::new(store)),
            transport,
            monitor,
            config,
        }
    }

    /// The underlying offline queue (e.g. for pending-count badges)
    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    /// The underlying response cache
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Spawn the background worker that drains the queue on every
    /// offline-to-online transition
    pub fn start_sync_worker(&self) -> SyncWorker {
        SyncWorker::spawn(
            self.queue.clone(),
            self.transport.clone(),
            self.monitor.clone(),
            self.config.drain_on_start,
        )
    }

    /// Perform a mutating call, falling back to the durable queue on
    /// connectivity failure.
    ///
    /// An HTTP rejection from the server propagates unchanged and is
    /// never queued. Once an operation is queued the call cannot fail
    /// except for a durable-store error, in which case durability could
    /// not be guaranteed and the error surfaces.
    pub async fn offline_api_call(
        &self,
        endpoint: &str,
        method: HttpMethod,
        payload: Option<serde_json::Value>,
        headers: HashMap<String, String>,
    ) -> Result<ApiOutcome> {
        if self.monitor.state() != NetworkState::Offline {
            match self
                .transport
                .request(endpoint, method, payload.as_ref(), &headers)
                .await
            {
                Ok(value) => return Ok(ApiOutcome::Completed(value)),
                Err(err) if err.is_network_error() => {
                    debug!(endpoint, error = %err, "transport unreachable, queueing request");
                }
                Err(err) => return Err(err.into()),
            }
        } else {
            debug!(endpoint, "offline, queueing request without a transport attempt");
        }

        let queue_id = self
            .queue
            .enqueue(PendingRequest {
                endpoint: endpoint.to_string(),
                method,
                payload,
                headers,
            })
            .await?;

        Ok(ApiOutcome::Queued { queue_id })
    }

    /// Perform a read through the cache.
    ///
    /// On a fresh hit the fetch is not invoked. On a miss the fetch runs;
    /// a successful result is stored under `key` before returning, and a
    /// failure propagates untouched (no negative caching). `ttl` falls
    /// back to the configured default when `None`.
    pub async fn cached_api_call<F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<CachedResponse>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = transport::Result<serde_json::Value>>,
    {
        if let Some(data) = self.cache.get(key).await? {
            debug!(key, "serving response from cache");
            return Ok(CachedResponse { data, from_cache: true });
        }

        let data = fetch().await?;

        let ttl = ttl.unwrap_or(self.config.default_cache_ttl);
        self.cache.put(key, data.clone(), ttl).await?;

        Ok(CachedResponse { data, from_cache: false })
    }

    /// Drop all queued requests and cached responses. Intended for logout.
    pub async fn reset(&self) -> Result<()> {
        self.queue.clear().await?;
        self.cache.clear().await?;
        Ok(())
    }
}
