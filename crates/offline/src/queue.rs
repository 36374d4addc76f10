//! Durable offline request queue
//!
//! Mutating requests that cannot reach the server are appended to a
//! single ordered sequence persisted under one durable-store key.
//! Insertion order is retry order. All read-modify-write cycles on the
//! sequence go through one async mutex, so an enqueue can never
//! interleave with a drain and lose items.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use storage::{DurableStore, StorageError};
use transport::{ApiError, HttpMethod, Transport};

/// Durable-store key holding the serialized queue sequence
const QUEUE_KEY: &str = "offline:queue";

/// Queue error types
#[derive(Debug, Error)]
pub enum QueueError {
    /// Durable store failure. Deliberately distinct from an empty queue:
    /// "could not read" must never be reported as "no items".
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, QueueError>;

/// A mutating request waiting to be enqueued
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// API endpoint path (e.g. `/leaves`)
    pub endpoint: String,
    /// HTTP method
    pub method: HttpMethod,
    /// JSON request body, if any
    pub payload: Option<serde_json::Value>,
    /// Request headers to replay verbatim
    pub headers: HashMap<String, String>,
}

/// Durable record of one pending mutating operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    /// Unique identifier, generated at enqueue time
    pub id: String,
    /// When the item was enqueued
    pub created_at: SystemTime,
    /// API endpoint path
    pub endpoint: String,
    /// HTTP method
    pub method: HttpMethod,
    /// JSON request body, if any
    pub payload: Option<serde_json::Value>,
    /// Request headers to replay verbatim
    pub headers: HashMap<String, String>,
}

/// Outcome of one drain pass
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Number of items attempted (each exactly once)
    pub attempted: usize,
    /// Identifiers of items confirmed by the server and removed
    pub succeeded: Vec<String>,
    /// Items the server rejected. These are removed from the queue and
    /// surfaced once here; replaying them verbatim can never succeed.
    pub rejected: Vec<(QueueItem, ApiError)>,
    /// Number of items retained for the next drain (connectivity failures)
    pub retained: usize,
}

impl DrainReport {
    /// Check whether this pass left the queue empty
    pub fn is_fully_drained(&self) -> bool {
        self.retained == 0
    }
}

/// Durable FIFO of pending mutating requests
pub struct OfflineQueue {
    store: Arc<dyn DurableStore>,
    // Serializes every load-modify-persist cycle; held across the full
    // drain pass so enqueues cannot race the remainder write.
    write_lock: Mutex<()>,
}

impl OfflineQueue {
    /// Create a queue backed by the given durable store
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self { store, write_lock: Mutex::new(()) }
    }

    /// Append a request to the queue and return its identifier.
    ///
    /// A durable-store read failure propagates to the caller; it is not
    /// treated as an empty queue.
    pub async fn enqueue(&self, request: PendingRequest) -> Result<String> {
        let _guard = self.write_lock.lock().await;

        let mut items = self.load().await?;

        let item = QueueItem {
            id: Uuid::new_v4().to_string(),
            created_at: SystemTime::now(),
            endpoint: request.endpoint,
            method: request.method,
            payload: request.payload,
            headers: request.headers,
        };
        let id = item.id.clone();

        debug!(queue_id = %id, endpoint = %item.endpoint, method = %item.method, "queueing offline request");

        items.push(item);
        self.persist(&items).await?;

        Ok(id)
    }

    /// Attempt every queued item exactly once, in enqueue order.
    ///
    /// Successful items are removed. Items failing with a connectivity
    /// error are retained in their original relative order for the next
    /// drain. Items the server rejected are removed and reported in the
    /// returned [`DrainReport`]; they are never retried.
    pub async fn drain(&self, transport: &dyn Transport) -> Result<DrainReport> {
        let _guard = self.write_lock.lock().await;

        let items = self.load().await?;
        let mut report = DrainReport::default();

        if items.is_empty() {
            return Ok(report);
        }

        info!(pending = items.len(), "draining offline queue");

        let mut retained = Vec::new();

        for item in items {
            report.attempted += 1;

            let outcome = transport
                .request(
                    &item.endpoint,
                    item.method,
                    item.payload.as_ref(),
                    &item.headers,
                )
                .await;

            match outcome {
                Ok(_) => {
                    debug!(queue_id = %item.id, endpoint = %item.endpoint, "queued request replayed");
                    report.succeeded.push(item.id);
                }
                Err(err) if err.is_network_error() => {
                    debug!(queue_id = %item.id, error = %err, "still unreachable, keeping item queued");
                    retained.push(item);
                }
                Err(err) => {
                    warn!(queue_id = %item.id, error = %err, "server rejected queued request, dropping it");
                    report.rejected.push((item, err));
                }
            }
        }

        report.retained = retained.len();
        self.persist(&retained).await?;

        info!(
            succeeded = report.succeeded.len(),
            rejected = report.rejected.len(),
            retained = report.retained,
            "offline queue drain complete"
        );

        Ok(report)
    }

    /// Current number of pending items (informational, e.g. UI badges)
    pub async fn len(&self) -> Result<usize> {
        Ok(self.load().await?.len())
    }

    /// Check whether no items are pending
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Unconditionally empty the queue. Intended for logout/reset.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.persist(&[]).await
    }

    /// Snapshot of the pending items, in retry order
    pub async fn items(&self) -> Result<Vec<QueueItem>> {
        self.load().await
    }

    async fn load(&self) -> Result<Vec<QueueItem>> {
        match self.store.get(QUEUE_KEY).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn persist(&self, items: &[QueueItem]) -> Result<()> {
        let bytes = serde_json::to_vec(items)?;
        self.store.set(QUEUE_KEY, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeTransport;
    use serde_json::json;
    use storage::MemoryStore;

    fn leave_request(days: u32) -> PendingRequest {
        PendingRequest {
            endpoint: "/leaves".to_string(),
            method: HttpMethod::Post,
            payload: Some(json!({ "employee_id": "E1", "days": days })),
            headers: HashMap::new(),
        }
    }

    fn queue() -> (Arc<MemoryStore>, OfflineQueue) {
        let store = Arc::new(MemoryStore::new());
        let queue = OfflineQueue::new(store.clone());
        (store, queue)
    }

    #[tokio::test]
    async fn test_enqueue_returns_id_and_grows_queue() {
        let (_store, queue) = queue();

        let id = queue.enqueue(leave_request(2)).await.unwrap();
        assert!(!id.is_empty());
        assert_eq!(queue.len().await.unwrap(), 1);

        let other = queue.enqueue(leave_request(3)).await.unwrap();
        assert_ne!(id, other);
        assert_eq!(queue.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_enqueue_propagates_storage_failure() {
        let (store, queue) = queue();
        queue.enqueue(leave_request(1)).await.unwrap();

        store.set_failing(true);
        let result = queue.enqueue(leave_request(2)).await;
        assert!(matches!(result, Err(QueueError::Storage(_))));

        // The existing item survived the failed enqueue
        store.set_failing(false);
        assert_eq!(queue.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_len_propagates_storage_failure() {
        let (store, queue) = queue();
        store.set_failing(true);

        // A read failure must not be reported as an empty queue
        assert!(queue.len().await.is_err());
    }

    #[tokio::test]
    async fn test_drain_success_removes_items() {
        let (_store, queue) = queue();
        let transport = FakeTransport::new();

        queue.enqueue(leave_request(1)).await.unwrap();
        queue.enqueue(leave_request(2)).await.unwrap();

        let report = queue.drain(&transport).await.unwrap();

        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded.len(), 2);
        assert!(report.is_fully_drained());
        assert_eq!(queue.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_drain_attempts_each_item_exactly_once() {
        let (_store, queue) = queue();
        let transport = FakeTransport::new();
        transport.set_default(Err(ApiError::network("unreachable")));

        queue.enqueue(leave_request(1)).await.unwrap();
        queue.enqueue(leave_request(2)).await.unwrap();

        let report = queue.drain(&transport).await.unwrap();

        // One pass: each failed item was tried once, not until empty
        assert_eq!(report.attempted, 2);
        assert_eq!(transport.call_count(), 2);
        assert_eq!(queue.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_drain_preserves_order_of_retained_items() {
        let (_store, queue) = queue();
        let transport = FakeTransport::new();
        transport.set_default(Err(ApiError::network("unreachable")));

        let a = queue.enqueue(leave_request(1)).await.unwrap();
        let b = queue.enqueue(leave_request(2)).await.unwrap();

        queue.drain(&transport).await.unwrap();

        let remaining: Vec<String> = queue
            .items()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(remaining, vec![a, b]);
    }

    #[tokio::test]
    async fn test_drain_replays_payload_verbatim() {
        let (_store, queue) = queue();
        let transport = FakeTransport::new();

        queue.enqueue(leave_request(2)).await.unwrap();
        queue.drain(&transport).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].endpoint, "/leaves");
        assert_eq!(calls[0].method, HttpMethod::Post);
        assert_eq!(
            calls[0].payload,
            Some(json!({ "employee_id": "E1", "days": 2 }))
        );
    }

    #[tokio::test]
    async fn test_drain_mixed_outcomes() {
        let (_store, queue) = queue();
        let transport = FakeTransport::new();

        let a = queue.enqueue(leave_request(1)).await.unwrap();
        let b = queue.enqueue(leave_request(2)).await.unwrap();
        let c = queue.enqueue(leave_request(3)).await.unwrap();

        transport.push_outcome(Ok(json!({ "success": true })));
        transport.push_outcome(Err(ApiError::network("unreachable")));
        transport.push_outcome(Err(ApiError::http(422, "ValidationError", "bad days")));

        let report = queue.drain(&transport).await.unwrap();

        assert_eq!(report.succeeded, vec![a]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0.id, c);
        assert_eq!(report.retained, 1);

        // Only the connectivity failure is still pending
        let remaining: Vec<String> = queue
            .items()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(remaining, vec![b]);
    }

    #[tokio::test]
    async fn test_rejected_item_is_not_retried_on_next_drain() {
        let (_store, queue) = queue();
        let transport = FakeTransport::new();
        transport.push_outcome(Err(ApiError::http(400, "BadRequest", "invalid")));

        queue.enqueue(leave_request(1)).await.unwrap();

        let report = queue.drain(&transport).await.unwrap();
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(queue.len().await.unwrap(), 0);

        let report = queue.drain(&transport).await.unwrap();
        assert_eq!(report.attempted, 0);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_drain_empty_queue_is_noop() {
        let (_store, queue) = queue();
        let transport = FakeTransport::new();

        let report = queue.drain(&transport).await.unwrap();
        assert_eq!(report.attempted, 0);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let (_store, queue) = queue();

        queue.enqueue(leave_request(1)).await.unwrap();
        queue.enqueue(leave_request(2)).await.unwrap();

        queue.clear().await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_size_accounting_across_adds_and_drains() {
        let (_store, queue) = queue();
        let transport = FakeTransport::new();

        for days in 1..=4 {
            queue.enqueue(leave_request(days)).await.unwrap();
        }
        assert_eq!(queue.len().await.unwrap(), 4);

        // Two succeed, two stay queued
        transport.push_outcome(Ok(json!({})));
        transport.push_outcome(Err(ApiError::network("down")));
        transport.push_outcome(Ok(json!({})));
        transport.push_outcome(Err(ApiError::network("down")));

        let report = queue.drain(&transport).await.unwrap();
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(queue.len().await.unwrap(), 4 - report.succeeded.len());
    }
}
