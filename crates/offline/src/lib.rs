//! Offline-first request core for the Olympia mobile client
//!
//! This crate keeps user actions durable across connectivity gaps:
//! mutating requests issued while offline are persisted to a durable
//! queue and replayed in order once the network returns, and read
//! responses are served from a TTL-bounded cache so screens stay usable
//! without a live connection.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod client;
pub mod queue;
pub mod test_support;
pub mod worker;

pub use cache::{CacheError, ResponseCache};
pub use client::{ApiOutcome, CachedResponse, OfflineClient, OfflineError};
pub use queue::{DrainReport, OfflineQueue, PendingRequest, QueueError, QueueItem};
pub use worker::{SyncConfig, SyncWorker};
