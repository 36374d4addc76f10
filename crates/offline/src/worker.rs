//! Background sync worker
//!
//! Watches connectivity transitions and drains the offline queue once
//! per offline-to-online edge. Drains are edge-triggered: staying online
//! never re-triggers one, and enqueueing never triggers one. Whether a
//! drain also runs at startup when already online is an explicit config
//! choice (`drain_on_start`, off by default to match the historical
//! client behavior).

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use connectivity::{ConnectivityMonitor, NetworkState};
use transport::Transport;

use crate::queue::OfflineQueue;

/// Sync behavior configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Drain once at worker startup if currently online
    pub drain_on_start: bool,

    /// TTL applied by `cached_api_call` when the caller passes none
    pub default_cache_ttl: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            drain_on_start: false,
            default_cache_ttl: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl SyncConfig {
    /// Enable or disable the startup drain
    pub fn drain_on_start(mut self, enabled: bool) -> Self {
        self.drain_on_start = enabled;
        self
    }

    /// Set the default cache TTL
    pub fn default_cache_ttl(mut self, ttl: Duration) -> Self {
        self.default_cache_ttl = ttl;
        self
    }
}

/// Handle to the background drain task. Aborted on drop.
pub struct SyncWorker {
    handle: JoinHandle<()>,
}

impl SyncWorker {
    /// Spawn the worker.
    ///
    /// The subscription and the state snapshot are taken before the task
    /// starts, so every transition after this call returns is observed.
    pub fn spawn(
        queue: Arc<OfflineQueue>,
        transport: Arc<dyn Transport>,
        monitor: Arc<ConnectivityMonitor>,
        drain_on_start: bool,
    ) -> Self {
        let rx = monitor.subscribe();
        let initial = monitor.state();

        let handle = tokio::spawn(async move {
            let mut rx = rx;
            let mut previous = initial;

            if drain_on_start && previous == NetworkState::Online {
                info!("online at startup, draining offline queue");
                drain(&queue, transport.as_ref()).await;
            }

            loop {
                match rx.recv().await {
                    Ok(state) => {
                        let was_offline = previous == NetworkState::Offline;
                        previous = state;

                        if was_offline && state == NetworkState::Online {
                            info!("connectivity restored, draining offline queue");
                            drain(&queue, transport.as_ref()).await;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "connectivity events lagged, resyncing state");
                        previous = monitor.state();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self { handle }
    }

    /// Stop the worker
    pub fn shutdown(&self) {
        self.handle.abort();
    }

    /// Check whether the worker task has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn drain(queue: &OfflineQueue, transport: &dyn Transport) {
    if let Err(err) = queue.drain(transport).await {
        error!(error = %err, "offline queue drain failed");
    }
}
