//! Connectivity monitor
//!
//! Holds the last reported network state and publishes changes over a
//! broadcast channel. Platform integrations push state into `set_state`
//! (or `set_connected` for boolean reachability callbacks); subscribers
//! detect the offline-to-online edge themselves from consecutive events.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::info;

/// Network connectivity state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NetworkState {
    /// Connected to network
    Online,

    /// Disconnected from network
    Offline,

    /// Network state unknown
    Unknown,
}

impl fmt::Display for NetworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkState::Online => write!(f, "online"),
            NetworkState::Offline => write!(f, "offline"),
            NetworkState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Connectivity state holder with change notifications
pub struct ConnectivityMonitor {
    state: RwLock<NetworkState>,
    tx: broadcast::Sender<NetworkState>,
}

impl ConnectivityMonitor {
    /// Create a monitor with the given initial state
    pub fn new(initial: NetworkState) -> Self {
        let (tx, _rx) = broadcast::channel(16);

        Self { state: RwLock::new(initial), tx }
    }

    /// Get the current network state
    pub fn state(&self) -> NetworkState {
        *self.state.read()
    }

    /// Check whether the device currently reports as online
    pub fn is_online(&self) -> bool {
        self.state() == NetworkState::Online
    }

    /// Report a new network state.
    ///
    /// Repeated reports of the current state are dropped so subscribers
    /// only ever observe transitions.
    pub fn set_state(&self, next: NetworkState) {
        {
            let mut state = self.state.write();
            if *state == next {
                return;
            }
            let previous = *state;
            *state = next;
            info!(from = %previous, to = %next, "network state changed");
        }

        // No receivers is fine; the event is simply dropped.
        let _ = self.tx.send(next);
    }

    /// Report a boolean reachability callback from the platform
    pub fn set_connected(&self, connected: bool) {
        self.set_state(if connected {
            NetworkState::Online
        } else {
            NetworkState::Offline
        });
    }

    /// Subscribe to network state transitions
    pub fn subscribe(&self) -> broadcast::Receiver<NetworkState> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(NetworkState::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_state() {
        let monitor = ConnectivityMonitor::new(NetworkState::Offline);
        assert_eq!(monitor.state(), NetworkState::Offline);
        assert!(!monitor.is_online());
    }

    #[tokio::test]
    async fn test_transitions_are_broadcast() {
        let monitor = ConnectivityMonitor::new(NetworkState::Offline);
        let mut rx = monitor.subscribe();

        monitor.set_state(NetworkState::Online);

        assert_eq!(rx.recv().await.unwrap(), NetworkState::Online);
        assert!(monitor.is_online());
    }

    #[tokio::test]
    async fn test_duplicate_reports_are_dropped() {
        let monitor = ConnectivityMonitor::new(NetworkState::Offline);
        let mut rx = monitor.subscribe();

        monitor.set_state(NetworkState::Offline);
        monitor.set_state(NetworkState::Online);

        // Only the actual transition is observed
        assert_eq!(rx.recv().await.unwrap(), NetworkState::Online);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_set_connected() {
        let monitor = ConnectivityMonitor::default();
        assert_eq!(monitor.state(), NetworkState::Unknown);

        monitor.set_connected(true);
        assert_eq!(monitor.state(), NetworkState::Online);

        monitor.set_connected(false);
        assert_eq!(monitor.state(), NetworkState::Offline);
    }
}
