//! Network connectivity tracking for Olympia Offline
//!
//! This crate models the device's connectivity state and broadcasts
//! state changes to subscribers such as the offline sync worker.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod monitor;

pub use monitor::{ConnectivityMonitor, NetworkState};
