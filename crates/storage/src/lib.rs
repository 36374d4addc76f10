//! Storage layer for Olympia Offline
//!
//! This crate provides the durable key-value store contract that the
//! offline queue and response cache persist through, plus a sled-backed
//! implementation and an in-memory implementation for tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod store;

pub use memory::MemoryStore;
pub use store::{DurableStore, Result, SledStore, StorageError, StoreConfig};
