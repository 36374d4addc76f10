//! API transport for Olympia Offline
//!
//! This crate defines the request/response contract the offline core
//! replays queued operations through: the `Transport` trait, the error
//! taxonomy separating connectivity failures from server rejections, and
//! a reqwest-backed HTTP implementation with bearer-token injection.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod http;

pub use api::{ApiError, HttpMethod, Result, TokenProvider, Transport};
pub use http::{HttpTransport, TransportConfig};
