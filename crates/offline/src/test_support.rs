//! Test transports for exercising queue and façade behavior
//!
//! `FakeTransport` records every call and replays scripted outcomes, so
//! tests can assert exact call counts, ordering, and payloads without a
//! network.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use transport::{HttpMethod, Result, Transport};

/// One recorded transport call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Endpoint the call targeted
    pub endpoint: String,
    /// HTTP method used
    pub method: HttpMethod,
    /// Payload sent, if any
    pub payload: Option<serde_json::Value>,
    /// Headers sent
    pub headers: HashMap<String, String>,
}

/// Scripted transport double.
///
/// Outcomes pushed with `push_outcome` are consumed in order, one per
/// call; once exhausted, every call returns the default outcome
/// (initially a generic success body).
pub struct FakeTransport {
    default: Mutex<Result<serde_json::Value>>,
    scripted: Mutex<VecDeque<Result<serde_json::Value>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeTransport {
    /// Create a transport that succeeds on every call
    pub fn new() -> Self {
        Self {
            default: Mutex::new(Ok(json!({ "success": true }))),
            scripted: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Set the outcome returned when no scripted outcome is pending
    pub fn set_default(&self, outcome: Result<serde_json::Value>) {
        *self.default.lock().unwrap() = outcome;
    }

    /// Script the outcome for the next unconsumed call
    pub fn push_outcome(&self, outcome: Result<serde_json::Value>) {
        self.scripted.lock().unwrap().push_back(outcome);
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn request(
        &self,
        endpoint: &str,
        method: HttpMethod,
        payload: Option<&serde_json::Value>,
        headers: &HashMap<String, String>,
    ) -> Result<serde_json::Value> {
        self.calls.lock().unwrap().push(RecordedCall {
            endpoint: endpoint.to_string(),
            method,
            payload: payload.cloned(),
            headers: headers.clone(),
        });

        if let Some(outcome) = self.scripted.lock().unwrap().pop_front() {
            return outcome;
        }

        self.default.lock().unwrap().clone()
    }
}
