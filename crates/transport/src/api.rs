//! Transport contract and error taxonomy
//!
//! The error split matters more than the transport itself: a `Network`
//! error means the server was never reached and the operation is safe to
//! queue and replay; an `Http` error means the server saw the request and
//! rejected it, so replaying verbatim can never succeed. The offline core
//! relies on this distinction to decide what to queue and what to drop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Transport error taxonomy
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure: the server was not reached. Retryable.
    #[error("Network error: {0}")]
    Network(String),

    /// The server was reached and rejected the request. Terminal.
    #[error("HTTP {status} {code}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Error code from the response body (or status text)
        code: String,
        /// Human-readable error message
        message: String,
    },

    /// Request or response body could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network(message.into())
    }

    /// Create an HTTP error
    pub fn http(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Http {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Check if this is a connectivity failure that is safe to retry.
    ///
    /// Only `Network` qualifies: an `Http` rejection reached the server
    /// and must never be replayed from the offline queue.
    pub fn is_network_error(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}

/// HTTP method for mutating requests.
///
/// Reads never pass through the offline queue, so only the mutating
/// verbs are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    /// POST request
    Post,
    /// PUT request
    Put,
    /// DELETE request
    Delete,
}

impl HttpMethod {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request/response transport.
///
/// Implementations classify every failure as either `ApiError::Network`
/// or `ApiError::Http`; the offline façade and queue drain depend on that
/// classification being strict.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request and return the response body as JSON
    async fn request(
        &self,
        endpoint: &str,
        method: HttpMethod,
        payload: Option<&serde_json::Value>,
        headers: &HashMap<String, String>,
    ) -> Result<serde_json::Value>;
}

/// Opaque bearer-token source injected into outgoing requests.
///
/// Session management lives elsewhere; the transport only asks for the
/// current token, if any.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// The current bearer token, or `None` when unauthenticated
    async fn bearer_token(&self) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_is_retryable() {
        let err = ApiError::network("connection refused");
        assert!(err.is_network_error());
    }

    #[test]
    fn test_http_error_is_terminal() {
        let err = ApiError::http(422, "ValidationError", "days must be positive");
        assert!(!err.is_network_error());
        assert!(err.to_string().contains("422"));
    }

    #[test]
    fn test_serialization_error_is_not_retryable() {
        let err: ApiError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(!err.is_network_error());
    }

    #[test]
    fn test_method_as_str() {
        assert_eq!(HttpMethod::Post.as_str(), "POST");
        assert_eq!(HttpMethod::Put.as_str(), "PUT");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }

    #[test]
    fn test_method_serde_round_trip() {
        let json = serde_json::to_string(&HttpMethod::Delete).unwrap();
        let method: HttpMethod = serde_json::from_str(&json).unwrap();
        assert_eq!(method, HttpMethod::Delete);
    }
}
