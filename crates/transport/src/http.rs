//! Reqwest-backed HTTP transport

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::api::{ApiError, HttpMethod, Result, TokenProvider, Transport};

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL prepended to every endpoint (e.g. `https://api.example.com/api`)
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl TransportConfig {
    /// Create a configuration for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Error body shape returned by the API on rejection
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
    message: Option<String>,
}

/// HTTP transport over reqwest with bearer-token injection
pub struct HttpTransport {
    client: reqwest::Client,
    config: TransportConfig,
    token_provider: Option<Arc<dyn TokenProvider>>,
}

impl HttpTransport {
    /// Create a transport with the given configuration
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::network(e.to_string()))?;

        Ok(Self { client, config, token_provider: None })
    }

    /// Attach a bearer-token provider
    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url, endpoint)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        endpoint: &str,
        method: HttpMethod,
        payload: Option<&serde_json::Value>,
        headers: &HashMap<String, String>,
    ) -> Result<serde_json::Value> {
        let url = self.url_for(endpoint);
        debug!(%method, %url, "sending request");

        let mut builder = match method {
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        if let Some(provider) = &self.token_provider {
            if let Some(token) = provider.bearer_token().await {
                builder = builder.bearer_auth(token);
            }
        }

        if let Some(body) = payload {
            builder = builder.json(body);
        }

        // Any failure before a response arrives means the server was not
        // reached, which is the retryable class.
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        if !status.is_success() {
            let parsed: Option<ErrorResponse> = serde_json::from_str(&body).ok();
            let (code, message) = match parsed {
                Some(err) => (
                    err.error
                        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Error").to_string()),
                    err.message.unwrap_or_default(),
                ),
                None => (
                    status.canonical_reason().unwrap_or("Error").to_string(),
                    body.clone(),
                ),
            };
            return Err(ApiError::http(status.as_u16(), code, message));
        }

        if body.is_empty() {
            return Ok(serde_json::Value::Null);
        }

        Ok(serde_json::from_str(&body)?)
    }
}
