//! Transports: how a request reaches the graph API.

use crate::error::TransportError;
use crate::protocol::{GraphRequest, GraphResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Performs one request/response exchange.
///
/// The cache is single-threaded, so transports need not be `Send`.
#[async_trait(?Send)]
pub trait Transport {
    async fn execute(&self, request: &GraphRequest) -> Result<GraphResponse, TransportError>;
}

/// JSON over HTTP POST.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    bearer_token: Option<String>,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            bearer_token: None,
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn execute(&self, request: &GraphRequest) -> Result<GraphResponse, TransportError> {
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(TransportError::request)?;
        let status = response.status();
        debug!(endpoint = %self.endpoint, status = status.as_u16(), "HTTP exchange");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::status(status.as_u16(), body));
        }

        let bytes = response.bytes().await.map_err(TransportError::request)?;
        serde_json::from_slice(&bytes).map_err(TransportError::decode)
    }
}
