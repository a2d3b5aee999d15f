//! Cache configuration.

use crate::error::{CacheError, CacheResult};
use lectern_network::HttpTransport;
use lectern_store::DefaultKeying;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Where a one-shot query reads from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchPolicy {
    /// Answer from the store when complete, otherwise fetch.
    #[default]
    CacheFirst,
    /// Always fetch, then answer from the store.
    NetworkOnly,
    /// Never fetch; incomplete results are returned as they are.
    CacheOnly,
}

/// Configuration for a cache instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Graph API endpoint; required for `Cache::from_config`.
    pub endpoint: Option<String>,
    pub bearer_token: Option<String>,
    /// Extra request headers supplied by the auth collaborator.
    pub headers: BTreeMap<String, String>,
    pub request_timeout_ms: u64,
    pub fetch_policy: FetchPolicy,
    /// Payload fields tried in order to key an entity.
    pub key_fields: Vec<String>,
    /// Type names stored as embedded value objects.
    pub embedded_types: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            bearer_token: None,
            headers: BTreeMap::new(),
            request_timeout_ms: 30_000,
            fetch_policy: FetchPolicy::CacheFirst,
            key_fields: vec!["id".to_string(), "uuid".to_string()],
            embedded_types: Vec::new(),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> CacheResult<Self> {
        toml::from_str(source).map_err(|e| CacheError::config(format!("failed to parse config: {e}")))
    }

    /// Load a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| CacheError::config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&contents)
            .map_err(|e| CacheError::config(format!("failed to parse {}: {e}", path.display())))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout: u64) -> Self {
        self.request_timeout_ms = timeout;
        self
    }

    pub fn with_fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.fetch_policy = policy;
        self
    }

    pub fn with_key_fields(mut self, fields: Vec<String>) -> Self {
        self.key_fields = fields;
        self
    }

    pub fn with_embedded_types(mut self, types: Vec<String>) -> Self {
        self.embedded_types = types;
        self
    }

    /// Default keying over the configured key fields and embedded types.
    pub fn keying(&self) -> DefaultKeying {
        DefaultKeying::new()
            .with_key_fields(self.key_fields.iter().cloned())
            .with_embedded_types(self.embedded_types.iter().cloned())
    }

    /// HTTP transport for the configured endpoint.
    pub fn transport(&self) -> CacheResult<HttpTransport> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| CacheError::config("no endpoint configured"))?;

        let mut transport =
            HttpTransport::new(endpoint).with_timeout(Duration::from_millis(self.request_timeout_ms));
        if let Some(token) = &self.bearer_token {
            transport = transport.with_bearer_token(token.clone());
        }
        for (name, value) in &self.headers {
            transport = transport.with_header(name.clone(), value.clone());
        }
        Ok(transport)
    }
}
