//! Network error types.

use crate::protocol::GraphError;
use thiserror::Error;

/// Result type for network operations.
pub type NetworkResult<T> = Result<T, NetworkError>;

/// The API could not be reached or did not answer with a graph response.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Undecodable response: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    pub fn request(message: impl ToString) -> Self {
        Self::Request(message.to_string())
    }

    pub fn decode(message: impl ToString) -> Self {
        Self::Decode(message.to_string())
    }
}

/// Failure of one exchange, as seen by the cache.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Structured errors from the server, with any partial data it sent.
    #[error("Server returned {} error(s): {}", .errors.len(), first_message(.errors))]
    Graph {
        errors: Vec<GraphError>,
        data: Option<serde_json::Value>,
    },
}

fn first_message(errors: &[GraphError]) -> &str {
    errors.first().map(|e| e.message.as_str()).unwrap_or("")
}
