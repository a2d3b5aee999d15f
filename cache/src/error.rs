//! Cache error types.

use lectern_mutation::MutationError;
use lectern_network::NetworkError;
use lectern_parser::ParseError;
use lectern_query::QueryError;
use lectern_store::StoreError;
use lectern_subscription::ViewToken;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced by the cache facade.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown view: {0}")]
    UnknownView(ViewToken),
}

impl CacheError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
