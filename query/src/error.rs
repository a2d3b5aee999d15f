//! Query error types.

use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur before resolution starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("Missing value for required variable ${name}")]
    MissingVariable { name: String },

    #[error("Operation {name} is a mutation and cannot be watched")]
    NotAQuery { name: String },
}

impl QueryError {
    pub fn missing_variable(name: impl Into<String>) -> Self {
        Self::MissingVariable { name: name.into() }
    }

    pub fn not_a_query(name: Option<&str>) -> Self {
        Self::NotAQuery {
            name: name.unwrap_or("<anonymous>").to_string(),
        }
    }
}
