//! Mutation error types.

use lectern_core::ChangeSet;
use lectern_network::{GraphError, TransportError};
use lectern_parser::ParseError;
use lectern_query::QueryError;
use lectern_store::StoreError;
use thiserror::Error;

/// Result type for mutation operations.
pub type MutationResult<T> = Result<T, MutationError>;

/// Errors that can occur during mutation execution.
#[derive(Debug, Error)]
pub enum MutationError {
    /// The request never produced a response. The store is untouched.
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The server reported errors. Partial data, if any, was normalized.
    #[error("Server returned {} error(s): {}", .errors.len(), first_message(.errors))]
    Graph {
        errors: Vec<GraphError>,
        changed: ChangeSet,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Operation {name} is not a mutation")]
    NotAMutation { name: String },

    /// The updater returned an error. The response and every edit were rolled back.
    #[error("Updater failed: {source}")]
    Updater { source: StoreError },
}

impl MutationError {
    pub fn not_a_mutation(name: Option<&str>) -> Self {
        Self::NotAMutation {
            name: name.unwrap_or("<anonymous>").to_string(),
        }
    }

    /// Records changed before the failure, which still need notifying.
    pub fn changed(&self) -> Option<&ChangeSet> {
        match self {
            MutationError::Graph { changed, .. } => Some(changed),
            _ => None,
        }
    }
}

fn first_message(errors: &[GraphError]) -> &str {
    errors.first().map(|e| e.message.as_str()).unwrap_or("")
}
