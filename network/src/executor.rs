//! Network executor: sequencing, logging and response classification.

use crate::error::{NetworkError, NetworkResult};
use crate::protocol::GraphRequest;
use crate::transport::Transport;
use lectern_parser::{Operation, Variables};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;
use tracing::{info, warn};

/// Sends operations through a transport.
pub struct NetworkExecutor {
    transport: Rc<dyn Transport>,
    sequence: Cell<u64>,
}

impl NetworkExecutor {
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self {
            transport,
            sequence: Cell::new(0),
        }
    }

    /// Number of requests sent so far.
    pub fn sent(&self) -> u64 {
        self.sequence.get()
    }

    /// Execute an operation, returning the response data.
    ///
    /// Server-reported errors become `NetworkError::Graph` carrying any
    /// partial data; a response with neither data nor errors yields null.
    pub async fn execute(&self, operation: &Operation, variables: &Variables) -> NetworkResult<serde_json::Value> {
        let seq = self.sequence.get() + 1;
        self.sequence.set(seq);

        let request = GraphRequest::from_operation(operation, variables);
        let name = operation.name.as_deref().unwrap_or("<anonymous>");
        info!(seq, operation = name, kind = operation.kind.keyword(), "Sending request");

        let started = Instant::now();
        let response = match self.transport.execute(&request).await {
            Ok(response) => response,
            Err(error) => {
                warn!(seq, operation = name, error = %error, "Transport failure");
                return Err(error.into());
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if response.has_errors() {
            warn!(
                seq,
                operation = name,
                errors = response.errors.len(),
                partial = response.data.is_some(),
                elapsed_ms,
                "Server returned errors"
            );
            return Err(NetworkError::Graph {
                errors: response.errors,
                data: response.data,
            });
        }

        info!(seq, operation = name, elapsed_ms, "Received response");
        Ok(response.data.unwrap_or(serde_json::Value::Null))
    }
}
