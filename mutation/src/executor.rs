//! Mutation executor - sends a mutation and commits its response.
//!
//! Nothing touches the store until the response arrives; the commit then
//! runs in one synchronous step (normalize, then updater). Concurrent
//! mutations therefore commit in response arrival order.

use lectern_core::Data;
use lectern_network::{NetworkError, NetworkExecutor};
use lectern_parser::{Operation, Variables};
use lectern_query::QueryError;
use lectern_store::{Keying, RecordStore};
use std::cell::RefCell;
use tracing::{info, warn};

use crate::error::{MutationError, MutationResult};
use crate::handle::StoreHandle;
use crate::request::{MutationRequest, Updater};
use crate::result::MutationOutcome;

/// Mutation executor.
pub struct MutationExecutor<'c> {
    network: &'c NetworkExecutor,
    store: &'c RefCell<RecordStore>,
    keying: &'c dyn Keying,
}

impl<'c> MutationExecutor<'c> {
    /// Create a new executor.
    pub fn new(network: &'c NetworkExecutor, store: &'c RefCell<RecordStore>, keying: &'c dyn Keying) -> Self {
        Self { network, store, keying }
    }

    /// Execute a mutation request.
    ///
    /// The store is borrowed only after the response has arrived, never
    /// across the network await.
    pub async fn execute(&self, request: MutationRequest) -> MutationResult<MutationOutcome> {
        let MutationRequest {
            operation,
            variables,
            updater,
        } = request;

        if !operation.is_mutation() {
            return Err(MutationError::not_a_mutation(operation.name.as_deref()));
        }
        let variables = operation.with_defaults(&variables);
        if let Some(name) = operation.missing_variables(&variables).next() {
            return Err(QueryError::missing_variable(name).into());
        }

        let response = self.network.execute(&operation, &variables).await;
        self.commit(&operation, &variables, response, updater)
    }

    fn commit(
        &self,
        operation: &Operation,
        variables: &Variables,
        response: Result<serde_json::Value, NetworkError>,
        updater: Option<Updater>,
    ) -> MutationResult<MutationOutcome> {
        let name = operation.name.as_deref().unwrap_or("<anonymous>");

        let data = match response {
            Ok(data) => data,
            Err(NetworkError::Transport(error)) => return Err(error.into()),
            Err(NetworkError::Graph { errors, data }) => {
                // Partial data is confirmed server state; the updater does not run
                let changed = match data {
                    Some(data) if !data.is_null() => {
                        let mut store = self.store.borrow_mut();
                        store.write_operation(operation, variables, &data, self.keying).changed
                    }
                    _ => Default::default(),
                };
                warn!(
                    operation = name,
                    errors = errors.len(),
                    changed = changed.len(),
                    "Mutation returned errors"
                );
                return Err(MutationError::Graph { errors, changed });
            }
        };

        let mut store = self.store.borrow_mut();
        store.begin();
        let normalized = store.write_operation(operation, variables, &data, self.keying);
        let view = Data::from_json(&data);

        let mut handle = StoreHandle::new(&mut store);
        let updated = match updater {
            Some(updater) => updater(&mut handle, &view),
            None => Ok(()),
        };
        let mut changed = normalized.changed;
        changed.extend(handle.into_changed());

        // The response and the updater's edits land together or not at all
        if let Err(source) = updated {
            let restored = store.rollback();
            warn!(operation = name, error = %source, restored = restored.len(), "Updater failed, rolled back");
            return Err(MutationError::Updater { source });
        }
        store.commit();

        info!(
            operation = name,
            changed = changed.len(),
            warnings = normalized.errors.len(),
            "Committed mutation"
        );
        Ok(MutationOutcome {
            data: view,
            changed,
            warnings: normalized.errors,
        })
    }
}
