//! Mutation builder.

use crate::cache::Cache;
use lectern_core::Data;
use lectern_mutation::{MutationExecutor, MutationOutcome, MutationRequest, MutationResult, StoreHandle};
use lectern_parser::{Operation, Variables};
use lectern_store::StoreResult;

/// A mutation call being assembled. `send` commits it.
pub struct Mutation {
    cache: Cache,
    request: MutationRequest,
}

impl Mutation {
    pub(crate) fn new(cache: Cache, operation: Operation) -> Self {
        Self {
            cache,
            request: MutationRequest::new(operation),
        }
    }

    pub fn variables(mut self, variables: Variables) -> Self {
        self.request = self.request.with_variables(variables);
        self
    }

    /// Extra edits run against the store right after the response is merged.
    pub fn updater<F>(mut self, updater: F) -> Self
    where
        F: FnOnce(&mut StoreHandle<'_>, &Data) -> StoreResult<()> + 'static,
    {
        self.request = self.request.with_updater(updater);
        self
    }

    /// Send the mutation and commit its response on arrival.
    ///
    /// Whatever changed, including partial data accompanying server errors,
    /// is published to views in one batch before this returns.
    pub async fn send(self) -> MutationResult<MutationOutcome> {
        let Mutation { cache, request } = self;
        let shared = &cache.shared;

        let executor = MutationExecutor::new(&shared.network, &shared.store, shared.keying.as_ref());
        let result = executor.execute(request).await;

        let changed = match &result {
            Ok(outcome) => Some(&outcome.changed),
            Err(error) => error.changed(),
        };
        if let Some(changed) = changed {
            cache.publish(changed);
        }
        result
    }
}
