//! Mutation requests.

use crate::error::MutationResult;
use crate::handle::StoreHandle;
use lectern_core::Data;
use lectern_parser::{parse_operation, Operation, Variables};
use lectern_store::StoreResult;
use std::fmt;

/// Extra graph edits run synchronously after the response is normalized.
pub type Updater = Box<dyn FnOnce(&mut StoreHandle<'_>, &Data) -> StoreResult<()>>;

/// One mutation call: operation, variables and optional updater.
pub struct MutationRequest {
    pub operation: Operation,
    pub variables: Variables,
    pub updater: Option<Updater>,
}

impl MutationRequest {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            variables: Variables::new(),
            updater: None,
        }
    }

    /// Parse document text into a request.
    pub fn parse(source: &str) -> MutationResult<Self> {
        Ok(Self::new(parse_operation(source)?))
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_updater<F>(mut self, updater: F) -> Self
    where
        F: FnOnce(&mut StoreHandle<'_>, &Data) -> StoreResult<()> + 'static,
    {
        self.updater = Some(Box::new(updater));
        self
    }
}

impl fmt::Debug for MutationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationRequest")
            .field("operation", &self.operation.name)
            .field("variables", &self.variables)
            .field("updater", &self.updater.is_some())
            .finish()
    }
}
