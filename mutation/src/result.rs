//! Mutation result types.

use lectern_core::{ChangeSet, Data};
use lectern_store::StoreError;

/// Outcome of a committed mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationOutcome {
    /// The response data, as the updater saw it.
    pub data: Data,
    /// Union of records changed by normalization and by the updater.
    pub changed: ChangeSet,
    /// Entity-local normalization failures that did not abort the commit.
    pub warnings: Vec<StoreError>,
}

impl MutationOutcome {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
