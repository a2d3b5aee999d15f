//! Resolution results.

use lectern_core::{ChangeSet, Data, EntityId};
use lectern_store::StoreError;

/// A field the store could not answer (absent, or held by an invalidated record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    pub entity: EntityId,
    /// Storage key of the field.
    pub field: String,
    /// Response path, e.g. `course.sections.0.title`.
    pub path: String,
}

/// Data for one query shape plus what it read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolution {
    pub data: Data,
    /// Every record visited, including link targets absent from the store.
    pub dependencies: ChangeSet,
    pub missing_fields: Vec<MissingField>,
    /// Entities from the fetched response that could not be stored, such as
    /// objects the keying function could not identify. Empty for cache reads.
    pub warnings: Vec<StoreError>,
}

impl Resolution {
    /// Returns true if every selected field was answered.
    pub fn is_complete(&self) -> bool {
        self.missing_fields.is_empty()
    }

    /// Returns true if the response behind this resolution stored cleanly.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Check if the resolution read a record.
    pub fn depends_on(&self, id: &EntityId) -> bool {
        self.dependencies.contains(id)
    }
}
