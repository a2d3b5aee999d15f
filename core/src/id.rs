//! Identity types for cached entities.
//!
//! Identifiers are strings derived from an entity's type name and natural key
//! by the keying function. They are:
//! - Unique per distinct entity
//! - Stable across repeated fetches of the same entity
//! - Opaque to views

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of the record holding top-level query fields.
pub const ROOT_QUERY: &str = "ROOT_QUERY";

/// Identifier of the record holding top-level mutation fields.
pub const ROOT_MUTATION: &str = "ROOT_MUTATION";

/// Stable key naming one logical domain object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new EntityId from a raw key.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The root query record.
    pub fn root_query() -> Self {
        Self::new(ROOT_QUERY)
    }

    /// The root mutation record.
    pub fn root_mutation() -> Self {
        Self::new(ROOT_MUTATION)
    }

    /// Get the raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the operation root records.
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_QUERY || self.0 == ROOT_MUTATION
    }

    /// Synthetic identifier for an embedded object stored under `field` of this record.
    pub fn child(&self, field: &str) -> Self {
        Self(format!("{}.{}", self.0, field))
    }

    /// Synthetic identifier for the `index`-th embedded object of a list field.
    pub fn child_at(&self, field: &str, index: usize) -> Self {
        Self(format!("{}.{}.{}", self.0, field, index))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Set of identifiers touched by one store mutation.
///
/// Ordered so that notification and logging are deterministic.
pub type ChangeSet = BTreeSet<EntityId>;
