//! Record structures for the normalized cache.
//!
//! A record is the flat snapshot of one entity: every nested entity it refers
//! to is replaced by a link carrying that entity's identifier.

use crate::{EntityId, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The value of one record field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// A scalar (a null link is stored as `Scalar(Value::Null)`).
    Scalar(Value),
    /// An ordered list of scalars.
    ScalarList(Vec<Value>),
    /// A single link to another record.
    Link(EntityId),
    /// An ordered list of links.
    LinkList(Vec<EntityId>),
}

impl FieldValue {
    /// Returns true if this field holds one or more links.
    pub fn is_link(&self) -> bool {
        matches!(self, FieldValue::Link(_) | FieldValue::LinkList(_))
    }

    /// Get the scalar if this is a Scalar field.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            FieldValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Get the target if this is a single Link field.
    pub fn as_link(&self) -> Option<&EntityId> {
        match self {
            FieldValue::Link(id) => Some(id),
            _ => None,
        }
    }

    /// Get the targets if this is a LinkList field.
    pub fn as_link_list(&self) -> Option<&[EntityId]> {
        match self {
            FieldValue::LinkList(ids) => Some(ids),
            _ => None,
        }
    }

    /// All link targets held by this field, in order.
    pub fn targets(&self) -> impl Iterator<Item = &EntityId> + '_ {
        let slice: &[EntityId] = match self {
            FieldValue::Link(id) => std::slice::from_ref(id),
            FieldValue::LinkList(ids) => ids,
            _ => &[],
        };
        slice.iter()
    }

    /// Returns true if this field links to `target`.
    pub fn links_to(&self, target: &EntityId) -> bool {
        self.targets().any(|t| t == target)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<EntityId> for FieldValue {
    fn from(id: EntityId) -> Self {
        FieldValue::Link(id)
    }
}

impl From<Vec<EntityId>> for FieldValue {
    fn from(ids: Vec<EntityId>) -> Self {
        FieldValue::LinkList(ids)
    }
}

/// Flat field/link snapshot of one entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Field values keyed by storage key.
    fields: BTreeMap<String, FieldValue>,
    /// Incremented on every change.
    generation: u64,
    /// Set by `invalidate`; cleared when fresh data is merged.
    invalidated: bool,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field value by storage key.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Returns true if the field is known.
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterate all fields in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of known fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is known.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true if the record was invalidated and not refreshed since.
    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    /// The `__typename` field, if known.
    pub fn typename(&self) -> Option<&str> {
        self.get("__typename")
            .and_then(FieldValue::as_scalar)
            .and_then(Value::as_str)
    }

    /// Set a field, returning the previous value when it actually changed.
    ///
    /// Writing an identical value is a no-op and leaves the generation untouched.
    pub fn set(&mut self, field: &str, value: FieldValue) -> Option<Option<FieldValue>> {
        if self.fields.get(field) == Some(&value) {
            return None;
        }
        let previous = self.fields.insert(field.to_string(), value);
        self.generation += 1;
        Some(previous)
    }

    /// Remove a field.
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        let result = self.fields.remove(field);
        if result.is_some() {
            self.generation += 1;
        }
        result
    }

    /// Mark stale. Returns false if it already was.
    pub fn invalidate(&mut self) -> bool {
        if self.invalidated {
            return false;
        }
        self.invalidated = true;
        self.generation += 1;
        true
    }

    /// Clear the stale mark. Returns true if it was set.
    pub fn revalidate(&mut self) -> bool {
        if !self.invalidated {
            return false;
        }
        self.invalidated = false;
        self.generation += 1;
        true
    }

    /// All (field, target) link pairs held by this record.
    pub fn links(&self) -> impl Iterator<Item = (&str, &EntityId)> + '_ {
        self.fields
            .iter()
            .flat_map(|(name, value)| value.targets().map(move |t| (name.as_str(), t)))
    }
}
