//! Reverse-link index for the record store.

use lectern_core::{EntityId, FieldValue};
use std::collections::{BTreeSet, HashMap};

/// One incoming link: `referrer.field` holds the indexed target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    pub referrer: EntityId,
    pub field: String,
}

impl Reference {
    pub fn new(referrer: EntityId, field: impl Into<String>) -> Self {
        Self {
            referrer,
            field: field.into(),
        }
    }
}

/// Reference index: target EntityId -> Set<(referrer, field)>
///
/// A pair appears once per field even when a link list names the same target
/// several times.
#[derive(Debug, Default, Clone)]
pub struct ReferenceIndex {
    index: HashMap<EntityId, BTreeSet<Reference>>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: &EntityId, referrer: &EntityId, field: &str) {
        self.index
            .entry(target.clone())
            .or_default()
            .insert(Reference::new(referrer.clone(), field));
    }

    pub fn remove(&mut self, target: &EntityId, referrer: &EntityId, field: &str) {
        if let Some(set) = self.index.get_mut(target) {
            set.remove(&Reference::new(referrer.clone(), field));
            if set.is_empty() {
                self.index.remove(target);
            }
        }
    }

    /// Move `referrer.field` from the targets of `old` to the targets of `new`.
    pub fn relink(
        &mut self,
        referrer: &EntityId,
        field: &str,
        old: Option<&FieldValue>,
        new: Option<&FieldValue>,
    ) {
        let old_targets: BTreeSet<&EntityId> = old.into_iter().flat_map(FieldValue::targets).collect();
        let new_targets: BTreeSet<&EntityId> = new.into_iter().flat_map(FieldValue::targets).collect();

        for target in old_targets.difference(&new_targets) {
            self.remove(target, referrer, field);
        }
        for target in new_targets.difference(&old_targets) {
            self.insert(target, referrer, field);
        }
    }

    /// Get the references pointing at a target.
    pub fn references_to(&self, target: &EntityId) -> impl Iterator<Item = &Reference> + '_ {
        self.index
            .get(target)
            .into_iter()
            .flat_map(|set| set.iter())
    }

    /// Check if anything links to the target.
    pub fn is_referenced(&self, target: &EntityId) -> bool {
        self.index
            .get(target)
            .map(|set| !set.is_empty())
            .unwrap_or(false)
    }

    /// Number of indexed targets.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.index.clear();
    }

    /// Iterate all (target, reference) pairs.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&EntityId, &Reference)> + '_ {
        self.index
            .iter()
            .flat_map(|(target, set)| set.iter().map(move |r| (target, r)))
    }
}
