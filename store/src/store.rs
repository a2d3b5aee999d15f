//! The normalized record store.

use crate::error::{StoreError, StoreResult};
use crate::index::{Reference, ReferenceIndex};
use lectern_core::{ChangeSet, EntityId, FieldValue, Record, Value};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// Flat map of entity identifier to record, plus the reverse-link index.
///
/// Every field write goes through one primitive that updates the reference
/// index in the same step, so `references_to` always agrees with the links
/// actually held by records.
#[derive(Debug, Default)]
pub struct RecordStore {
    pub(crate) records: HashMap<EntityId, Record>,
    pub(crate) refs: ReferenceIndex,
    /// Retain counts for records kept alive outside the root records.
    retained: BTreeMap<EntityId, usize>,
    /// Open transaction, if any.
    journal: Option<Journal>,
}

/// Prior state of every record touched since `begin`.
#[derive(Debug)]
struct Journal {
    /// None marks a record that did not exist yet.
    records: HashMap<EntityId, Option<Record>>,
    retained: BTreeMap<EntityId, usize>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== READS ====================

    /// Get a record by id.
    pub fn get(&self, id: &EntityId) -> Option<&Record> {
        self.records.get(id)
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.records.contains_key(id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate all record ids.
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> + '_ {
        self.records.keys()
    }

    /// Every (referrer, field) pair currently linking to `id`.
    pub fn references_to(&self, id: &EntityId) -> impl Iterator<Item = &Reference> + '_ {
        self.refs.references_to(id)
    }

    /// Generation of a record, if present.
    pub fn generation(&self, id: &EntityId) -> Option<u64> {
        self.records.get(id).map(Record::generation)
    }

    // ==================== EDIT PRIMITIVES ====================

    /// Point a single-link field at `target`.
    pub fn set_link(&mut self, id: &EntityId, field: &str, target: EntityId) -> StoreResult<ChangeSet> {
        self.edit(id, field, FieldValue::Link(target))
    }

    /// Replace a link-list field.
    pub fn set_links(&mut self, id: &EntityId, field: &str, targets: Vec<EntityId>) -> StoreResult<ChangeSet> {
        self.edit(id, field, FieldValue::LinkList(targets))
    }

    /// Set a scalar field.
    pub fn set_scalar(&mut self, id: &EntityId, field: &str, value: impl Into<Value>) -> StoreResult<ChangeSet> {
        self.edit(id, field, FieldValue::Scalar(value.into()))
    }

    /// Remove `target` from a link field.
    ///
    /// A single link pointing at `target` becomes null; a link list drops
    /// every occurrence. An absent field is left alone.
    pub fn delete_link(&mut self, id: &EntityId, field: &str, target: &EntityId) -> StoreResult<ChangeSet> {
        let record = self
            .records
            .get(id)
            .ok_or_else(|| StoreError::RecordNotFound(id.clone()))?;

        let replacement = match record.get(field) {
            None => return Ok(ChangeSet::new()),
            Some(FieldValue::Link(current)) if current == target => FieldValue::Scalar(Value::Null),
            Some(FieldValue::Link(_)) => return Ok(ChangeSet::new()),
            Some(FieldValue::LinkList(targets)) => {
                FieldValue::LinkList(targets.iter().filter(|t| *t != target).cloned().collect())
            }
            // A null single link is still a link slot
            Some(FieldValue::Scalar(Value::Null)) => return Ok(ChangeSet::new()),
            Some(_) => return Err(StoreError::not_a_link(id, field)),
        };

        self.edit(id, field, replacement)
    }

    /// Mark a record stale. Its values stay readable but resolution reports
    /// them missing until fresh data is normalized over it.
    pub fn invalidate(&mut self, id: &EntityId) -> StoreResult<ChangeSet> {
        if !self.records.contains_key(id) {
            return Err(StoreError::RecordNotFound(id.clone()));
        }
        self.touch(id);

        let mut changed = ChangeSet::new();
        if self.records.get_mut(id).is_some_and(Record::invalidate) {
            debug!(id = %id, "Invalidated record");
            changed.insert(id.clone());
        }
        Ok(changed)
    }

    /// Delete a record and cascade through every referrer.
    ///
    /// Referrers holding `id` as a single link get null; link lists drop it.
    /// Deleting an unknown id still clears links to it.
    pub fn delete(&mut self, id: &EntityId) -> ChangeSet {
        let mut changed = ChangeSet::new();
        let references: Vec<Reference> = self.refs.references_to(id).cloned().collect();

        for reference in references {
            if &reference.referrer == id {
                continue;
            }
            match self.unlinked(&reference, id) {
                Some(replacement) => {
                    if self.write_field(&reference.referrer, &reference.field, replacement) {
                        changed.insert(reference.referrer.clone());
                    }
                }
                None => self.repair(&reference, id),
            }
        }

        if self.remove_record(id) {
            changed.insert(id.clone());
        }

        debug!(id = %id, changed = changed.len(), "Deleted record");
        changed
    }

    fn edit(&mut self, id: &EntityId, field: &str, value: FieldValue) -> StoreResult<ChangeSet> {
        if !self.records.contains_key(id) {
            return Err(StoreError::RecordNotFound(id.clone()));
        }
        let mut changed = ChangeSet::new();
        if self.write_field(id, field, value) {
            changed.insert(id.clone());
        }
        Ok(changed)
    }

    /// The value `reference` should hold once `target` is gone, or None when
    /// the referrer no longer links to it.
    fn unlinked(&self, reference: &Reference, target: &EntityId) -> Option<FieldValue> {
        let current = self.records.get(&reference.referrer)?.get(&reference.field)?;
        match current {
            FieldValue::Link(t) if t == target => Some(FieldValue::Scalar(Value::Null)),
            FieldValue::LinkList(ts) if ts.contains(target) => {
                Some(FieldValue::LinkList(ts.iter().filter(|t| *t != target).cloned().collect()))
            }
            _ => None,
        }
    }

    fn repair(&mut self, reference: &Reference, target: &EntityId) {
        let error = StoreError::dangling_reference(&reference.referrer, &reference.field, target);
        warn!(error = %error, "Repairing reference index");
        self.refs.remove(target, &reference.referrer, &reference.field);
    }

    // ==================== CORE PRIMITIVES ====================

    /// Write one field, creating the record if needed. Returns true if it changed.
    pub(crate) fn write_field(&mut self, id: &EntityId, field: &str, value: FieldValue) -> bool {
        self.touch(id);
        let record = self.records.entry(id.clone()).or_default();
        match record.set(field, value) {
            None => false,
            Some(previous) => {
                self.refs.relink(id, field, previous.as_ref(), record.get(field));
                true
            }
        }
    }

    /// Ensure a record exists. Returns true if it was created.
    pub(crate) fn ensure_record(&mut self, id: &EntityId) -> bool {
        self.touch(id);
        if self.records.contains_key(id) {
            return false;
        }
        self.records.insert(id.clone(), Record::new());
        true
    }

    /// Remove a record and its outgoing index entries.
    fn remove_record(&mut self, id: &EntityId) -> bool {
        self.touch(id);
        let Some(record) = self.records.remove(id) else {
            return false;
        };
        for (field, target) in record.links() {
            self.refs.remove(target, id, field);
        }
        self.retained.remove(id);
        true
    }

    /// Journal the current state of `id` the first time it is touched.
    fn touch(&mut self, id: &EntityId) {
        if let Some(journal) = self.journal.as_mut() {
            if !journal.records.contains_key(id) {
                journal.records.insert(id.clone(), self.records.get(id).cloned());
            }
        }
    }

    /// Recompute the index from the records and compare.
    pub fn index_is_consistent(&self) -> bool {
        let mut expected: HashSet<(EntityId, Reference)> = HashSet::new();
        for (id, record) in &self.records {
            for (field, target) in record.links() {
                expected.insert((target.clone(), Reference::new(id.clone(), field)));
            }
        }
        let actual: HashSet<(EntityId, Reference)> = self
            .refs
            .entries()
            .map(|(target, reference)| (target.clone(), reference.clone()))
            .collect();
        expected == actual
    }

    pub(crate) fn rebuild_index(&mut self) {
        self.refs.clear();
        for (id, record) in &self.records {
            for (field, target) in record.links() {
                self.refs.insert(target, id, field);
            }
        }
    }

    // ==================== TRANSACTIONS ====================

    /// Start journaling edits so they can be undone with `rollback`.
    ///
    /// Transactions do not nest; beginning again discards the open journal.
    pub fn begin(&mut self) {
        self.journal = Some(Journal {
            records: HashMap::new(),
            retained: self.retained.clone(),
        });
    }

    /// Keep every edit made since `begin`.
    pub fn commit(&mut self) {
        self.journal = None;
    }

    pub fn in_transaction(&self) -> bool {
        self.journal.is_some()
    }

    /// Undo every edit made since `begin`. Returns the ids that were restored.
    pub fn rollback(&mut self) -> ChangeSet {
        let Some(journal) = self.journal.take() else {
            return ChangeSet::new();
        };

        let mut restored = ChangeSet::new();
        for (id, prior) in journal.records {
            if let Some(current) = self.records.remove(&id) {
                for (field, target) in current.links() {
                    self.refs.remove(target, &id, field);
                }
            }
            if let Some(record) = prior {
                for (field, target) in record.links() {
                    self.refs.insert(target, &id, field);
                }
                self.records.insert(id.clone(), record);
            }
            restored.insert(id);
        }
        self.retained = journal.retained;

        debug!(restored = restored.len(), "Rolled back transaction");
        restored
    }

    // ==================== RETENTION ====================

    /// Keep a record alive across `gc` even when unreachable from the roots.
    pub fn retain(&mut self, id: &EntityId) {
        *self.retained.entry(id.clone()).or_insert(0) += 1;
    }

    /// Drop one retain. Returns false if the id was not retained.
    pub fn release(&mut self, id: &EntityId) -> bool {
        match self.retained.get_mut(id) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.retained.remove(id);
                true
            }
            None => false,
        }
    }

    /// Remove every record unreachable from the root records and retained ids.
    pub fn gc(&mut self) -> ChangeSet {
        let mut reachable: HashSet<EntityId> = HashSet::new();
        let mut queue: VecDeque<EntityId> = VecDeque::new();

        queue.push_back(EntityId::root_query());
        queue.push_back(EntityId::root_mutation());
        queue.extend(self.retained.keys().cloned());

        while let Some(id) = queue.pop_front() {
            if !reachable.insert(id.clone()) {
                continue;
            }
            if let Some(record) = self.records.get(&id) {
                for (_, target) in record.links() {
                    if !reachable.contains(target) {
                        queue.push_back(target.clone());
                    }
                }
            }
        }

        let unreachable: Vec<EntityId> = self
            .records
            .keys()
            .filter(|id| !reachable.contains(*id))
            .cloned()
            .collect();

        let mut removed = ChangeSet::new();
        for id in unreachable {
            if self.remove_record(&id) {
                removed.insert(id);
            }
        }

        debug!(removed = removed.len(), remaining = self.records.len(), "Collected records");
        removed
    }
}
