//! The store surface handed to updaters.

use lectern_core::{ChangeSet, EntityId, Record, Value};
use lectern_parser::{SelectionSet, Variables};
use lectern_query::{resolve_entity, Resolution};
use lectern_store::{RecordStore, Reference, StoreResult};

/// Mutation-scoped access to the record store.
///
/// Every edit goes through the store's own primitives, so the reference
/// index stays in step; the handle only accumulates what changed. It has no
/// network access.
pub struct StoreHandle<'s> {
    store: &'s mut RecordStore,
    changed: ChangeSet,
}

impl<'s> StoreHandle<'s> {
    pub fn new(store: &'s mut RecordStore) -> Self {
        Self {
            store,
            changed: ChangeSet::new(),
        }
    }

    pub fn get(&self, id: &EntityId) -> Option<&Record> {
        self.store.get(id)
    }

    /// Current referrers of `id`.
    pub fn references_to(&self, id: &EntityId) -> Vec<Reference> {
        self.store.references_to(id).cloned().collect()
    }

    /// Resolve a selection rooted at `id` against the current state.
    pub fn read(&self, id: &EntityId, selection: &SelectionSet) -> Resolution {
        resolve_entity(id, selection, &Variables::new(), self.store)
    }

    pub fn set_link(&mut self, id: &EntityId, field: &str, target: EntityId) -> StoreResult<()> {
        let changed = self.store.set_link(id, field, target)?;
        self.changed.extend(changed);
        Ok(())
    }

    pub fn set_links(&mut self, id: &EntityId, field: &str, targets: Vec<EntityId>) -> StoreResult<()> {
        let changed = self.store.set_links(id, field, targets)?;
        self.changed.extend(changed);
        Ok(())
    }

    /// Append `target` to a link list unless it is already there.
    pub fn append_link(&mut self, id: &EntityId, field: &str, target: EntityId) -> StoreResult<()> {
        let mut targets: Vec<EntityId> = self
            .store
            .get(id)
            .and_then(|record| record.get(field))
            .and_then(|value| value.as_link_list())
            .map(<[EntityId]>::to_vec)
            .unwrap_or_default();
        if targets.contains(&target) {
            return Ok(());
        }
        targets.push(target);
        self.set_links(id, field, targets)
    }

    pub fn delete_link(&mut self, id: &EntityId, field: &str, target: &EntityId) -> StoreResult<()> {
        let changed = self.store.delete_link(id, field, target)?;
        self.changed.extend(changed);
        Ok(())
    }

    pub fn set_scalar(&mut self, id: &EntityId, field: &str, value: impl Into<Value>) -> StoreResult<()> {
        let changed = self.store.set_scalar(id, field, value)?;
        self.changed.extend(changed);
        Ok(())
    }

    pub fn invalidate(&mut self, id: &EntityId) -> StoreResult<()> {
        let changed = self.store.invalidate(id)?;
        self.changed.extend(changed);
        Ok(())
    }

    /// Delete a record, cascading through its referrers.
    pub fn delete(&mut self, id: &EntityId) {
        let changed = self.store.delete(id);
        self.changed.extend(changed);
    }

    /// Records changed through this handle so far.
    pub fn changed(&self) -> &ChangeSet {
        &self.changed
    }

    pub fn into_changed(self) -> ChangeSet {
        self.changed
    }
}
