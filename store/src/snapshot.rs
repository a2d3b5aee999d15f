//! Serializable store snapshots.

use crate::store::RecordStore;
use lectern_core::{EntityId, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Every record of a store, ordered by id. The reference index is derived
/// data and is rebuilt on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub records: BTreeMap<EntityId, Record>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore {
    /// Capture all records.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            records: self
                .records
                .iter()
                .map(|(id, record)| (id.clone(), record.clone()))
                .collect(),
        }
    }

    /// Build a store from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = RecordStore::new();
        store.records = snapshot.records.into_iter().collect();
        store.rebuild_index();
        debug!(records = store.len(), "Restored store from snapshot");
        store
    }
}
