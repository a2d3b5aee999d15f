//! Query execution.

use indexmap::IndexMap;
use lectern_core::{ChangeSet, Data, EntityId, FieldValue, Record, Value};
use lectern_parser::{Field, Operation, SelectionSet, Variables};
use lectern_store::RecordStore;
use tracing::debug;

use crate::resolution::{MissingField, Resolution};
use crate::{QueryError, QueryResult};

/// Resolve a whole operation from its root record.
pub fn resolve(operation: &Operation, variables: &Variables, store: &RecordStore) -> QueryResult<Resolution> {
    QueryExecutor::new(store).resolve(operation, variables)
}

/// Resolve a selection rooted at any record.
pub fn resolve_entity(
    id: &EntityId,
    selection: &SelectionSet,
    variables: &Variables,
    store: &RecordStore,
) -> Resolution {
    QueryExecutor::new(store).resolve_entity(id, selection, variables)
}

/// Query executor.
pub struct QueryExecutor<'s> {
    store: &'s RecordStore,
}

impl<'s> QueryExecutor<'s> {
    /// Create a new executor.
    pub fn new(store: &'s RecordStore) -> Self {
        Self { store }
    }

    /// Resolve an operation. Declared defaults are applied first.
    pub fn resolve(&self, operation: &Operation, variables: &Variables) -> QueryResult<Resolution> {
        let variables = operation.with_defaults(variables);
        if let Some(name) = operation.missing_variables(&variables).next() {
            return Err(QueryError::missing_variable(name));
        }

        let root = if operation.is_mutation() {
            EntityId::root_mutation()
        } else {
            EntityId::root_query()
        };
        let resolution = self.resolve_entity(&root, &operation.selection, &variables);

        debug!(
            operation = operation.name.as_deref().unwrap_or("<anonymous>"),
            dependencies = resolution.dependencies.len(),
            missing = resolution.missing_fields.len(),
            "Resolved operation"
        );
        Ok(resolution)
    }

    /// Resolve a selection rooted at `id`.
    pub fn resolve_entity(&self, id: &EntityId, selection: &SelectionSet, variables: &Variables) -> Resolution {
        let mut walk = Walk {
            store: self.store,
            variables,
            dependencies: ChangeSet::new(),
            missing: Vec::new(),
        };
        let data = walk.object(id, selection, "");

        Resolution {
            data,
            dependencies: walk.dependencies,
            missing_fields: walk.missing,
            warnings: Vec::new(),
        }
    }
}

// ==================== WALK STATE ====================

struct Walk<'a> {
    store: &'a RecordStore,
    variables: &'a Variables,
    dependencies: ChangeSet,
    missing: Vec<MissingField>,
}

impl<'a> Walk<'a> {
    fn miss(&mut self, entity: &EntityId, field: String, path: String) {
        self.missing.push(MissingField {
            entity: entity.clone(),
            field,
            path,
        });
    }

    /// Resolve the selection over one record, in document order.
    fn object(&mut self, id: &EntityId, selection: &SelectionSet, path: &str) -> Data {
        self.dependencies.insert(id.clone());
        let store = self.store;
        let variables = self.variables;

        let Some(record) = store.get(id) else {
            for field in selection.included(variables) {
                self.miss(id, field.storage_key(variables), join(path, field.response_key()));
            }
            return Data::Null;
        };

        let mut object = IndexMap::new();
        for field in selection.included(variables) {
            let storage_key = field.storage_key(variables);
            let field_path = join(path, field.response_key());
            let value = self.field(id, record, field, &storage_key, &field_path);
            object.insert(field.response_key().to_string(), value);
        }
        Data::Object(object)
    }

    fn field(&mut self, id: &EntityId, record: &Record, field: &Field, storage_key: &str, path: &str) -> Data {
        // Stale values are still handed out, but the caller learns to refetch
        if record.is_invalidated() {
            self.miss(id, storage_key.to_string(), path.to_string());
        }

        let value = match (record.get(storage_key), &field.selection) {
            (Some(FieldValue::Scalar(value)), None) => Some(Data::scalar(value.clone())),
            (Some(FieldValue::ScalarList(values)), None) => {
                Some(Data::List(values.iter().cloned().map(Data::scalar).collect()))
            }
            (Some(FieldValue::Scalar(Value::Null)), Some(_)) => Some(Data::Null),
            (Some(FieldValue::Link(target)), Some(inner)) => Some(self.object(target, inner, path)),
            (Some(FieldValue::LinkList(targets)), Some(inner)) => Some(Data::List(
                targets
                    .iter()
                    .enumerate()
                    .map(|(index, target)| self.object(target, inner, &join(path, &index.to_string())))
                    .collect(),
            )),
            // Absent, or stored under a different kind than the shape asks for
            _ => None,
        };

        match value {
            Some(data) => data,
            None => {
                if !record.is_invalidated() {
                    self.miss(id, storage_key.to_string(), path.to_string());
                }
                Data::Null
            }
        }
    }
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}
