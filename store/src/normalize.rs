//! Normalization: flattening a nested response into records.
//!
//! The query shape decides what a payload field is. A field with a
//! sub-selection is a link field, everything else is a scalar. Keyed objects
//! become their own records; embedded objects get a synthetic id under their
//! parent (`parent.field` or `parent.field.index`).

use crate::error::StoreError;
use crate::keying::{Identity, JsonMap, Keying};
use crate::store::RecordStore;
use lectern_core::{ChangeSet, EntityId, FieldValue, Value};
use lectern_parser::{Field, Operation, SelectionSet, Variables};
use serde_json::Value as Json;
use tracing::{debug, warn};

/// Result of one normalization pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeOutcome {
    /// Identifier of the top-level record written.
    pub root: Option<EntityId>,
    /// Every record whose fields changed.
    pub changed: ChangeSet,
    /// Entity-local failures; unrelated entities were still committed.
    pub errors: Vec<StoreError>,
}

impl NormalizeOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

impl RecordStore {
    /// Normalize one payload object against a selection.
    pub fn normalize(
        &mut self,
        payload: &Json,
        selection: &SelectionSet,
        variables: &Variables,
        keying: &dyn Keying,
    ) -> NormalizeOutcome {
        let mut normalizer = Normalizer::new(self, keying, variables);

        let root = match payload {
            Json::Object(object) => match keying.identify(typename_of(object), object) {
                Identity::Entity(id) => {
                    normalizer.write_object(&id, object, selection, "");
                    Some(id)
                }
                Identity::Embedded => {
                    normalizer.fail(StoreError::missing_identifier(
                        typename_of(object).unwrap_or("object"),
                        "",
                    ));
                    None
                }
                Identity::Missing { typename } => {
                    normalizer.fail(StoreError::missing_identifier(typename, ""));
                    None
                }
            },
            _ => {
                normalizer.fail(StoreError::invalid_payload("", "expected an object"));
                None
            }
        };

        normalizer.finish(root)
    }

    /// Normalize an operation result under its root record.
    pub fn write_operation(
        &mut self,
        operation: &Operation,
        variables: &Variables,
        data: &Json,
        keying: &dyn Keying,
    ) -> NormalizeOutcome {
        let root = if operation.is_mutation() {
            EntityId::root_mutation()
        } else {
            EntityId::root_query()
        };
        let variables = operation.with_defaults(variables);
        let mut normalizer = Normalizer::new(self, keying, &variables);

        match data {
            Json::Object(object) => normalizer.write_object(&root, object, &operation.selection, ""),
            Json::Null => {}
            _ => normalizer.fail(StoreError::invalid_payload("", "expected an object")),
        }

        normalizer.finish(Some(root))
    }
}

struct Normalizer<'s, 'k> {
    store: &'s mut RecordStore,
    keying: &'k dyn Keying,
    variables: &'k Variables,
    changed: ChangeSet,
    errors: Vec<StoreError>,
}

impl<'s, 'k> Normalizer<'s, 'k> {
    fn new(store: &'s mut RecordStore, keying: &'k dyn Keying, variables: &'k Variables) -> Self {
        Self {
            store,
            keying,
            variables,
            changed: ChangeSet::new(),
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, error: StoreError) {
        warn!(error = %error, "Normalization error");
        self.errors.push(error);
    }

    fn finish(self, root: Option<EntityId>) -> NormalizeOutcome {
        debug!(
            root = ?root,
            changed = self.changed.len(),
            errors = self.errors.len(),
            "Normalized payload"
        );
        NormalizeOutcome {
            root,
            changed: self.changed,
            errors: self.errors,
        }
    }

    fn mark(&mut self, id: &EntityId) {
        if !self.changed.contains(id) {
            self.changed.insert(id.clone());
        }
    }

    /// Merge the selected fields of `object` into record `id`.
    ///
    /// Fields absent from the payload are left as they are.
    fn write_object(&mut self, id: &EntityId, object: &JsonMap, selection: &SelectionSet, path: &str) {
        if self.store.ensure_record(id) {
            self.mark(id);
        }
        if let Some(record) = self.store.records.get_mut(id) {
            if record.revalidate() {
                self.mark(id);
            }
        }

        let variables = self.variables;
        for field in selection.included(variables) {
            let Some(json) = object.get(field.response_key()) else {
                continue;
            };
            let storage_key = field.storage_key(variables);
            let field_path = join(path, field.response_key());

            let value = match &field.selection {
                None => Some(scalar_value(json)),
                Some(inner) => self.link_value(id, &storage_key, field, inner, json, &field_path),
            };

            if let Some(value) = value {
                if self.store.write_field(id, &storage_key, value) {
                    self.mark(id);
                }
            }
        }
    }

    /// Normalize the objects under a link field. None leaves the field unwritten.
    fn link_value(
        &mut self,
        parent: &EntityId,
        storage_key: &str,
        field: &Field,
        inner: &SelectionSet,
        json: &Json,
        path: &str,
    ) -> Option<FieldValue> {
        match json {
            Json::Null => Some(FieldValue::Scalar(Value::Null)),
            Json::Object(object) => {
                let child = self.child_id(object, parent.child(storage_key), path)?;
                self.write_object(&child, object, inner, path);
                Some(FieldValue::Link(child))
            }
            Json::Array(items) => {
                let mut targets = Vec::with_capacity(items.len());
                let mut complete = true;
                for (index, item) in items.iter().enumerate() {
                    let item_path = join(path, &index.to_string());
                    match item {
                        Json::Null => {}
                        Json::Object(object) => {
                            match self.child_id(object, parent.child_at(storage_key, index), &item_path) {
                                Some(child) => {
                                    self.write_object(&child, object, inner, &item_path);
                                    targets.push(child);
                                }
                                None => complete = false,
                            }
                        }
                        _ => {
                            self.fail(StoreError::invalid_payload(
                                item_path,
                                format!("expected an object for {}", field.name),
                            ));
                            complete = false;
                        }
                    }
                }
                complete.then_some(FieldValue::LinkList(targets))
            }
            _ => {
                self.fail(StoreError::invalid_payload(
                    path,
                    format!("expected an object for {}", field.name),
                ));
                None
            }
        }
    }

    fn child_id(&mut self, object: &JsonMap, embedded: EntityId, path: &str) -> Option<EntityId> {
        match self.keying.identify(typename_of(object), object) {
            Identity::Entity(id) => Some(id),
            Identity::Embedded => Some(embedded),
            Identity::Missing { typename } => {
                self.fail(StoreError::missing_identifier(typename, path));
                None
            }
        }
    }
}

fn typename_of(object: &JsonMap) -> Option<&str> {
    object.get("__typename").and_then(Json::as_str)
}

/// Scalars may be lists of leaves; anything deeper stays opaque JSON.
fn scalar_value(json: &Json) -> FieldValue {
    match json {
        Json::Array(items) if items.iter().all(|item| !item.is_array() && !item.is_object()) => {
            FieldValue::ScalarList(items.iter().map(Value::from_json).collect())
        }
        other => FieldValue::Scalar(Value::from_json(other)),
    }
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}
