//! Keying functions: deriving entity identifiers from payload objects.

use lectern_core::EntityId;
use std::collections::HashSet;

/// A JSON object from a response payload.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// What the keying function decided for one payload object.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    /// A keyed entity.
    Entity(EntityId),
    /// A value object without identity, stored under its parent.
    Embedded,
    /// An entity that should have been keyed but carried no key.
    Missing { typename: String },
}

/// Keying function supplied once at cache construction. Must be pure.
pub trait Keying {
    fn identify(&self, typename: Option<&str>, object: &JsonMap) -> Identity;
}

impl<F> Keying for F
where
    F: Fn(Option<&str>, &JsonMap) -> Identity,
{
    fn identify(&self, typename: Option<&str>, object: &JsonMap) -> Identity {
        self(typename, object)
    }
}

/// Keys objects by the first present key field, prefixed by `__typename`.
#[derive(Debug, Clone)]
pub struct DefaultKeying {
    key_fields: Vec<String>,
    embedded_types: HashSet<String>,
}

impl Default for DefaultKeying {
    fn default() -> Self {
        Self {
            key_fields: vec!["id".to_string(), "uuid".to_string()],
            embedded_types: HashSet::new(),
        }
    }
}

impl DefaultKeying {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_embedded_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.embedded_types = types.into_iter().map(Into::into).collect();
        self
    }
}

impl Keying for DefaultKeying {
    fn identify(&self, typename: Option<&str>, object: &JsonMap) -> Identity {
        let key = self.key_fields.iter().find_map(|field| match object.get(field) {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        });

        match (key, typename) {
            (Some(key), Some(typename)) => Identity::Entity(EntityId::new(format!("{}:{}", typename, key))),
            (Some(key), None) => Identity::Entity(EntityId::new(key)),
            (None, None) => Identity::Embedded,
            (None, Some(typename)) if self.embedded_types.contains(typename) => Identity::Embedded,
            (None, Some(typename)) => Identity::Missing {
                typename: typename.to_string(),
            },
        }
    }
}
