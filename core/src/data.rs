//! Resolved view data.
//!
//! `Data` is what a view receives: the denormalized tree produced by walking a
//! query shape over the store. Object keys keep document order.

use crate::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A resolved subtree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Data {
    /// Null (explicit null, or a missing field in an incomplete result).
    #[default]
    Null,
    /// A scalar leaf.
    Scalar(Value),
    /// An ordered list.
    List(Vec<Data>),
    /// An object keyed by response key (alias or field name).
    Object(IndexMap<String, Data>),
}

impl Data {
    /// Wrap a scalar, folding `Value::Null` into `Data::Null`.
    pub fn scalar(value: Value) -> Self {
        if value.is_null() {
            Data::Null
        } else {
            Data::Scalar(value)
        }
    }

    /// Create an empty object.
    pub fn object() -> Self {
        Data::Object(IndexMap::new())
    }

    /// Returns true if this is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Data::Null)
    }

    /// Look up a key if this is an object.
    pub fn get(&self, key: &str) -> Option<&Data> {
        match self {
            Data::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Follow a path of object keys.
    pub fn pointer(&self, path: &[&str]) -> Option<&Data> {
        path.iter().try_fold(self, |data, key| data.get(key))
    }

    /// Get the elements if this is a list.
    pub fn as_list(&self) -> Option<&[Data]> {
        match self {
            Data::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the scalar if this is a scalar leaf.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Data::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Get a string leaf.
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Value::as_str)
    }

    /// Build from JSON, keeping object key order.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Array(items) => Data::List(items.iter().map(Data::from_json).collect()),
            serde_json::Value::Object(map) => Data::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Data::from_json(v)))
                    .collect(),
            ),
            leaf => Data::scalar(Value::from_json(leaf)),
        }
    }

    /// Convert to JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Data::Null => serde_json::Value::Null,
            Data::Scalar(v) => v.to_json(),
            Data::List(items) => serde_json::Value::Array(items.iter().map(Data::to_json).collect()),
            Data::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}
