//! Integration test support for Lectern.
//!
//! Scenario tests live in `tests/`; this crate provides the transports and
//! recorders they share.

pub mod recorder;
pub mod transport;

pub mod prelude {
    pub use crate::recorder::Recorder;
    pub use crate::transport::{GatedTransport, ScriptedTransport};
    pub use crate::{cache_over, op, vars};
    pub use lectern_cache::*;
    pub use serde_json::json;
}

use lectern_cache::{Cache, CacheConfig, DefaultKeying, Operation, Transport, Variables};
use std::rc::Rc;

/// A cache with default config and keying over `transport`.
pub fn cache_over(transport: Rc<dyn Transport>) -> Cache {
    Cache::new(CacheConfig::new(), DefaultKeying::new(), transport)
}

/// Parse an operation, panicking on malformed test input.
pub fn op(source: &str) -> Operation {
    match lectern_cache::parse_operation(source) {
        Ok(operation) => operation,
        Err(error) => panic!("bad test operation {source:?}: {error}"),
    }
}

/// Variables from a JSON object literal.
pub fn vars(value: serde_json::Value) -> Variables {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("variables must be an object, got {other}"),
    }
}
