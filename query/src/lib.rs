//! Lectern Query Executor
//!
//! Resolves query shapes against the record store:
//! - Depth-first walk in document order, descending through links
//! - Dependency set of every record visited
//! - Missing and stale fields reported so the caller can fetch

mod error;
mod executor;
mod resolution;

pub use error::{QueryError, QueryResult};
pub use executor::{resolve, resolve_entity, QueryExecutor};
pub use resolution::{MissingField, Resolution};
