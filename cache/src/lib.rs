//! Lectern Cache
//!
//! The facade tying the normalized store to views and the network:
//! - `Cache`: explicit construction and disposal, shared single-threaded state
//! - `watch` / `ViewHandle`: cache-only views re-rendered on change
//! - `query`: one-shot reads honouring a fetch policy
//! - `mutation`: send, normalize, update and notify in one step
//! - `CacheConfig`: serde/TOML configuration
//! - `telemetry`: tracing subscriber setup

mod cache;
mod config;
mod error;
mod mutation;
pub mod telemetry;
mod view;

pub use cache::Cache;
pub use config::{CacheConfig, FetchPolicy};
pub use error::{CacheError, CacheResult};
pub use mutation::Mutation;
pub use view::ViewHandle;

pub use lectern_core::{ChangeSet, Data, EntityId, Value};
pub use lectern_mutation::{MutationError, MutationOutcome, StoreHandle};
pub use lectern_network::{GraphError, GraphRequest, GraphResponse, HttpTransport, Transport, TransportError};
pub use lectern_parser::{parse_operation, parse_selection, Operation, Variables};
pub use lectern_query::{MissingField, Resolution};
pub use lectern_store::{DefaultKeying, Identity, JsonMap, Keying, Snapshot, StoreError};
pub use lectern_subscription::ViewToken;
