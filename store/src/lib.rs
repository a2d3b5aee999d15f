//! Lectern Record Store
//!
//! This crate provides the normalized record storage with reverse-link bookkeeping:
//! - Record storage keyed by entity identifier (arena style, cycles are plain links)
//! - Reference index: find every (referrer, field) pair linking to a record
//! - Normalization of nested responses through a keying function
//! - Link/scalar edit primitives, invalidation and cascading deletion
//! - Snapshots and reachability-based garbage collection

mod error;
mod index;
mod keying;
mod normalize;
mod snapshot;
mod store;

pub use error::{StoreError, StoreResult};
pub use index::{Reference, ReferenceIndex};
pub use keying::{DefaultKeying, Identity, JsonMap, Keying};
pub use normalize::NormalizeOutcome;
pub use snapshot::Snapshot;
pub use store::RecordStore;
