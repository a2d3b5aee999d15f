//! Lectern Mutation
//!
//! Execute write operations against the graph API and fold their results
//! into the record store.
//!
//! Responsibilities:
//! - Send the mutation through the network executor
//! - Normalize the confirmed response
//! - Run the caller's updater against a scoped store handle
//! - Report the union of changed records for notification
//!
//! # Module Structure
//!
//! - `executor` - MutationExecutor: send, then commit on arrival
//! - `handle` - StoreHandle: the edit surface given to updaters
//! - `request` - MutationRequest and the updater type
//! - `error` - Error types for mutation failures
//! - `result` - MutationOutcome

mod error;
mod executor;
mod handle;
mod request;
mod result;

pub use error::{MutationError, MutationResult};
pub use executor::MutationExecutor;
pub use handle::StoreHandle;
pub use request::{MutationRequest, Updater};
pub use result::MutationOutcome;
