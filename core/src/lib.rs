//! Lectern Core Types
//!
//! This crate provides the foundational types shared by every cache component:
//! - Entity identifiers and change sets (EntityId, ChangeSet)
//! - Scalar values (the Value enum)
//! - Flat records with field/link values (Record, FieldValue)
//! - Resolved view data (the Data tree)

mod data;
mod id;
mod record;
mod value;

pub use data::*;
pub use id::*;
pub use record::*;
pub use value::*;
