//! Store error types.

use lectern_core::EntityId;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while normalizing into or editing the store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// An entity the keying function expects to key carried no key.
    #[error("Missing identifier for {typename} at {path}")]
    MissingIdentifier { typename: String, path: String },

    #[error("Record not found: {0}")]
    RecordNotFound(EntityId),

    #[error("Field {field} of {id} is not a link field")]
    NotALink { id: EntityId, field: String },

    /// A link the reference index did not agree with; repaired when found.
    #[error("Dangling reference from {referrer}.{field} to {target}")]
    DanglingReference {
        referrer: EntityId,
        field: String,
        target: EntityId,
    },

    #[error("Invalid payload at {path}: {message}")]
    InvalidPayload { path: String, message: String },
}

impl StoreError {
    pub fn missing_identifier(typename: impl Into<String>, path: impl Into<String>) -> Self {
        Self::MissingIdentifier {
            typename: typename.into(),
            path: path.into(),
        }
    }

    pub fn not_a_link(id: &EntityId, field: impl Into<String>) -> Self {
        Self::NotALink {
            id: id.clone(),
            field: field.into(),
        }
    }

    pub fn dangling_reference(referrer: &EntityId, field: impl Into<String>, target: &EntityId) -> Self {
        Self::DanglingReference {
            referrer: referrer.clone(),
            field: field.into(),
            target: target.clone(),
        }
    }

    pub fn invalid_payload(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            path: path.into(),
            message: message.into(),
        }
    }
}
