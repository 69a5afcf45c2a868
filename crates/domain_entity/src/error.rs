//! Entity domain errors
//!
//! Errors raised when an entity instance is manipulated in a way its field
//! schema does not allow. Failures of the CRM itself travel as `PortError`.

use thiserror::Error;

use crate::field::SemanticType;

/// Errors that can occur when working with entity instances
#[derive(Debug, Error, PartialEq)]
pub enum EntityError {
    /// The entity type has no field with this name
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Value does not match the field's semantic type
    #[error("Value for field {field} is not a valid {expected:?}")]
    TypeMismatch { field: String, expected: SemanticType },

    /// The field is maintained by storage and cannot be assigned
    #[error("Field {0} is read-only")]
    ReadOnly(String),

    /// More values than the field's cardinality allows
    #[error("Field {field} accepts at most {limit} value(s)")]
    CardinalityExceeded { field: String, limit: usize },
}

impl EntityError {
    pub fn unknown_field(name: impl Into<String>) -> Self {
        EntityError::UnknownField(name.into())
    }
}
