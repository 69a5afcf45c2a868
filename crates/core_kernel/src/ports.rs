//! Ports and Adapters Infrastructure
//!
//! This module provides the foundational types for the ports and adapters
//! layout of the bridge. The entity domain defines its port traits (the CRM
//! API client, the local field storage, the entity storage itself) on top of
//! the marker trait here, and every adapter reports failures as `PortError`.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Hosting framework                        │
//! │        (entity load/save lifecycle, field definitions)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Port Traits                             │
//! │   (EntityStorage, EntityFieldManager, FieldSchemaProvider)   │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                         │
//!         ┌─────────┴─────────┐     ┌────────┴────────┐
//!         │ LocalFieldStorage │     │     CrmApi       │
//!         │  (framework-owned │     │ (remote CRM API  │
//!         │      fields)      │     │   client)        │
//!         └───────────────────┘     └──────────────────┘
//! ```

use std::fmt;
use thiserror::Error;

/// Error type for port operations
///
/// Provides a unified error type that all port implementations must use.
/// The storage engine never rewraps these: a failure reported by the CRM
/// client reaches the hosting framework as-is.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// A validation error occurred
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation timed out
    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    /// Authentication or authorization failed
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
    },

    /// The external system is unavailable
    #[error("Service unavailable: {service}")]
    ServiceUnavailable {
        service: String,
    },

    /// The CRM API answered with an error result
    #[error("CRM API error: {message}")]
    Remote {
        message: String,
        error_code: Option<String>,
    },

    /// A data transformation error occurred
    #[error("Transformation error: {message}")]
    Transformation {
        message: String,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Validation error with field information
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a Remote error as reported by the CRM API
    pub fn remote(message: impl Into<String>, error_code: Option<String>) -> Self {
        PortError::Remote {
            message: message.into(),
            error_code,
        }
    }

    /// Creates a Transformation error
    pub fn transformation(message: impl Into<String>) -> Self {
        PortError::Transformation {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker trait for all domain ports
///
/// All port traits extend this marker so that implementations can be shared
/// as `Arc<dyn Port>` across async tasks.
pub trait DomainPort: Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Contact", "123");
        assert!(error.is_not_found());
        assert!(error.to_string().contains("Contact"));
        assert!(error.to_string().contains("123"));
    }

    #[test]
    fn test_remote_error_display() {
        let error = PortError::remote("Mandatory key(s) missing", None);
        assert_eq!(error.to_string(), "CRM API error: Mandatory key(s) missing");
    }
}
