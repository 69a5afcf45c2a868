//! Core Kernel - Foundational types shared by the CRM entity bridge
//!
//! This crate provides the building blocks used by the entity domain:
//! - Identifiers for CRM records and CRM entity kinds
//! - The unified `PortError` returned by every port implementation
//! - Datetime reconciliation between the CRM wire format and local storage
//! - The entity type registry and its configuration loader

pub mod config;
pub mod error;
pub mod identifiers;
pub mod ports;
pub mod registry;
pub mod temporal;

pub use config::BridgeConfig;
pub use error::CoreError;
pub use identifiers::{EntityId, EntityKind};
pub use ports::{DomainPort, PortError};
pub use registry::{EntityTypeDefinition, EntityTypeRegistry, EntityTypeRegistryBuilder};
pub use temporal::{TemporalError, Timezone};
