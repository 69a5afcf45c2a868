//! Storage Adapters for the Entity Domain
//!
//! This module provides the `EntityStorage` implementation for entity types
//! whose system of record is the CRM.
//!
//! # Available Adapters
//!
//! - **CrmEntityStorage**: Translates entity load/save/delete into CRM API calls
//! - **MockCrmApi / InMemoryLocalStorage**: In-memory collaborators for testing
//!   (re-exported from the ports module with the `mock` feature)
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_entity::adapters::CrmEntityStorage;
//! use domain_entity::EntityStorage;
//! use std::sync::Arc;
//!
//! let storage = CrmEntityStorage::new(entity_type, field_manager, local_storage, crm)
//!     .with_timezone(config.timezone.clone());
//! let port: Arc<dyn EntityStorage> = Arc::new(storage);
//! ```

pub mod crm_storage;

pub use crm_storage::CrmEntityStorage;
