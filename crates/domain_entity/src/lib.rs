//! CRM-backed Entity Domain
//!
//! This crate lets a framework's entity system read, write and describe
//! records that live in a CRM reached through its API.
//!
//! # Components
//!
//! - **Field Schema Deriver** (`schema`): derives an ordered set of typed
//!   field descriptors for a CRM entity kind from the CRM's field metadata,
//!   resolving option-list fields into allowed values.
//! - **Entity Translation Engine** (`adapters::crm_storage`): loads, saves and
//!   deletes entity instances through the CRM API, reconciling date formats,
//!   cardinality and empty values between the two data models.
//!
//! Field sets are only known at runtime, so entity instances are dynamically
//! keyed records of typed `FieldValue`s rather than static structs.
//!
//! # Examples
//!
//! ```rust
//! use domain_entity::{CrmEntityStorage, EntityInstance, FieldDescriptor, FieldSet, SemanticType};
//! use serde_json::json;
//!
//! let fields = FieldSet::new(vec![
//!     FieldDescriptor::identifier(),
//!     FieldDescriptor::new("display_name", SemanticType::ShortText),
//!     FieldDescriptor::new("is_opt_out", SemanticType::Boolean),
//!     FieldDescriptor::new("nick_name", SemanticType::ShortText),
//! ]);
//!
//! let mut contact = EntityInstance::new("crm_contact", &fields);
//! contact.set_value("display_name", "Jane Smith").unwrap();
//! contact.set_value("is_opt_out", false).unwrap();
//! assert!(contact.is_new());
//!
//! // Empty fields are left out, single values are sent as bare scalars
//! let params = CrmEntityStorage::save_params(&contact);
//! assert_eq!(
//!     serde_json::Value::Object(params),
//!     json!({"display_name": "Jane Smith", "is_opt_out": false})
//! );
//! ```

pub mod adapters;
pub mod entity;
pub mod error;
pub mod field;
pub mod field_manager;
pub mod metadata;
pub mod ports;
pub mod schema;
pub mod value;

pub use adapters::CrmEntityStorage;
pub use entity::{EntityInstance, FieldItemList};
pub use error::EntityError;
pub use field::{AllowedValues, Cardinality, FieldDescriptor, FieldSet, SemanticType, EMAIL_MAX_LENGTH, ID_FIELD};
pub use field_manager::FieldManager;
pub use metadata::{CrmTypeCode, RawFieldMetadata};
pub use ports::{
    CrmApi, EntityFieldManager, EntityStorage, EntityStorageExt, FieldSchemaProvider, LocalFieldStorage,
};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{CrmCall, CrmOperation, InMemoryLocalStorage, LocalCall, MockCrmApi};
pub use schema::FieldSchemaDeriver;
pub use value::{FieldValue, RawRecord};
