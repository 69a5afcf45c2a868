//! Entity Domain Ports
//!
//! This module defines the port interfaces of the entity domain. The engine
//! sits between two kinds of collaborators:
//!
//! - **`CrmApi`**: the remote CRM API client (field metadata, option lists,
//!   record get/save/delete). The transport is not part of this crate.
//! - **`LocalFieldStorage`**: the hosting framework's own persistence step,
//!   responsible for fields with custom (framework-managed) storage.
//!
//! and exposes the capabilities the hosting framework consumes:
//!
//! - **`FieldSchemaProvider`**: derived base field definitions per entity type
//! - **`EntityFieldManager`**: complete field definitions per entity type
//! - **`EntityStorage`**: load/save/delete of entity instances
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_entity::ports::{CrmApi, EntityStorage};
//! use domain_entity::adapters::CrmEntityStorage;
//! use std::sync::Arc;
//!
//! let crm: Arc<dyn CrmApi> = Arc::new(client);
//! let deriver = Arc::new(FieldSchemaDeriver::new(crm.clone()));
//! let field_manager = Arc::new(FieldManager::new(deriver));
//!
//! let storage = CrmEntityStorage::new(contact_type, field_manager, local_storage, crm);
//! let contacts = storage.load_multiple(None).await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use core_kernel::{DomainPort, EntityId, EntityKind, EntityTypeDefinition, PortError};

use crate::entity::EntityInstance;
use crate::field::{AllowedValues, FieldDescriptor, FieldSet};
use crate::metadata::RawFieldMetadata;
use crate::value::RawRecord;

/// Remote CRM API client
///
/// Every call is one blocking round-trip from the engine's point of view;
/// the engine awaits them one after another and never concurrently.
/// Timeouts are the client's concern and surface as `PortError`.
#[async_trait]
pub trait CrmApi: DomainPort {
    /// Field metadata of an entity kind, in the CRM's order
    async fn get_fields(&self, entity: &EntityKind) -> Result<Vec<RawFieldMetadata>, PortError>;

    /// Option list of a pseudoconstant field, raw value to label
    async fn get_options(&self, entity: &EntityKind, field_name: &str) -> Result<AllowedValues, PortError>;

    /// Records of an entity kind, optionally filtered by exact field values
    async fn get(&self, entity: &EntityKind, filter: Option<&RawRecord>) -> Result<Vec<RawRecord>, PortError>;

    /// Creates or updates a record
    ///
    /// An `id` among the params means update. Returns the stored record,
    /// including the assigned id.
    async fn save(&self, entity: &EntityKind, params: RawRecord) -> Result<RawRecord, PortError>;

    /// Deletes a record; params carry the `id`
    async fn delete(&self, entity: &EntityKind, params: RawRecord) -> Result<(), PortError>;
}

/// The hosting framework's local persistence step
///
/// Runs before the CRM half of every save and delete.
#[async_trait]
pub trait LocalFieldStorage: DomainPort {
    async fn save_field_items(&self, entity: &EntityInstance) -> Result<(), PortError>;

    async fn delete_field_items(&self, entities: &[EntityInstance]) -> Result<(), PortError>;
}

/// Source of base field definitions for an entity type
#[async_trait]
pub trait FieldSchemaProvider: DomainPort {
    async fn base_field_definitions(&self, entity_type: &EntityTypeDefinition) -> Result<FieldSet, PortError>;
}

/// Entity metadata manager: complete field definitions per entity type
#[async_trait]
pub trait EntityFieldManager: DomainPort {
    async fn field_definitions(&self, entity_type: &EntityTypeDefinition) -> Result<Arc<FieldSet>, PortError>;
}

/// Storage of one entity type
#[async_trait]
pub trait EntityStorage: DomainPort {
    /// The entity type this storage serves
    fn entity_type(&self) -> &EntityTypeDefinition;

    /// Loads the given entities, or every entity when `ids` is `None`
    ///
    /// Ids with no matching record are omitted from the result.
    async fn load_multiple(
        &self,
        ids: Option<&[EntityId]>,
    ) -> Result<BTreeMap<EntityId, EntityInstance>, PortError>;

    /// True when the entity already exists in storage
    fn has(&self, entity: &EntityInstance) -> bool;

    /// True when storage holds any entity of this type
    fn has_data(&self) -> bool;

    /// Number of entities with data in the given field
    fn count_field_data(&self, field: &FieldDescriptor) -> usize;

    /// Persists all field values of an entity
    async fn save_field_items(&self, entity: &mut EntityInstance) -> Result<(), PortError>;

    /// Removes the given entities, stopping at the first failure
    async fn delete_field_items(&self, entities: &[EntityInstance]) -> Result<(), PortError>;
}

/// Extension trait for EntityStorage with convenience methods
#[async_trait]
pub trait EntityStorageExt: EntityStorage {
    /// Loads a single entity, `None` when it does not exist
    async fn load(&self, id: EntityId) -> Result<Option<EntityInstance>, PortError> {
        let mut entities = self.load_multiple(Some(std::slice::from_ref(&id))).await?;
        Ok(entities.remove(&id))
    }

    /// Loads every entity of the type
    async fn load_all(&self) -> Result<Vec<EntityInstance>, PortError> {
        Ok(self.load_multiple(None).await?.into_values().collect())
    }

    /// Deletes a single entity
    async fn delete(&self, entity: &EntityInstance) -> Result<(), PortError> {
        self.delete_field_items(std::slice::from_ref(entity)).await
    }
}

impl<T: EntityStorage + ?Sized> EntityStorageExt for T {}

/// Mock adapters for testing
///
/// In-memory stand-ins for the CRM API client and the local persistence step,
/// useful for exercising the engine without a CRM.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    use crate::field::ID_FIELD;

    /// CRM API operations, used to inject failures
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum CrmOperation {
        GetFields,
        GetOptions,
        Get,
        Save,
        Delete,
    }

    /// A call received by `MockCrmApi`
    #[derive(Debug, Clone, PartialEq)]
    pub enum CrmCall {
        GetFields { entity: EntityKind },
        GetOptions { entity: EntityKind, field_name: String },
        Get { entity: EntityKind, filter: Option<RawRecord> },
        Save { entity: EntityKind, params: RawRecord },
        Delete { entity: EntityKind, params: RawRecord },
    }

    impl CrmCall {
        pub fn operation(&self) -> CrmOperation {
            match self {
                CrmCall::GetFields { .. } => CrmOperation::GetFields,
                CrmCall::GetOptions { .. } => CrmOperation::GetOptions,
                CrmCall::Get { .. } => CrmOperation::Get,
                CrmCall::Save { .. } => CrmOperation::Save,
                CrmCall::Delete { .. } => CrmOperation::Delete,
            }
        }
    }

    #[derive(Debug, Clone)]
    struct InjectedFailure {
        operation: CrmOperation,
        id: Option<EntityId>,
        message: String,
    }

    /// In-memory mock implementation of CrmApi
    ///
    /// Records are kept per entity kind in id order. Saves without an id get
    /// the next free id, as the CRM does.
    #[derive(Debug, Default)]
    pub struct MockCrmApi {
        fields: Arc<RwLock<HashMap<EntityKind, Vec<RawFieldMetadata>>>>,
        options: Arc<RwLock<HashMap<(EntityKind, String), AllowedValues>>>,
        records: Arc<RwLock<HashMap<EntityKind, BTreeMap<EntityId, RawRecord>>>>,
        calls: Arc<RwLock<Vec<CrmCall>>>,
        failures: Arc<RwLock<Vec<InjectedFailure>>>,
    }

    impl MockCrmApi {
        /// Creates a new mock CRM
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers the field metadata of an entity kind
        pub async fn with_fields(self, entity: impl Into<EntityKind>, fields: Vec<RawFieldMetadata>) -> Self {
            self.fields.write().await.insert(entity.into(), fields);
            self
        }

        /// Registers the option list of a pseudoconstant field
        pub async fn with_options(
            self,
            entity: impl Into<EntityKind>,
            field_name: impl Into<String>,
            options: AllowedValues,
        ) -> Self {
            self.options
                .write()
                .await
                .insert((entity.into(), field_name.into()), options);
            self
        }

        /// Pre-populates with records; records without an id get one assigned
        pub async fn with_records(self, entity: impl Into<EntityKind>, records: Vec<RawRecord>) -> Self {
            let entity = entity.into();
            for record in records {
                self.insert_record(&entity, record).await;
            }
            self
        }

        /// Stores a record as-is, returning its id
        pub async fn insert_record(&self, entity: &EntityKind, mut record: RawRecord) -> EntityId {
            let mut records = self.records.write().await;
            let table = records.entry(entity.clone()).or_default();
            let id = match record.get(ID_FIELD).and_then(EntityId::from_json) {
                Some(id) => id,
                None => {
                    let id = next_id(table);
                    record.insert(ID_FIELD.to_string(), id.to_json());
                    id
                }
            };
            table.insert(id, record);
            id
        }

        /// Makes every call of the given operation fail
        pub async fn fail_on(&self, operation: CrmOperation, message: impl Into<String>) {
            self.failures.write().await.push(InjectedFailure {
                operation,
                id: None,
                message: message.into(),
            });
        }

        /// Makes calls of the given operation fail for one record id
        pub async fn fail_on_record(&self, operation: CrmOperation, id: EntityId, message: impl Into<String>) {
            self.failures.write().await.push(InjectedFailure {
                operation,
                id: Some(id),
                message: message.into(),
            });
        }

        /// Returns a stored record
        pub async fn record(&self, entity: &EntityKind, id: EntityId) -> Option<RawRecord> {
            self.records
                .read()
                .await
                .get(entity)
                .and_then(|table| table.get(&id))
                .cloned()
        }

        /// Number of records stored for an entity kind
        pub async fn record_count(&self, entity: &EntityKind) -> usize {
            self.records
                .read()
                .await
                .get(entity)
                .map_or(0, BTreeMap::len)
        }

        /// All calls received, in order
        pub async fn calls(&self) -> Vec<CrmCall> {
            self.calls.read().await.clone()
        }

        /// Calls of one operation, in order
        pub async fn calls_of(&self, operation: CrmOperation) -> Vec<CrmCall> {
            self.calls
                .read()
                .await
                .iter()
                .filter(|call| call.operation() == operation)
                .cloned()
                .collect()
        }

        /// Params of every save call, in order
        pub async fn saved_params(&self) -> Vec<RawRecord> {
            self.calls
                .read()
                .await
                .iter()
                .filter_map(|call| match call {
                    CrmCall::Save { params, .. } => Some(params.clone()),
                    _ => None,
                })
                .collect()
        }

        async fn record_call(&self, call: CrmCall) {
            self.calls.write().await.push(call);
        }

        async fn check_failure(&self, operation: CrmOperation, id: Option<EntityId>) -> Result<(), PortError> {
            let failures = self.failures.read().await;
            let failure = failures.iter().find(|failure| {
                failure.operation == operation && (failure.id.is_none() || failure.id == id)
            });
            match failure {
                Some(failure) => Err(PortError::remote(failure.message.clone(), None)),
                None => Ok(()),
            }
        }
    }

    fn next_id(table: &BTreeMap<EntityId, RawRecord>) -> EntityId {
        EntityId::new(table.keys().next_back().map_or(1, |id| id.get() + 1))
    }

    fn record_matches(record: &RawRecord, filter: &RawRecord) -> bool {
        filter.iter().all(|(key, expected)| match record.get(key) {
            Some(actual) if key == ID_FIELD => {
                EntityId::from_json(actual).is_some_and(|id| EntityId::from_json(expected) == Some(id))
            }
            Some(actual) => actual == expected,
            None => expected.is_null(),
        })
    }

    impl DomainPort for MockCrmApi {}

    #[async_trait]
    impl CrmApi for MockCrmApi {
        async fn get_fields(&self, entity: &EntityKind) -> Result<Vec<RawFieldMetadata>, PortError> {
            self.record_call(CrmCall::GetFields { entity: entity.clone() }).await;
            self.check_failure(CrmOperation::GetFields, None).await?;

            self.fields
                .read()
                .await
                .get(entity)
                .cloned()
                .ok_or_else(|| PortError::remote(format!("API ({}, getfields) does not exist", entity), None))
        }

        async fn get_options(&self, entity: &EntityKind, field_name: &str) -> Result<AllowedValues, PortError> {
            self.record_call(CrmCall::GetOptions {
                entity: entity.clone(),
                field_name: field_name.to_string(),
            })
            .await;
            self.check_failure(CrmOperation::GetOptions, None).await?;

            Ok(self
                .options
                .read()
                .await
                .get(&(entity.clone(), field_name.to_string()))
                .cloned()
                .unwrap_or_default())
        }

        async fn get(&self, entity: &EntityKind, filter: Option<&RawRecord>) -> Result<Vec<RawRecord>, PortError> {
            self.record_call(CrmCall::Get {
                entity: entity.clone(),
                filter: filter.cloned(),
            })
            .await;
            let id = filter.and_then(|filter| filter.get(ID_FIELD)).and_then(EntityId::from_json);
            self.check_failure(CrmOperation::Get, id).await?;

            let records = self.records.read().await;
            let Some(table) = records.get(entity) else {
                return Ok(Vec::new());
            };
            Ok(table
                .values()
                .filter(|record| filter.map_or(true, |filter| record_matches(record, filter)))
                .cloned()
                .collect())
        }

        async fn save(&self, entity: &EntityKind, params: RawRecord) -> Result<RawRecord, PortError> {
            self.record_call(CrmCall::Save {
                entity: entity.clone(),
                params: params.clone(),
            })
            .await;
            let id = params.get(ID_FIELD).and_then(EntityId::from_json);
            self.check_failure(CrmOperation::Save, id).await?;

            let mut records = self.records.write().await;
            let table = records.entry(entity.clone()).or_default();
            let id = id.unwrap_or_else(|| next_id(table));
            let record = table.entry(id).or_default();
            for (key, value) in params {
                record.insert(key, value);
            }
            record.insert(ID_FIELD.to_string(), id.to_json());
            Ok(record.clone())
        }

        async fn delete(&self, entity: &EntityKind, params: RawRecord) -> Result<(), PortError> {
            self.record_call(CrmCall::Delete {
                entity: entity.clone(),
                params: params.clone(),
            })
            .await;
            let id = params
                .get(ID_FIELD)
                .and_then(EntityId::from_json)
                .ok_or_else(|| PortError::validation_field("Mandatory key(s) missing from params array: id", ID_FIELD))?;
            self.check_failure(CrmOperation::Delete, Some(id)).await?;

            self.records
                .write()
                .await
                .get_mut(entity)
                .and_then(|table| table.remove(&id))
                .map(|_| ())
                .ok_or_else(|| PortError::not_found(entity.as_str(), id))
        }
    }

    /// Local persistence call recorded by `InMemoryLocalStorage`
    #[derive(Debug, Clone, PartialEq)]
    pub enum LocalCall {
        Save { entity_id: Option<EntityId> },
        Delete { entity_ids: Vec<Option<EntityId>> },
    }

    /// In-memory stand-in for the framework's local persistence step
    #[derive(Debug, Default)]
    pub struct InMemoryLocalStorage {
        calls: Arc<RwLock<Vec<LocalCall>>>,
        saved: Arc<RwLock<Vec<EntityInstance>>>,
        failure: Arc<RwLock<Option<String>>>,
    }

    impl InMemoryLocalStorage {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent save and delete fail
        pub async fn fail_with(&self, message: impl Into<String>) {
            *self.failure.write().await = Some(message.into());
        }

        pub async fn calls(&self) -> Vec<LocalCall> {
            self.calls.read().await.clone()
        }

        /// Entities as they were handed to the local step
        pub async fn saved(&self) -> Vec<EntityInstance> {
            self.saved.read().await.clone()
        }

        async fn check_failure(&self) -> Result<(), PortError> {
            match self.failure.read().await.as_ref() {
                Some(message) => Err(PortError::internal(message.clone())),
                None => Ok(()),
            }
        }
    }

    impl DomainPort for InMemoryLocalStorage {}

    #[async_trait]
    impl LocalFieldStorage for InMemoryLocalStorage {
        async fn save_field_items(&self, entity: &EntityInstance) -> Result<(), PortError> {
            self.calls.write().await.push(LocalCall::Save { entity_id: entity.id() });
            self.check_failure().await?;
            self.saved.write().await.push(entity.clone());
            Ok(())
        }

        async fn delete_field_items(&self, entities: &[EntityInstance]) -> Result<(), PortError> {
            self.calls.write().await.push(LocalCall::Delete {
                entity_ids: entities.iter().map(EntityInstance::id).collect(),
            });
            self.check_failure().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{CrmCall, CrmOperation, InMemoryLocalStorage, LocalCall, MockCrmApi};
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_mock_crm_save_assigns_ids() {
        let crm = MockCrmApi::new();
        let contact = EntityKind::from("Contact");

        let first = crm.save(&contact, record(json!({"display_name": "Alice"}))).await.unwrap();
        let second = crm.save(&contact, record(json!({"display_name": "Bob"}))).await.unwrap();

        assert_eq!(first["id"], json!(1));
        assert_eq!(second["id"], json!(2));
        assert_eq!(crm.record_count(&contact).await, 2);
    }

    #[tokio::test]
    async fn test_mock_crm_update_merges() {
        let contact = EntityKind::from("Contact");
        let crm = MockCrmApi::new()
            .with_records("Contact", vec![record(json!({"id": "4", "first_name": "Alice", "last_name": "Smith"}))])
            .await;

        crm.save(&contact, record(json!({"id": 4, "first_name": "Alicia"}))).await.unwrap();

        let stored = crm.record(&contact, EntityId::new(4)).await.unwrap();
        assert_eq!(stored["first_name"], json!("Alicia"));
        assert_eq!(stored["last_name"], json!("Smith"));
    }

    #[tokio::test]
    async fn test_mock_crm_get_by_id() {
        let contact = EntityKind::from("Contact");
        let crm = MockCrmApi::new()
            .with_records(
                "Contact",
                vec![record(json!({"id": "1"})), record(json!({"id": "2"}))],
            )
            .await;

        let found = crm.get(&contact, Some(&record(json!({"id": 2})))).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(EntityId::from_json(&found[0]["id"]), Some(EntityId::new(2)));

        let missing = crm.get(&contact, Some(&record(json!({"id": 3})))).await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_mock_crm_injected_failure() {
        let contact = EntityKind::from("Contact");
        let crm = MockCrmApi::new();
        crm.fail_on(CrmOperation::Save, "DB Error: constraint violation").await;

        let result = crm.save(&contact, RawRecord::new()).await;
        assert!(matches!(result, Err(PortError::Remote { .. })));
        assert_eq!(crm.calls_of(CrmOperation::Save).await.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_crm_delete_unknown_is_not_found() {
        let contact = EntityKind::from("Contact");
        let crm = MockCrmApi::new();

        let result = crm.delete(&contact, record(json!({"id": 9}))).await;
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(
            crm.calls().await,
            vec![CrmCall::Delete {
                entity: contact,
                params: record(json!({"id": 9})),
            }]
        );
    }

    #[tokio::test]
    async fn test_mock_crm_unknown_entity_fields() {
        let crm = MockCrmApi::new();
        let result = crm.get_fields(&EntityKind::from("Nothing")).await;
        assert!(matches!(result, Err(PortError::Remote { .. })));
    }

    #[tokio::test]
    async fn test_local_storage_records_calls() {
        let local = InMemoryLocalStorage::new();
        local.delete_field_items(&[]).await.unwrap();
        assert_eq!(local.calls().await, vec![LocalCall::Delete { entity_ids: vec![] }]);

        local.fail_with("disk full").await;
        assert!(local.delete_field_items(&[]).await.is_err());
    }
}
