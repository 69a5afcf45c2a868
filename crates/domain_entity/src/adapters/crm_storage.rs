//! CRM Entity Storage Adapter
//!
//! Implements `EntityStorage` for entity types whose records live in the CRM.
//! The adapter translates between typed entity instances and the CRM's raw
//! records:
//!
//! - **Load**: one `get` for all records, or one `get` per requested id.
//!   Date and datetime values are rewritten from the CRM format (space
//!   separator or Unix timestamp) to the local storage format before decoding.
//! - **Save**: the local persistence step runs first, then every CRM-stored
//!   field is flattened into one parameter map and sent in a single `save`.
//! - **Delete**: the local persistence step runs first, then one `delete` per
//!   entity; the first failure stops the batch.
//!
//! # Error Handling
//!
//! CRM failures are returned unchanged. A failing CRM save or delete leaves
//! the already committed local half in place; the failure is logged at
//! `error` level.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_entity::adapters::CrmEntityStorage;
//! use domain_entity::{EntityStorage, EntityStorageExt};
//!
//! let storage = CrmEntityStorage::new(contact_type, field_manager, local_storage, crm)
//!     .with_timezone(config.timezone);
//!
//! let mut contact = storage.load(EntityId::new(42)).await?.unwrap();
//! contact.set_value("nick_name", "Bob")?;
//! storage.save_field_items(&mut contact).await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use core_kernel::temporal::normalize_crm_datetime;
use core_kernel::{DomainPort, EntityId, EntityTypeDefinition, PortError, Timezone};

use crate::entity::EntityInstance;
use crate::field::{Cardinality, FieldDescriptor, FieldSet, ID_FIELD};
use crate::ports::{CrmApi, EntityFieldManager, EntityStorage, LocalFieldStorage};
use crate::value::{decode_items, is_empty_raw, FieldValue, RawRecord};

/// CRM-backed storage of one entity type
pub struct CrmEntityStorage {
    entity_type: EntityTypeDefinition,
    field_manager: Arc<dyn EntityFieldManager>,
    local_storage: Arc<dyn LocalFieldStorage>,
    crm: Arc<dyn CrmApi>,
    timezone: Timezone,
}

impl CrmEntityStorage {
    /// Creates the storage; timestamps are read in UTC until `with_timezone`
    pub fn new(
        entity_type: EntityTypeDefinition,
        field_manager: Arc<dyn EntityFieldManager>,
        local_storage: Arc<dyn LocalFieldStorage>,
        crm: Arc<dyn CrmApi>,
    ) -> Self {
        Self {
            entity_type,
            field_manager,
            local_storage,
            crm,
            timezone: Timezone::default(),
        }
    }

    /// Sets the site timezone used to read numeric CRM timestamps
    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn timezone(&self) -> &Timezone {
        &self.timezone
    }

    /// Populates an entity from a raw CRM record
    ///
    /// Empty raw values leave the field empty. Date and datetime values are
    /// normalized to the local storage format, element by element for
    /// multi-valued fields.
    pub fn init_field_values(&self, entity: &mut EntityInstance, record: &RawRecord) {
        for field in entity.fields_mut() {
            let Some(raw) = record.get(field.name()) else {
                continue;
            };
            if is_empty_raw(raw) {
                continue;
            }

            let semantic_type = field.definition().semantic_type();
            let items = if semantic_type.is_date() {
                decode_items(semantic_type, &self.normalize_date_value(raw), &self.timezone)
            } else {
                decode_items(semantic_type, raw, &self.timezone)
            };
            field.set_items(items);
        }
    }

    /// Builds the parameter map sent to the CRM for an entity
    ///
    /// Fields with custom storage and fields without non-empty items are
    /// left out. Single-valued fields are sent as a bare scalar.
    pub fn save_params(entity: &EntityInstance) -> RawRecord {
        let mut params = RawRecord::new();

        for field in entity.fields() {
            let definition = field.definition();
            if definition.has_custom_storage() {
                continue;
            }

            let mut values = field
                .items()
                .iter()
                .filter(|item| !item.is_empty())
                .map(FieldValue::to_wire);

            let value = match definition.cardinality() {
                Cardinality::Single => match values.next() {
                    Some(value) => value,
                    None => continue,
                },
                Cardinality::Multiple => Value::Array(values.collect()),
            };

            if !is_empty_raw(&value) {
                params.insert(field.name().to_string(), value);
            }
        }

        params
    }

    fn normalize_date_value(&self, raw: &Value) -> Value {
        match raw {
            Value::Array(elements) => {
                Value::Array(elements.iter().map(|element| self.normalize_date_value(element)).collect())
            }
            Value::Number(n) => self.normalize_date_string(&n.to_string(), raw),
            Value::String(s) => self.normalize_date_string(s, raw),
            other => other.clone(),
        }
    }

    fn normalize_date_string(&self, value: &str, raw: &Value) -> Value {
        match normalize_crm_datetime(value, &self.timezone) {
            Ok(normalized) => Value::String(normalized),
            Err(e) => {
                warn!(raw = %raw, error = %e, "Could not normalize CRM date value");
                raw.clone()
            }
        }
    }

    fn build_entity(&self, fields: &FieldSet, record: &RawRecord) -> EntityInstance {
        let mut entity = EntityInstance::new(self.entity_type.id(), fields);
        self.init_field_values(&mut entity, record);
        entity
    }

    fn id_filter(id: EntityId) -> RawRecord {
        let mut filter = RawRecord::new();
        filter.insert(ID_FIELD.to_string(), id.to_json());
        filter
    }
}

impl DomainPort for CrmEntityStorage {}

#[async_trait]
impl EntityStorage for CrmEntityStorage {
    fn entity_type(&self) -> &EntityTypeDefinition {
        &self.entity_type
    }

    #[instrument(skip(self, ids), fields(entity_type = self.entity_type.id(), count = ?ids.map(|ids| ids.len())))]
    async fn load_multiple(
        &self,
        ids: Option<&[EntityId]>,
    ) -> Result<BTreeMap<EntityId, EntityInstance>, PortError> {
        let fields = self.field_manager.field_definitions(&self.entity_type).await?;
        let kind = self.entity_type.crm_entity();
        let mut entities = BTreeMap::new();

        match ids {
            None => {
                let records = self.crm.get(kind, None).await?;
                debug!(records = records.len(), "Fetched all CRM records");

                for record in &records {
                    let entity = self.build_entity(&fields, record);
                    match entity.id() {
                        Some(id) => {
                            entities.insert(id, entity);
                        }
                        None => warn!("Skipping CRM record without identifier"),
                    }
                }
            }
            Some(ids) => {
                for &id in ids {
                    let records = self.crm.get(kind, Some(&Self::id_filter(id))).await?;
                    let Some(record) = records.first() else {
                        debug!(%id, "No CRM record for id");
                        continue;
                    };

                    let mut entity = self.build_entity(&fields, record);
                    if entity.id().is_none() {
                        if let Err(e) = entity.set_id(id) {
                            warn!(%id, error = %e, "Could not assign requested id to loaded entity");
                        }
                    }
                    entities.insert(id, entity);
                }
            }
        }

        Ok(entities)
    }

    fn has(&self, entity: &EntityInstance) -> bool {
        !entity.is_new()
    }

    fn has_data(&self) -> bool {
        false
    }

    fn count_field_data(&self, _field: &FieldDescriptor) -> usize {
        0
    }

    #[instrument(skip(self, entity), fields(entity_type = self.entity_type.id(), id = ?entity.id()))]
    async fn save_field_items(&self, entity: &mut EntityInstance) -> Result<(), PortError> {
        self.local_storage.save_field_items(entity).await?;

        for field in entity.fields_mut() {
            if !field.definition().has_custom_storage() {
                field.filter_empty_items();
            }
        }

        let params = Self::save_params(entity);
        debug!(params = params.len(), "Saving entity to CRM");

        let result = match self.crm.save(self.entity_type.crm_entity(), params).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "CRM save failed after local field storage committed");
                return Err(e);
            }
        };

        if let Some(id) = result.get(ID_FIELD).and_then(EntityId::from_json) {
            if entity.id() != Some(id) {
                if let Err(e) = entity.set_id(id) {
                    warn!(%id, error = %e, "Could not assign CRM id to saved entity");
                }
            }
        }
        entity.enforce_is_new(false);
        Ok(())
    }

    #[instrument(skip(self, entities), fields(entity_type = self.entity_type.id(), count = entities.len()))]
    async fn delete_field_items(&self, entities: &[EntityInstance]) -> Result<(), PortError> {
        self.local_storage.delete_field_items(entities).await?;

        let kind = self.entity_type.crm_entity();
        for entity in entities {
            let Some(id) = entity.id() else {
                debug!("Skipping entity without identifier");
                continue;
            };

            if let Err(e) = self.crm.delete(kind, Self::id_filter(id)).await {
                error!(%id, error = %e, "CRM delete failed after local field storage committed");
                return Err(e);
            }
        }
        Ok(())
    }
}
