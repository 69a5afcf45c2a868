//! Test Data Builders
//!
//! Provides builder patterns for CRM field metadata and for a fully wired
//! CRM storage (mock CRM, in-memory local storage, deriver, field manager).
//! Tests specify only what they care about and take defaults for the rest.

use std::sync::Arc;

use serde_json::{json, Value};

use core_kernel::{EntityTypeDefinition, PortError, Timezone};
use domain_entity::{
    AllowedValues, CrmEntityStorage, EntityFieldManager, EntityInstance, FieldDescriptor, FieldManager,
    FieldSchemaDeriver, FieldSet, InMemoryLocalStorage, MockCrmApi, RawFieldMetadata, RawRecord,
};

use crate::fixtures::{EntityTypeFixtures, MetadataFixtures, RecordFixtures};

/// Builder for CRM field metadata entries
pub struct RawFieldMetadataBuilder {
    meta: RawFieldMetadata,
}

impl RawFieldMetadataBuilder {
    /// Creates a builder for an untyped field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: RawFieldMetadata::new(name),
        }
    }

    /// Sets a numeric CRM type code
    pub fn with_type(self, code: u64) -> Self {
        self.with_raw_type(json!(code))
    }

    /// Sets a CRM type name such as "LongText"
    pub fn with_type_name(self, name: &str) -> Self {
        self.with_raw_type(json!(name))
    }

    /// Sets the type exactly as given
    pub fn with_raw_type(mut self, value: Value) -> Self {
        self.meta.type_code = Some(value);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    /// Marks the field as keyed into an option list
    pub fn pseudoconstant(self) -> Self {
        self.with_pseudoconstant(json!({"optionGroupName": "options"}))
    }

    pub fn with_pseudoconstant(mut self, value: Value) -> Self {
        self.meta.pseudoconstant = Some(value);
        self
    }

    pub fn required(self) -> Self {
        self.with_required(json!(1))
    }

    pub fn with_required(mut self, value: Value) -> Self {
        self.meta.required = Some(value);
        self
    }

    /// Marks the field as multi-valued
    pub fn serialized(mut self) -> Self {
        self.meta.serialize = Some(json!(1));
        self
    }

    pub fn build(self) -> RawFieldMetadata {
        self.meta
    }
}

/// A CRM storage wired to in-memory collaborators
pub struct StorageHarness {
    pub storage: CrmEntityStorage,
    pub crm: Arc<MockCrmApi>,
    pub local: Arc<InMemoryLocalStorage>,
    pub field_manager: Arc<FieldManager>,
    pub entity_type: EntityTypeDefinition,
}

impl StorageHarness {
    /// The complete field set of the harness entity type
    pub async fn field_set(&self) -> Result<Arc<FieldSet>, PortError> {
        self.field_manager.field_definitions(&self.entity_type).await
    }

    /// A new, empty entity of the harness entity type
    pub async fn new_entity(&self) -> Result<EntityInstance, PortError> {
        let fields = self.field_set().await?;
        Ok(EntityInstance::new(self.entity_type.id(), &fields))
    }
}

/// Builder for `StorageHarness`
pub struct StorageHarnessBuilder {
    entity_type: EntityTypeDefinition,
    fields: Vec<RawFieldMetadata>,
    options: Vec<(String, AllowedValues)>,
    records: Vec<RawRecord>,
    local_fields: Vec<FieldDescriptor>,
    timezone: Timezone,
}

impl StorageHarnessBuilder {
    /// Creates a builder for an entity type with no fields and no records
    pub fn new(entity_type: EntityTypeDefinition) -> Self {
        Self {
            entity_type,
            fields: Vec::new(),
            options: Vec::new(),
            records: Vec::new(),
            local_fields: Vec::new(),
            timezone: Timezone::default(),
        }
    }

    /// Contacts with the fixture metadata, options and two records
    pub fn contacts() -> Self {
        Self::new(EntityTypeFixtures::contact())
            .with_fields(MetadataFixtures::contact_fields())
            .with_options("prefix_id", MetadataFixtures::prefix_options())
            .with_record(RecordFixtures::contact_jane())
            .with_record(RecordFixtures::contact_john())
    }

    /// Events with the fixture metadata, options and one record
    pub fn events() -> Self {
        Self::new(EntityTypeFixtures::event())
            .with_fields(MetadataFixtures::event_fields())
            .with_options("event_type_id", MetadataFixtures::event_type_options())
            .with_record(RecordFixtures::event_conference())
    }

    pub fn with_fields(mut self, fields: Vec<RawFieldMetadata>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_options(mut self, field_name: impl Into<String>, options: AllowedValues) -> Self {
        self.options.push((field_name.into(), options));
        self
    }

    pub fn with_record(mut self, record: RawRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn without_records(mut self) -> Self {
        self.records.clear();
        self
    }

    /// Adds a framework-managed field to the entity type
    pub fn with_local_field(mut self, field: FieldDescriptor) -> Self {
        self.local_fields.push(field);
        self
    }

    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    pub async fn build(self) -> StorageHarness {
        let kind = self.entity_type.crm_entity().clone();

        let mut crm = MockCrmApi::new().with_fields(kind.clone(), self.fields).await;
        for (field_name, options) in self.options {
            crm = crm.with_options(kind.clone(), field_name, options).await;
        }
        let crm = Arc::new(crm.with_records(kind, self.records).await);
        let local = Arc::new(InMemoryLocalStorage::new());

        let mut field_manager = FieldManager::new(Arc::new(FieldSchemaDeriver::new(crm.clone())));
        for field in self.local_fields {
            field_manager = field_manager.with_local_field(self.entity_type.id(), field);
        }
        let field_manager = Arc::new(field_manager);

        let storage = CrmEntityStorage::new(
            self.entity_type.clone(),
            field_manager.clone(),
            local.clone(),
            crm.clone(),
        )
        .with_timezone(self.timezone);

        StorageHarness {
            storage,
            crm,
            local,
            field_manager,
            entity_type: self.entity_type,
        }
    }
}
