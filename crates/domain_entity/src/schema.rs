//! Field Schema Deriver
//!
//! Derives the typed field set of a CRM entity kind by introspecting the
//! CRM's field metadata at runtime. Derivation is all-or-nothing: any failing
//! CRM call aborts it and the error reaches the caller unchanged.
//!
//! Nothing is cached; every call re-reads the metadata.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, EntityKind, EntityTypeDefinition, PortError};

use crate::field::{Cardinality, FieldDescriptor, FieldSet, SemanticType, EMAIL_MAX_LENGTH, ID_FIELD};
use crate::metadata::{CrmTypeCode, RawFieldMetadata};
use crate::ports::{CrmApi, FieldSchemaProvider};

/// Derives field descriptors from CRM field metadata
pub struct FieldSchemaDeriver {
    crm: Arc<dyn CrmApi>,
}

impl FieldSchemaDeriver {
    pub fn new(crm: Arc<dyn CrmApi>) -> Self {
        Self { crm }
    }

    /// Derives the ordered field set of an entity kind
    ///
    /// Issues one metadata call, plus one option-list call per
    /// pseudoconstant integer field, strictly in sequence.
    #[instrument(skip(self, entity), fields(entity = %entity))]
    pub async fn derive_fields(&self, entity: &EntityKind) -> Result<FieldSet, PortError> {
        let metadata = self.crm.get_fields(entity).await?;
        debug!(count = metadata.len(), "Fetched CRM field metadata");

        let mut fields = FieldSet::default();
        for meta in &metadata {
            fields.insert(self.derive_field(entity, meta).await?);
        }

        // Every entity kind is keyed by id, listed in the metadata or not
        if !fields.contains(ID_FIELD) {
            debug!("CRM metadata lists no identifier, adding it");
            fields.insert_first(FieldDescriptor::identifier());
        }
        Ok(fields)
    }

    async fn derive_field(&self, entity: &EntityKind, meta: &RawFieldMetadata) -> Result<FieldDescriptor, PortError> {
        if meta.name == ID_FIELD {
            return Ok(FieldDescriptor::identifier()
                .with_label(meta.title.clone().unwrap_or_default())
                .with_description(meta.description.clone().unwrap_or_default()));
        }

        let field = match meta.crm_type() {
            None => FieldDescriptor::new(&meta.name, SemanticType::ShortText),
            Some(CrmTypeCode::Int) if meta.is_pseudoconstant() => {
                let options = self.crm.get_options(entity, &meta.name).await?;
                debug!(field = %meta.name, options = options.len(), "Resolved option list");
                FieldDescriptor::new(&meta.name, SemanticType::EnumeratedInteger).with_allowed_values(options)
            }
            Some(code) => descriptor_for(&meta.name, &code),
        };

        let required = meta.is_required() && field.semantic_type() != SemanticType::Boolean;
        let cardinality = if meta.is_serialized() {
            Cardinality::Multiple
        } else {
            Cardinality::Single
        };

        Ok(field
            .with_label(meta.title.clone().unwrap_or_default())
            .with_description(meta.description.clone().unwrap_or_default())
            .with_required(required)
            .with_cardinality(cardinality))
    }
}

fn descriptor_for(name: &str, code: &CrmTypeCode) -> FieldDescriptor {
    let semantic_type = match code {
        CrmTypeCode::Int => SemanticType::Integer,
        CrmTypeCode::Boolean => SemanticType::Boolean,
        CrmTypeCode::Money | CrmTypeCode::Float => SemanticType::Float,
        CrmTypeCode::String | CrmTypeCode::Text | CrmTypeCode::CcNumber => SemanticType::ShortText,
        CrmTypeCode::LongText => SemanticType::LongText,
        CrmTypeCode::Email => {
            return FieldDescriptor::new(name, SemanticType::Email).with_max_length(EMAIL_MAX_LENGTH);
        }
        CrmTypeCode::Url => SemanticType::Url,
        CrmTypeCode::Date => SemanticType::Date,
        CrmTypeCode::Time | CrmTypeCode::DateTime => SemanticType::DateTime,
        CrmTypeCode::Enum => SemanticType::Map,
        CrmTypeCode::Timestamp => SemanticType::Timestamp,
        CrmTypeCode::Blob | CrmTypeCode::MediumBlob | CrmTypeCode::Unrecognized(_) => {
            debug!(field = name, code = ?code, "No typed mapping for CRM field type, using untyped field");
            SemanticType::Any
        }
    };
    FieldDescriptor::new(name, semantic_type)
}

impl DomainPort for FieldSchemaDeriver {}

#[async_trait]
impl FieldSchemaProvider for FieldSchemaDeriver {
    async fn base_field_definitions(&self, entity_type: &EntityTypeDefinition) -> Result<FieldSet, PortError> {
        self.derive_fields(entity_type.crm_entity()).await
    }
}
