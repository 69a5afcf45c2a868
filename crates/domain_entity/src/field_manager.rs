//! Field definition manager
//!
//! Combines the base field definitions derived from the CRM with fields the
//! hosting framework stores itself (custom storage). Definitions are rebuilt
//! on every request.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, EntityTypeDefinition, PortError};

use crate::field::{FieldDescriptor, FieldSet};
use crate::ports::{EntityFieldManager, FieldSchemaProvider};

/// Entity metadata manager for CRM-backed entity types
pub struct FieldManager {
    provider: Arc<dyn FieldSchemaProvider>,
    local_fields: HashMap<String, Vec<FieldDescriptor>>,
}

impl FieldManager {
    pub fn new(provider: Arc<dyn FieldSchemaProvider>) -> Self {
        Self {
            provider,
            local_fields: HashMap::new(),
        }
    }

    /// Registers a framework-managed field for an entity type
    ///
    /// The field is marked as custom storage; the CRM never sees it.
    pub fn with_local_field(mut self, entity_type_id: impl Into<String>, field: FieldDescriptor) -> Self {
        self.local_fields
            .entry(entity_type_id.into())
            .or_default()
            .push(field.with_custom_storage());
        self
    }
}

impl DomainPort for FieldManager {}

#[async_trait]
impl EntityFieldManager for FieldManager {
    #[instrument(skip(self, entity_type), fields(entity_type = entity_type.id()))]
    async fn field_definitions(&self, entity_type: &EntityTypeDefinition) -> Result<Arc<FieldSet>, PortError> {
        let mut fields = self.provider.base_field_definitions(entity_type).await?;

        if let Some(local) = self.local_fields.get(entity_type.id()) {
            debug!(count = local.len(), "Adding framework-managed fields");
            fields.extend(local.iter().cloned());
        }

        Ok(Arc::new(fields))
    }
}
