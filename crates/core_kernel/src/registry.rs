//! Entity Type Registry
//!
//! This module keeps the set of framework entity types that are backed by
//! the CRM, each mapped to the CRM entity kind it reads from and writes to.
//! The registry is built once from configuration and is immutable afterwards.
//!
//! # Usage
//!
//! ```rust
//! use core_kernel::registry::EntityTypeRegistryBuilder;
//!
//! let registry = EntityTypeRegistryBuilder::new()
//!     .with_entity_type("crm_contact", "Contact")
//!     .with_entity_type("crm_event", "Event")
//!     .build()
//!     .unwrap();
//!
//! let contact = registry.get("crm_contact").unwrap();
//! assert_eq!(contact.crm_entity().as_str(), "Contact");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identifiers::EntityKind;

/// A framework entity type backed by a CRM entity kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTypeDefinition {
    /// Framework-side entity type id (e.g. "crm_contact")
    pub id: String,

    /// CRM entity kind the type reads from and writes to
    pub crm_entity: EntityKind,

    /// Human-readable label
    #[serde(default)]
    pub label: Option<String>,
}

impl EntityTypeDefinition {
    pub fn new(id: impl Into<String>, crm_entity: impl Into<EntityKind>) -> Self {
        Self {
            id: id.into(),
            crm_entity: crm_entity.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn crm_entity(&self) -> &EntityKind {
        &self.crm_entity
    }

    /// Returns the label, falling back to the CRM entity name
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.crm_entity.as_str())
    }
}

/// Immutable lookup of CRM-backed entity types
#[derive(Debug, Clone, Default)]
pub struct EntityTypeRegistry {
    types: Vec<EntityTypeDefinition>,
}

impl EntityTypeRegistry {
    /// Creates a registry, rejecting duplicate entity type ids
    pub fn new(types: Vec<EntityTypeDefinition>) -> Result<Self, CoreError> {
        for (index, definition) in types.iter().enumerate() {
            if definition.id.trim().is_empty() {
                return Err(CoreError::configuration("entity type id must not be empty"));
            }
            if types[..index].iter().any(|other| other.id == definition.id) {
                return Err(CoreError::configuration(format!(
                    "duplicate entity type id '{}'",
                    definition.id
                )));
            }
        }
        Ok(Self { types })
    }

    /// Returns the definition for a framework entity type id
    pub fn get(&self, id: &str) -> Result<&EntityTypeDefinition, CoreError> {
        self.types
            .iter()
            .find(|definition| definition.id == id)
            .ok_or_else(|| CoreError::not_found(format!("entity type '{}'", id)))
    }

    /// Returns the first entity type backed by the given CRM entity kind
    pub fn find_by_crm_entity(&self, kind: &EntityKind) -> Option<&EntityTypeDefinition> {
        self.types.iter().find(|definition| &definition.crm_entity == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityTypeDefinition> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Builder for creating entity type registries
#[derive(Debug, Default)]
pub struct EntityTypeRegistryBuilder {
    types: Vec<EntityTypeDefinition>,
}

impl EntityTypeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity type backed by the given CRM entity kind
    pub fn with_entity_type(mut self, id: impl Into<String>, crm_entity: impl Into<EntityKind>) -> Self {
        self.types.push(EntityTypeDefinition::new(id, crm_entity));
        self
    }

    /// Registers a fully specified definition
    pub fn with_definition(mut self, definition: EntityTypeDefinition) -> Self {
        self.types.push(definition);
        self
    }

    pub fn build(self) -> Result<EntityTypeRegistry, CoreError> {
        EntityTypeRegistry::new(self.types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_registers_types() {
        let registry = EntityTypeRegistryBuilder::new()
            .with_entity_type("crm_contact", "Contact")
            .with_definition(EntityTypeDefinition::new("crm_event", "Event").with_label("Events"))
            .build()
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("crm_event").unwrap().label(), "Events");
        assert_eq!(registry.get("crm_contact").unwrap().label(), "Contact");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = EntityTypeRegistryBuilder::new()
            .with_entity_type("crm_contact", "Contact")
            .with_entity_type("crm_contact", "Individual")
            .build();

        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_empty_id_rejected() {
        let result = EntityTypeRegistryBuilder::new()
            .with_entity_type("  ", "Contact")
            .build();

        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_unknown_type_not_found() {
        let registry = EntityTypeRegistry::default();
        assert!(registry.is_empty());
        assert!(matches!(registry.get("crm_contact"), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn test_find_by_crm_entity() {
        let registry = EntityTypeRegistryBuilder::new()
            .with_entity_type("crm_event", "Event")
            .build()
            .unwrap();

        let found = registry.find_by_crm_entity(&EntityKind::from("Event")).unwrap();
        assert_eq!(found.id(), "crm_event");
        assert!(registry.find_by_crm_entity(&EntityKind::from("Contact")).is_none());
    }
}
