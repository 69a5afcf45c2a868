//! Entity instances
//!
//! An `EntityInstance` is a dynamically keyed record conforming to the field
//! set of one entity type. Every field of the set is present as a (possibly
//! empty) `FieldItemList`, in field set order.

use std::sync::Arc;

use core_kernel::EntityId;

use crate::error::EntityError;
use crate::field::{FieldDescriptor, FieldSet, SemanticType, ID_FIELD};
use crate::value::FieldValue;

/// The values of one field on one entity
#[derive(Debug, Clone, PartialEq)]
pub struct FieldItemList {
    definition: Arc<FieldDescriptor>,
    items: Vec<FieldValue>,
}

impl FieldItemList {
    pub fn new(definition: Arc<FieldDescriptor>) -> Self {
        Self {
            definition,
            items: Vec::new(),
        }
    }

    pub fn definition(&self) -> &FieldDescriptor {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn items(&self) -> &[FieldValue] {
        &self.items
    }

    /// First item, the value of a single-valued field
    pub fn first(&self) -> Option<&FieldValue> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the list holds no non-empty item
    pub fn is_empty(&self) -> bool {
        self.items.iter().all(FieldValue::is_empty)
    }

    /// Drops empty items, keeping the order of the rest
    pub fn filter_empty_items(&mut self) {
        self.items.retain(|item| !item.is_empty());
    }

    pub(crate) fn set_items(&mut self, items: Vec<FieldValue>) {
        self.items = items;
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}

/// A typed record of a CRM-backed entity type
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInstance {
    entity_type_id: String,
    fields: Vec<FieldItemList>,
    enforce_is_new: bool,
}

impl EntityInstance {
    /// Creates an instance with every field of the set present and empty
    pub fn new(entity_type_id: impl Into<String>, field_set: &FieldSet) -> Self {
        Self {
            entity_type_id: entity_type_id.into(),
            fields: field_set
                .iter()
                .map(|definition| FieldItemList::new(Arc::clone(definition)))
                .collect(),
            enforce_is_new: false,
        }
    }

    pub fn entity_type_id(&self) -> &str {
        &self.entity_type_id
    }

    /// Identifier value, `None` until the entity has been saved to the CRM
    pub fn id(&self) -> Option<EntityId> {
        match self.get(ID_FIELD)?.first()? {
            FieldValue::Integer(id) => u64::try_from(*id).ok().map(EntityId::new),
            FieldValue::String(s) => s.trim().parse().ok(),
            FieldValue::Any(raw) => EntityId::from_json(raw),
            _ => None,
        }
    }

    pub fn set_id(&mut self, id: EntityId) -> Result<(), EntityError> {
        let value = i64::try_from(id.get()).map_err(|_| EntityError::TypeMismatch {
            field: ID_FIELD.to_string(),
            expected: SemanticType::Integer,
        })?;
        self.field_mut(ID_FIELD)
            .ok_or_else(|| EntityError::unknown_field(ID_FIELD))?
            .set_items(vec![FieldValue::Integer(value)]);
        Ok(())
    }

    /// True when the entity has not been persisted to the CRM yet
    pub fn is_new(&self) -> bool {
        self.enforce_is_new || self.id().is_none()
    }

    /// Forces the entity to be treated as new even when it carries an id
    pub fn enforce_is_new(&mut self, value: bool) {
        self.enforce_is_new = value;
    }

    pub fn get(&self, name: &str) -> Option<&FieldItemList> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// First value of a field
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.get(name)?.first()
    }

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut FieldItemList> {
        self.fields.iter_mut().find(|field| field.name() == name)
    }

    /// Replaces the values of a field
    ///
    /// Every value must match the field's semantic type and the number of
    /// values must fit its cardinality. Read-only fields, the identifier
    /// among them, are rejected; storage assigns ids through `set_id`.
    pub fn set(&mut self, name: &str, values: Vec<FieldValue>) -> Result<(), EntityError> {
        let field = self
            .field_mut(name)
            .ok_or_else(|| EntityError::unknown_field(name))?;
        let definition = field.definition();
        if definition.is_read_only() {
            return Err(EntityError::ReadOnly(name.to_string()));
        }

        if let Some(limit) = definition.cardinality().limit() {
            if values.len() > limit {
                return Err(EntityError::CardinalityExceeded {
                    field: name.to_string(),
                    limit,
                });
            }
        }

        let semantic_type = definition.semantic_type();
        if values.iter().any(|value| !value.matches(semantic_type)) {
            return Err(EntityError::TypeMismatch {
                field: name.to_string(),
                expected: semantic_type,
            });
        }

        field.set_items(values);
        Ok(())
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), EntityError> {
        self.set(name, vec![value.into()])
    }

    pub fn clear(&mut self, name: &str) -> Result<(), EntityError> {
        let field = self
            .field_mut(name)
            .ok_or_else(|| EntityError::unknown_field(name))?;
        if field.definition().is_read_only() {
            return Err(EntityError::ReadOnly(name.to_string()));
        }
        field.clear();
        Ok(())
    }

    /// Fields in field set order
    pub fn fields(&self) -> impl Iterator<Item = &FieldItemList> {
        self.fields.iter()
    }

    pub(crate) fn fields_mut(&mut self) -> impl Iterator<Item = &mut FieldItemList> {
        self.fields.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Cardinality;

    fn field_set() -> FieldSet {
        FieldSet::new(vec![
            FieldDescriptor::identifier(),
            FieldDescriptor::new("display_name", SemanticType::ShortText),
            FieldDescriptor::new("group_ids", SemanticType::Integer).with_cardinality(Cardinality::Multiple),
        ])
    }

    #[test]
    fn test_new_instance_has_every_field_empty() {
        let entity = EntityInstance::new("crm_contact", &field_set());
        let names: Vec<_> = entity.fields().map(|field| field.name()).collect();
        assert_eq!(names, vec!["id", "display_name", "group_ids"]);
        assert!(entity.fields().all(|field| field.is_empty()));
        assert!(entity.is_new());
        assert_eq!(entity.id(), None);
    }

    #[test]
    fn test_identity() {
        let mut entity = EntityInstance::new("crm_contact", &field_set());
        entity.set_id(EntityId::new(7)).unwrap();
        assert_eq!(entity.id(), Some(EntityId::new(7)));
        assert!(!entity.is_new());

        entity.enforce_is_new(true);
        assert!(entity.is_new());
    }

    #[test]
    fn test_set_validates_type_and_cardinality() {
        let mut entity = EntityInstance::new("crm_contact", &field_set());

        assert_eq!(
            entity.set_value("display_name", 5i64),
            Err(EntityError::TypeMismatch {
                field: "display_name".to_string(),
                expected: SemanticType::ShortText,
            })
        );
        assert_eq!(
            entity.set("display_name", vec!["a".into(), "b".into()]),
            Err(EntityError::CardinalityExceeded {
                field: "display_name".to_string(),
                limit: 1,
            })
        );
        assert_eq!(
            entity.set_value("nickname", "Bob"),
            Err(EntityError::UnknownField("nickname".to_string()))
        );

        entity.set("group_ids", vec![FieldValue::Integer(1), FieldValue::Integer(2), FieldValue::Integer(3)]).unwrap();
        assert_eq!(entity.get("group_ids").unwrap().len(), 3);
    }

    #[test]
    fn test_identifier_is_not_assignable() {
        let mut entity = EntityInstance::new("crm_contact", &field_set());
        entity.set_id(EntityId::new(7)).unwrap();

        assert_eq!(
            entity.set_value("id", 8i64),
            Err(EntityError::ReadOnly("id".to_string()))
        );
        assert_eq!(entity.clear("id"), Err(EntityError::ReadOnly("id".to_string())));
        assert_eq!(entity.id(), Some(EntityId::new(7)));
    }

    #[test]
    fn test_filter_empty_items() {
        let mut entity = EntityInstance::new("crm_contact", &field_set());
        entity.set_value("display_name", "").unwrap();
        assert!(entity.get("display_name").unwrap().is_empty());

        let field = entity.field_mut("display_name").unwrap();
        field.filter_empty_items();
        assert_eq!(field.len(), 0);
    }

    #[test]
    fn test_clear() {
        let mut entity = EntityInstance::new("crm_contact", &field_set());
        entity.set_value("display_name", "Alice").unwrap();
        entity.clear("display_name").unwrap();
        assert_eq!(entity.value("display_name"), None);
    }
}
