//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for field descriptors and CRM
//! parameter maps that give more meaningful error messages than standard
//! assertions.

use serde_json::Value;

use domain_entity::{FieldDescriptor, FieldSet, RawRecord, SemanticType};

/// Asserts that a descriptor is the integer, read-only, unsigned identifier
pub fn assert_identifier_descriptor(field: &FieldDescriptor) {
    assert!(field.is_identifier(), "Expected the id field, got {}", field.name());
    assert_eq!(
        field.semantic_type(),
        SemanticType::Integer,
        "Identifier must be an integer, got {:?}",
        field.semantic_type()
    );
    assert!(field.is_read_only(), "Identifier must be read-only");
    assert!(field.is_unsigned(), "Identifier must be unsigned");
    assert!(!field.is_multiple(), "Identifier must be single-valued");
}

/// Asserts that a field exists with the given semantic type and returns it
pub fn assert_field_type<'a>(fields: &'a FieldSet, name: &str, expected: SemanticType) -> &'a FieldDescriptor {
    let field = fields
        .get(name)
        .unwrap_or_else(|| panic!("Field {} missing, have: {:?}", name, fields.names().collect::<Vec<_>>()));
    assert_eq!(
        field.semantic_type(),
        expected,
        "Field {} has type {:?}, expected {:?}",
        name,
        field.semantic_type(),
        expected
    );
    field
}

/// Asserts that a CRM parameter is present as a bare scalar
pub fn assert_bare_scalar(params: &RawRecord, name: &str) {
    match params.get(name) {
        Some(Value::Array(items)) => panic!("Param {} is a collection: {:?}", name, items),
        Some(Value::Object(map)) => panic!("Param {} is a map: {:?}", name, map),
        Some(Value::Null) | None => panic!("Param {} missing from {:?}", name, params),
        Some(_) => {}
    }
}

/// Asserts that a CRM parameter is absent
pub fn assert_param_absent(params: &RawRecord, name: &str) {
    assert!(
        !params.contains_key(name),
        "Param {} should be absent, got {:?}",
        name,
        params.get(name)
    );
}

/// Asserts that no boolean field of a set is required
pub fn assert_booleans_optional(fields: &FieldSet) {
    for field in fields.iter().filter(|f| f.semantic_type() == SemanticType::Boolean) {
        assert!(!field.is_required(), "Boolean field {} must not be required", field.name());
    }
}
