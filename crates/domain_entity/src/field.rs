//! Field descriptors
//!
//! A `FieldDescriptor` is the typed schema of one field of a CRM entity kind,
//! derived at runtime from the CRM's field metadata. Descriptors are grouped
//! into an ordered `FieldSet`; the order is the CRM's metadata order and
//! becomes the framework's field iteration order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Name of the identifier field present in every entity kind
pub const ID_FIELD: &str = "id";

/// Maximum length of email fields
pub const EMAIL_MAX_LENGTH: u32 = 255;

/// Semantic type of a field
///
/// Drives both decoding of raw CRM values and their serialization back to
/// the CRM. The identifier field is an `Integer` marked read-only and
/// unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    ShortText,
    LongText,
    Integer,
    /// Integer keyed into an option list (see `AllowedValues`)
    EnumeratedInteger,
    Boolean,
    /// Floats and money amounts
    Float,
    Email,
    Url,
    /// Date without time component
    Date,
    DateTime,
    Timestamp,
    /// Generic structured value with no further typing
    Map,
    /// Untyped escape hatch for unrecognized CRM types
    Any,
}

impl SemanticType {
    /// Framework field type name for this semantic type
    pub fn field_type(&self) -> &'static str {
        match self {
            SemanticType::ShortText => "string",
            SemanticType::LongText => "text_long",
            SemanticType::Integer => "integer",
            SemanticType::EnumeratedInteger => "list_integer",
            SemanticType::Boolean => "boolean",
            SemanticType::Float => "float",
            SemanticType::Email => "email",
            SemanticType::Url => "uri",
            SemanticType::Date | SemanticType::DateTime => "datetime",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Map => "map",
            SemanticType::Any => "any",
        }
    }

    /// True for the date and datetime types that need CRM date reconciliation
    pub fn is_date(&self) -> bool {
        matches!(self, SemanticType::Date | SemanticType::DateTime)
    }

    /// True for types whose raw value is a structure rather than a list of scalars
    pub fn is_structured(&self) -> bool {
        matches!(self, SemanticType::Map | SemanticType::Any)
    }
}

/// Whether a field holds one value or a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    #[default]
    Single,
    Multiple,
}

impl Cardinality {
    /// Maximum number of values, `None` for unlimited
    pub fn limit(&self) -> Option<usize> {
        match self {
            Cardinality::Single => Some(1),
            Cardinality::Multiple => None,
        }
    }
}

/// Ordered mapping of raw CRM option value to display label
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowedValues(Vec<(String, String)>);

impl AllowedValues {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self(entries)
    }

    /// Returns the label for a raw option value
    pub fn label(&self, value: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == value)
            .map(|(_, label)| label.as_str())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.label(value).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, label)| (key.as_str(), label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AllowedValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Typed schema of one field of an entity kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    name: String,
    semantic_type: SemanticType,
    #[serde(default)]
    cardinality: Cardinality,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    read_only: bool,
    #[serde(default)]
    unsigned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    allowed_values: Option<AllowedValues>,
    #[serde(default)]
    label: String,
    #[serde(default)]
    description: String,
    /// Stored by the hosting framework rather than the CRM
    #[serde(default)]
    custom_storage: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            cardinality: Cardinality::Single,
            required: false,
            read_only: false,
            unsigned: false,
            max_length: None,
            allowed_values: None,
            label: String::new(),
            description: String::new(),
            custom_storage: false,
        }
    }

    /// The identifier descriptor: integer, read-only, unsigned
    pub fn identifier() -> Self {
        Self::new(ID_FIELD, SemanticType::Integer)
            .read_only()
            .unsigned()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_allowed_values(mut self, allowed_values: AllowedValues) -> Self {
        self.allowed_values = Some(allowed_values);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Marks the field as stored by the hosting framework, not the CRM
    pub fn with_custom_storage(mut self) -> Self {
        self.custom_storage = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn semantic_type(&self) -> SemanticType {
        self.semantic_type
    }

    /// Framework field type name
    pub fn field_type(&self) -> &'static str {
        self.semantic_type.field_type()
    }

    /// Framework `datetime_type` setting for date fields
    pub fn datetime_type(&self) -> Option<&'static str> {
        match self.semantic_type {
            SemanticType::Date => Some("date"),
            SemanticType::DateTime => Some("datetime"),
            _ => None,
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn is_multiple(&self) -> bool {
        self.cardinality == Cardinality::Multiple
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }

    pub fn max_length(&self) -> Option<u32> {
        self.max_length
    }

    pub fn allowed_values(&self) -> Option<&AllowedValues> {
        self.allowed_values.as_ref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn has_custom_storage(&self) -> bool {
        self.custom_storage
    }

    pub fn is_identifier(&self) -> bool {
        self.name == ID_FIELD
    }
}

/// Ordered set of field descriptors for one entity kind
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    fields: Vec<Arc<FieldDescriptor>>,
}

impl FieldSet {
    /// Builds a set in the given order
    ///
    /// A later descriptor with an already-seen name replaces the earlier one
    /// in its original position.
    pub fn new(fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        let mut set = Self::default();
        for field in fields {
            set.insert(field);
        }
        set
    }

    pub fn insert(&mut self, field: FieldDescriptor) {
        match self.fields.iter_mut().find(|existing| existing.name() == field.name()) {
            Some(existing) => *existing = Arc::new(field),
            None => self.fields.push(Arc::new(field)),
        }
    }

    /// Inserts a descriptor at the front, replacing any with the same name
    pub fn insert_first(&mut self, field: FieldDescriptor) {
        self.fields.retain(|existing| existing.name() != field.name());
        self.fields.insert(0, Arc::new(field));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<FieldDescriptor>> {
        self.fields.iter().find(|field| field.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<FieldDescriptor>> {
        self.fields.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Extend<FieldDescriptor> for FieldSet {
    fn extend<I: IntoIterator<Item = FieldDescriptor>>(&mut self, iter: I) {
        for field in iter {
            self.insert(field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_descriptor() {
        let id = FieldDescriptor::identifier();
        assert_eq!(id.name(), ID_FIELD);
        assert_eq!(id.semantic_type(), SemanticType::Integer);
        assert!(id.is_read_only());
        assert!(id.is_unsigned());
        assert!(id.is_identifier());
        assert_eq!(id.cardinality(), Cardinality::Single);
    }

    #[test]
    fn test_framework_field_types() {
        assert_eq!(SemanticType::EnumeratedInteger.field_type(), "list_integer");
        assert_eq!(SemanticType::LongText.field_type(), "text_long");
        assert_eq!(SemanticType::Url.field_type(), "uri");

        let date = FieldDescriptor::new("birth_date", SemanticType::Date);
        assert_eq!(date.field_type(), "datetime");
        assert_eq!(date.datetime_type(), Some("date"));
        assert_eq!(FieldDescriptor::new("x", SemanticType::Integer).datetime_type(), None);
    }

    #[test]
    fn test_allowed_values_keep_order() {
        let values: AllowedValues = vec![("2", "Household"), ("1", "Individual"), ("3", "Organization")]
            .into_iter()
            .collect();

        let keys: Vec<_> = values.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["2", "1", "3"]);
        assert_eq!(values.label("1"), Some("Individual"));
        assert!(!values.contains("4"));
    }

    #[test]
    fn test_field_set_replaces_duplicates_in_place() {
        let set = FieldSet::new(vec![
            FieldDescriptor::identifier(),
            FieldDescriptor::new("name", SemanticType::ShortText),
            FieldDescriptor::new("age", SemanticType::Integer),
            FieldDescriptor::new("name", SemanticType::LongText),
        ]);

        let names: Vec<_> = set.names().collect();
        assert_eq!(names, vec!["id", "name", "age"]);
        assert_eq!(set.get("name").unwrap().semantic_type(), SemanticType::LongText);
    }

    #[test]
    fn test_insert_first_moves_field_to_front() {
        let mut set = FieldSet::new(vec![
            FieldDescriptor::new("name", SemanticType::ShortText),
            FieldDescriptor::new("age", SemanticType::Integer),
        ]);

        set.insert_first(FieldDescriptor::identifier());
        set.insert_first(FieldDescriptor::new("age", SemanticType::Float));

        let names: Vec<_> = set.names().collect();
        assert_eq!(names, vec!["age", "id", "name"]);
        assert_eq!(set.get("age").unwrap().semantic_type(), SemanticType::Float);
    }

    #[test]
    fn test_cardinality_limit() {
        assert_eq!(Cardinality::Single.limit(), Some(1));
        assert_eq!(Cardinality::Multiple.limit(), None);
    }

    #[test]
    fn test_descriptor_serializes() {
        let field = FieldDescriptor::new("email", SemanticType::Email)
            .with_max_length(EMAIL_MAX_LENGTH)
            .with_label("Email");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["semantic_type"], "email");
        assert_eq!(json["max_length"], 255);
        assert_eq!(json["label"], "Email");
    }
}
