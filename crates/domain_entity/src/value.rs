//! Typed field values and their CRM wire representation
//!
//! Raw CRM records are untyped JSON maps. On load every raw value is decoded
//! according to the field's `SemanticType`; on save every typed value is
//! rendered back to JSON. Values that cannot be decoded into their declared
//! type are kept as `FieldValue::Any` rather than failing the load.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};
use tracing::warn;

use core_kernel::temporal::{
    format_storage_date, format_storage_datetime, normalize_crm_datetime,
    parse_storage_date, parse_storage_datetime,
};
use core_kernel::Timezone;

use crate::field::SemanticType;

/// Untyped field name to value mapping exchanged with the CRM API
pub type RawRecord = Map<String, Value>;

/// The main scalar of one field item
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Unix seconds
    Timestamp(i64),
    Map(Map<String, Value>),
    Any(Value),
}

impl FieldValue {
    /// True when the item carries no value worth storing
    ///
    /// `false` and `0` are real values; only empty strings and empty
    /// structures are empty.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::String(s) => s.is_empty(),
            FieldValue::Map(map) => map.is_empty(),
            FieldValue::Any(value) => is_empty_raw(value),
            _ => false,
        }
    }

    /// True when this value may be assigned to a field of the given type
    pub fn matches(&self, semantic_type: SemanticType) -> bool {
        match (semantic_type, self) {
            (SemanticType::Any, _) => true,
            (SemanticType::Integer | SemanticType::EnumeratedInteger, FieldValue::Integer(_)) => true,
            (SemanticType::Float, FieldValue::Float(_)) => true,
            (SemanticType::Boolean, FieldValue::Boolean(_)) => true,
            (
                SemanticType::ShortText | SemanticType::LongText | SemanticType::Email | SemanticType::Url,
                FieldValue::String(_),
            ) => true,
            (SemanticType::Date, FieldValue::Date(_)) => true,
            (SemanticType::DateTime, FieldValue::DateTime(_)) => true,
            (SemanticType::Timestamp, FieldValue::Timestamp(_)) => true,
            (SemanticType::Map, FieldValue::Map(_) | FieldValue::Any(_)) => true,
            _ => false,
        }
    }

    /// Renders the value in the representation the CRM accepts on write
    ///
    /// Dates and datetimes use the local storage formats.
    pub fn to_wire(&self) -> Value {
        match self {
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Date(date) => Value::String(format_storage_date(date)),
            FieldValue::DateTime(datetime) => Value::String(format_storage_datetime(datetime)),
            FieldValue::Timestamp(secs) => Value::from(*secs),
            FieldValue::Map(map) => Value::Object(map.clone()),
            FieldValue::Any(value) => value.clone(),
        }
    }

    /// Decodes one raw scalar according to the field's semantic type
    ///
    /// Returns `None` for `null`. Date and datetime input must already be in
    /// storage format (see `core_kernel::temporal::normalize_crm_datetime`).
    pub fn from_raw(semantic_type: SemanticType, raw: &Value, tz: &Timezone) -> Option<FieldValue> {
        if raw.is_null() {
            return None;
        }

        let decoded = match semantic_type {
            SemanticType::Integer | SemanticType::EnumeratedInteger => {
                raw_to_i64(raw).map(FieldValue::Integer)
            }
            SemanticType::Float => raw_to_f64(raw).map(FieldValue::Float),
            SemanticType::Boolean => raw_to_bool(raw).map(FieldValue::Boolean),
            SemanticType::ShortText
            | SemanticType::LongText
            | SemanticType::Email
            | SemanticType::Url => raw_to_string(raw).map(FieldValue::String),
            SemanticType::Date => raw
                .as_str()
                .and_then(|s| parse_storage_date(s).ok())
                .map(FieldValue::Date),
            SemanticType::DateTime => raw
                .as_str()
                .and_then(|s| parse_storage_datetime(s).ok())
                .map(FieldValue::DateTime),
            SemanticType::Timestamp => raw_to_timestamp(raw, tz).map(FieldValue::Timestamp),
            SemanticType::Map => match raw {
                Value::Object(map) => Some(FieldValue::Map(map.clone())),
                _ => None,
            },
            SemanticType::Any => Some(FieldValue::Any(raw.clone())),
        };

        Some(decoded.unwrap_or_else(|| {
            warn!(
                semantic_type = ?semantic_type,
                raw = %raw,
                "Raw CRM value does not match field type, keeping it untyped"
            );
            FieldValue::Any(raw.clone())
        }))
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            FieldValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::DateTime(value)
    }
}

/// Decodes a raw field value into its items
///
/// Arrays hold one item per element, except for structured types, where the
/// whole raw value is a single item.
pub fn decode_items(semantic_type: SemanticType, raw: &Value, tz: &Timezone) -> Vec<FieldValue> {
    match raw {
        Value::Array(elements) if !semantic_type.is_structured() => elements
            .iter()
            .filter_map(|element| FieldValue::from_raw(semantic_type, element, tz))
            .collect(),
        _ => FieldValue::from_raw(semantic_type, raw, tz).into_iter().collect(),
    }
}

/// True for raw values that carry nothing: null, "", [] and {}
pub fn is_empty_raw(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn raw_to_i64(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn raw_to_f64(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn raw_to_bool(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn raw_to_string(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

/// Numbers are Unix seconds; CRM datetime strings are converted in `tz`
fn raw_to_timestamp(raw: &Value, tz: &Timezone) -> Option<i64> {
    if let Some(secs) = raw_to_i64(raw) {
        return Some(secs);
    }
    let s = raw.as_str()?;
    let normalized = normalize_crm_datetime(s, tz).ok()?;
    let local = parse_storage_datetime(&normalized).ok()?;
    tz.to_timestamp(local).ok()
}
