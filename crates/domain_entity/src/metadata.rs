//! Raw CRM field metadata
//!
//! The CRM describes each field of an entity kind with a loosely typed record:
//! a name, a type (usually a numeric code, sometimes a type name), and a
//! handful of flags that may arrive as booleans, numbers, or strings. This
//! module decodes those records without ever failing on unexpected content.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field metadata entry as returned by the CRM
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawFieldMetadata {
    pub name: String,

    /// Numeric type code or type name
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_code: Option<Value>,

    /// Present and truthy when the integer value keys into an option list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pseudoconstant: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Value>,

    /// Present and truthy for multi-valued fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialize: Option<Value>,
}

impl RawFieldMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Decoded CRM type, `None` when the metadata carries no explicit type
    pub fn crm_type(&self) -> Option<CrmTypeCode> {
        match self.type_code.as_ref()? {
            Value::Number(n) => match n.as_u64() {
                Some(0) => None,
                Some(code) => Some(CrmTypeCode::from_code(code)),
                None => Some(CrmTypeCode::Unrecognized(n.to_string())),
            },
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() || s == "0" {
                    None
                } else if let Ok(code) = s.parse::<u64>() {
                    Some(CrmTypeCode::from_code(code))
                } else {
                    Some(CrmTypeCode::from_name(s))
                }
            }
            Value::Null | Value::Bool(false) => None,
            other => Some(CrmTypeCode::Unrecognized(other.to_string())),
        }
    }

    pub fn is_pseudoconstant(&self) -> bool {
        self.pseudoconstant.as_ref().is_some_and(truthy)
    }

    pub fn is_required(&self) -> bool {
        self.required.as_ref().is_some_and(truthy)
    }

    pub fn is_serialized(&self) -> bool {
        self.serialize.as_ref().is_some_and(truthy)
    }
}

/// CRM field type
///
/// Numeric codes follow the CRM's type constants. The CRM gives `Enum` the
/// same code as `String` (2) and `LongText` the same code as `Text` (32), so
/// those two are only reachable through their type names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CrmTypeCode {
    Int,
    String,
    Enum,
    Date,
    Time,
    DateTime,
    Boolean,
    Text,
    LongText,
    Blob,
    Timestamp,
    Float,
    Money,
    Email,
    Url,
    CcNumber,
    MediumBlob,
    Unrecognized(String),
}

impl CrmTypeCode {
    pub const T_INT: u64 = 1;
    pub const T_STRING: u64 = 2;
    pub const T_DATE: u64 = 4;
    pub const T_TIME: u64 = 8;
    pub const T_BOOLEAN: u64 = 16;
    pub const T_TEXT: u64 = 32;
    pub const T_BLOB: u64 = 64;
    pub const T_TIMESTAMP: u64 = 256;
    pub const T_FLOAT: u64 = 512;
    pub const T_MONEY: u64 = 1024;
    pub const T_EMAIL: u64 = 2048;
    pub const T_URL: u64 = 4096;
    pub const T_CCNUM: u64 = 8192;
    pub const T_MEDIUMBLOB: u64 = 16384;

    pub fn from_code(code: u64) -> Self {
        match code {
            Self::T_INT => CrmTypeCode::Int,
            Self::T_STRING => CrmTypeCode::String,
            Self::T_DATE => CrmTypeCode::Date,
            Self::T_TIME => CrmTypeCode::Time,
            c if c == Self::T_DATE + Self::T_TIME => CrmTypeCode::DateTime,
            Self::T_BOOLEAN => CrmTypeCode::Boolean,
            Self::T_TEXT => CrmTypeCode::Text,
            Self::T_BLOB => CrmTypeCode::Blob,
            Self::T_TIMESTAMP => CrmTypeCode::Timestamp,
            Self::T_FLOAT => CrmTypeCode::Float,
            Self::T_MONEY => CrmTypeCode::Money,
            Self::T_EMAIL => CrmTypeCode::Email,
            Self::T_URL => CrmTypeCode::Url,
            Self::T_CCNUM => CrmTypeCode::CcNumber,
            Self::T_MEDIUMBLOB => CrmTypeCode::MediumBlob,
            other => CrmTypeCode::Unrecognized(other.to_string()),
        }
    }

    /// Decodes a type name, case-insensitively
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "int" | "integer" => CrmTypeCode::Int,
            "string" => CrmTypeCode::String,
            "enum" => CrmTypeCode::Enum,
            "date" => CrmTypeCode::Date,
            "time" => CrmTypeCode::Time,
            "datetime" => CrmTypeCode::DateTime,
            "boolean" | "bool" => CrmTypeCode::Boolean,
            "text" => CrmTypeCode::Text,
            "longtext" => CrmTypeCode::LongText,
            "blob" => CrmTypeCode::Blob,
            "timestamp" => CrmTypeCode::Timestamp,
            "float" => CrmTypeCode::Float,
            "money" => CrmTypeCode::Money,
            "email" => CrmTypeCode::Email,
            "url" | "link" => CrmTypeCode::Url,
            "ccnumber" | "ccnum" => CrmTypeCode::CcNumber,
            "mediumblob" => CrmTypeCode::MediumBlob,
            _ => CrmTypeCode::Unrecognized(name.to_string()),
        }
    }
}

/// Loose truthiness of CRM metadata flags
///
/// Absent, `null`, `false`, `0`, `""`, `"0"` and empty collections are false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
