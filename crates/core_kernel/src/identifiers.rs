//! Strongly-typed identifiers for CRM records and entity kinds
//!
//! CRM records are keyed by unsigned integers, and entity kinds by the CRM's
//! entity name. Newtype wrappers keep the two from being mixed up with other
//! integers and strings flowing through the bridge.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Identifier of a record stored in the CRM
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates an identifier from its raw CRM value
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw CRM value
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Reads an identifier from a raw CRM value
    ///
    /// The CRM returns identifiers either as JSON numbers or as numeric
    /// strings. Anything else (including negative or fractional numbers)
    /// yields `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
                .map(Self),
            Value::String(s) => s.trim().parse().ok().map(Self),
            _ => None,
        }
    }

    /// Returns the identifier as a raw CRM value
    pub fn to_json(&self) -> Value {
        Value::from(self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> u64 {
        id.0
    }
}

/// Name of a CRM record category (e.g. "Contact", "Event")
///
/// Selects both the CRM API resource and the field metadata set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKind(String);

impl EntityKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKind {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for EntityKind {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_id_display() {
        let id = EntityId::new(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_entity_id_parsing() {
        let parsed: EntityId = " 17 ".parse().unwrap();
        assert_eq!(parsed, EntityId::new(17));
        assert!("abc".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_entity_id_from_json() {
        assert_eq!(EntityId::from_json(&json!(5)), Some(EntityId::new(5)));
        assert_eq!(EntityId::from_json(&json!("12")), Some(EntityId::new(12)));
        assert_eq!(EntityId::from_json(&json!(3.0)), Some(EntityId::new(3)));
        assert_eq!(EntityId::from_json(&json!(-1)), None);
        assert_eq!(EntityId::from_json(&json!(2.5)), None);
        assert_eq!(EntityId::from_json(&json!(null)), None);
        assert_eq!(EntityId::from_json(&json!("")), None);
    }

    #[test]
    fn test_entity_kind_display() {
        let kind = EntityKind::from("Contact");
        assert_eq!(kind.to_string(), "Contact");
        assert_eq!(kind.as_str(), "Contact");
    }
}
