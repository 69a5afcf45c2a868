//! Bridge configuration
//!
//! Configuration is layered: an optional file (TOML, JSON, ...) first, then
//! environment variables prefixed with `CRM_BRIDGE_`. Nested keys use a double
//! underscore, e.g. `CRM_BRIDGE_TIMEZONE=Europe/Berlin`.
//!
//! ```toml
//! timezone = "Europe/Berlin"
//!
//! [[entity_types]]
//! id = "crm_contact"
//! crm_entity = "Contact"
//! label = "CRM Contact"
//! ```

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::CoreError;
use crate::registry::{EntityTypeDefinition, EntityTypeRegistry};
use crate::temporal::Timezone;

/// Bridge configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BridgeConfig {
    /// Site timezone used to interpret CRM timestamps
    #[serde(default)]
    pub timezone: Timezone,

    /// Framework entity types backed by the CRM
    #[serde(default)]
    pub entity_types: Vec<EntityTypeDefinition>,
}

impl BridgeConfig {
    /// Environment variable prefix
    pub const ENV_PREFIX: &'static str = "CRM_BRIDGE";

    /// Loads configuration from an optional file and the environment
    ///
    /// A `.env` file in the working directory is read first, if present.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(Self::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Parses configuration from an inline TOML document
    pub fn from_toml(source: &str) -> Result<Self, CoreError> {
        let config = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Builds the entity type registry declared by this configuration
    pub fn registry(&self) -> Result<EntityTypeRegistry, CoreError> {
        EntityTypeRegistry::new(self.entity_types.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml() {
        let config = BridgeConfig::from_toml(
            r#"
            timezone = "Europe/Berlin"

            [[entity_types]]
            id = "crm_contact"
            crm_entity = "Contact"
            label = "CRM Contact"

            [[entity_types]]
            id = "crm_event"
            crm_entity = "Event"
            "#,
        )
        .unwrap();

        assert_eq!(config.timezone, Timezone::new(chrono_tz::Europe::Berlin));
        assert_eq!(config.entity_types.len(), 2);

        let registry = config.registry().unwrap();
        assert_eq!(registry.get("crm_contact").unwrap().label(), "CRM Contact");
        assert_eq!(registry.get("crm_event").unwrap().crm_entity().as_str(), "Event");
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::from_toml("").unwrap();
        assert_eq!(config.timezone, Timezone::default());
        assert!(config.entity_types.is_empty());
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let result = BridgeConfig::from_toml(r#"timezone = "Nowhere/Special""#);
        assert!(matches!(result, Err(CoreError::ConfigSource(_))));
    }

    #[test]
    fn test_duplicate_entity_types_rejected_by_registry() {
        let config = BridgeConfig::from_toml(
            r#"
            [[entity_types]]
            id = "crm_contact"
            crm_entity = "Contact"

            [[entity_types]]
            id = "crm_contact"
            crm_entity = "Individual"
            "#,
        )
        .unwrap();

        assert!(matches!(config.registry(), Err(CoreError::Configuration(_))));
    }
}
