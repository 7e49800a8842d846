//! Registry configuration.

use cmm_catalog::model::uris::D_TEXT;
use cmm_catalog::BuiltinCatalog;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::names::QualifiedName;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text does not describe a [`RegistryConfig`].
    #[error("failed to parse registry config: {0}")]
    Parse(#[from] toml::de::Error),

    /// `default_data_type` is not a known prefixed data type.
    #[error("default data type '{0}' is not a known prefixed data type")]
    InvalidDefaultDataType(String),
}

/// Tunables of a [`ModelRegistry`](crate::ModelRegistry).
///
/// ```
/// use cmm_registry::RegistryConfig;
///
/// let config = RegistryConfig::from_toml_str(r#"default_data_type = "d:mltext""#).unwrap();
/// assert_eq!(config.default_data_type, "d:mltext");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Data type given to properties declared without one.
    pub default_data_type: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_data_type: D_TEXT.to_owned(),
        }
    }
}

impl RegistryConfig {
    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml)?)
    }

    /// Checks the configuration against a catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDefaultDataType`] if the default data
    /// type is unqualified or unknown to `catalog`.
    pub fn validate(&self, catalog: &dyn BuiltinCatalog) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidDefaultDataType(self.default_data_type.clone());
        let name = QualifiedName::parse(&self.default_data_type).map_err(|_| invalid())?;
        catalog
            .resolve_data_type(&name.prefix, &name.local)
            .map(|_| ())
            .ok_or_else(invalid)
    }
}

#[cfg(test)]
mod tests {
    use cmm_catalog::Catalog;

    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = RegistryConfig::from_toml_str("").unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.default_data_type, "d:text");
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = RegistryConfig::from_toml_str("default_type = \"d:int\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validate_against_catalog() {
        let catalog = Catalog::standard();
        assert!(RegistryConfig::default().validate(catalog).is_ok());
        for bad in ["text", "d:money", "cm:text"] {
            let config = RegistryConfig {
                default_data_type: bad.into(),
            };
            assert!(
                matches!(
                    config.validate(catalog),
                    Err(ConfigError::InvalidDefaultDataType(_))
                ),
                "{bad} should be rejected"
            );
        }
    }
}
