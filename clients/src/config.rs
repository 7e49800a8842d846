//! `cmm.toml` handling and logging set-up.
//!
//! ```toml
//! [registry]
//! default_data_type = "d:text"
//!
//! [logging]
//! filter = "cmm_registry=debug,info"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use cmm_registry::RegistryConfig;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// File read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "cmm.toml";

/// Filter used when neither flag, file nor `RUST_LOG` sets one.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Contents of `cmm.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Registry tunables.
    pub registry: RegistryConfig,
    /// Logging options.
    pub logging: LoggingConfig,
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive.
    pub filter: Option<String>,
}

impl CliConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid cmm configuration")
    }

    /// Loads `path`, or [`DEFAULT_CONFIG_FILE`] if present, or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `path` cannot be read, or if the
    /// file that was read does not parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Path::new(DEFAULT_CONFIG_FILE),
            None => return Ok(Self::default()),
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("In {}", path.display()))
    }

    /// Picks the log filter: `--log`, then the file, then `RUST_LOG`,
    /// then [`DEFAULT_LOG_FILTER`].
    pub fn log_filter(&self, flag: Option<&str>) -> EnvFilter {
        let explicit = flag.or(self.logging.filter.as_deref());
        match explicit {
            Some(directive) => EnvFilter::new(directive),
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        }
    }
}

/// Installs the global subscriber, writing to stderr so stdout stays
/// clean for exported documents.
pub fn init_logging(filter: EnvFilter) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_sections() {
        let config = CliConfig::from_toml_str(
            "[registry]\ndefault_data_type = \"d:int\"\n\n[logging]\nfilter = \"debug\"\n",
        )
        .unwrap();
        assert_eq!(config.registry.default_data_type, "d:int");
        assert_eq!(config.logging.filter.as_deref(), Some("debug"));
    }

    #[test]
    fn empty_file_means_defaults() {
        assert_eq!(CliConfig::from_toml_str("").unwrap(), CliConfig::default());
    }

    #[test]
    fn unknown_section_is_rejected() {
        assert!(CliConfig::from_toml_str("[server]\nport = 1\n").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(CliConfig::load(Some(Path::new("/nonexistent/cmm.toml"))).is_err());
    }

    #[test]
    fn flag_beats_file() {
        let config = CliConfig {
            logging: LoggingConfig {
                filter: Some("warn".into()),
            },
            ..CliConfig::default()
        };
        assert_eq!(config.log_filter(Some("trace")).to_string(), "trace");
        assert_eq!(config.log_filter(None).to_string(), "warn");
    }
}
