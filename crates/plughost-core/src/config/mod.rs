//! Application configuration schemas.
//!
//! Configuration is deserialized via the `config` crate from an optional
//! default file, an optional environment overlay, and `PLUGHOST__*`
//! environment variables. Every section falls back to its defaults.

pub mod logging;
pub mod plugin;

use serde::{Deserialize, Serialize};

pub use self::logging::LoggingConfig;
pub use self::plugin::PluginConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Plugin discovery and loading settings.
    #[serde(default)]
    pub plugins: PluginConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for the given environment name.
    ///
    /// Merges `config/default`, the `config/{env}` overlay and environment
    /// variables prefixed with `PLUGHOST`. All files are optional.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PLUGHOST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.plugins.directory, "./plugins");
        assert_eq!(config.plugins.extension, "toml");
        assert!(config.plugins.allow_list.is_none());
        assert!(config.plugins.auto_load);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let config = AppConfig::load("does-not-exist").unwrap();
        assert_eq!(config.plugins.extension, "toml");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "plugins": { "directory": "/opt/plugins", "allow_list": ["Acme.Logger"] }
        }))
        .unwrap();

        assert_eq!(config.plugins.directory, "/opt/plugins");
        assert_eq!(config.plugins.extension, "toml");
        assert_eq!(
            config.plugins.allow_list,
            Some(vec!["Acme.Logger".to_string()])
        );
        assert_eq!(config.logging.level, "info");
    }
}
