//! Plugin system configuration.

use serde::{Deserialize, Serialize};

/// Plugin discovery and loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Directory scanned for plugin manifests.
    #[serde(default = "default_plugin_directory")]
    pub directory: String,
    /// File extension (without the dot) a manifest must carry.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// When set, only these identifiers are loaded.
    #[serde(default)]
    pub allow_list: Option<Vec<String>>,
    /// Whether to load plugins on startup.
    #[serde(default = "default_true")]
    pub auto_load: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: default_plugin_directory(),
            extension: default_extension(),
            allow_list: None,
            auto_load: true,
        }
    }
}

fn default_plugin_directory() -> String {
    "./plugins".to_string()
}

fn default_extension() -> String {
    "toml".to_string()
}

fn default_true() -> bool {
    true
}
