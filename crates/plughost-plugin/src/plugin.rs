//! Plugin record — immutable metadata describing one loaded extension.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Separator placed between author and name in a plugin identifier.
pub const IDENTIFIER_SEPARATOR: &str = ".";

/// Author-supplied metadata attached to a plugin.
pub type ExtraFields = HashMap<String, serde_json::Value>;

/// An immutable record describing one loaded plugin.
///
/// Instances are only minted by [`PluginManager::create_plugin`]. Each one
/// carries the single-use creation token it was minted with; the token is
/// never serialized, so a record rebuilt from JSON fails
/// [`PluginManager::verify_plugin`].
///
/// [`PluginManager::create_plugin`]: crate::manager::PluginManager::create_plugin
/// [`PluginManager::verify_plugin`]: crate::manager::PluginManager::verify_plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plugin {
    author: String,
    name: String,
    version: Option<String>,
    #[serde(default)]
    extra_fields: ExtraFields,
    loaded_at: DateTime<Utc>,
    #[serde(skip)]
    token: Option<Uuid>,
}

impl Plugin {
    pub(crate) fn new(
        author: &str,
        name: &str,
        version: Option<&str>,
        extra_fields: ExtraFields,
        token: Uuid,
    ) -> Self {
        Self {
            author: author.to_string(),
            name: name.to_string(),
            version: version.map(str::to_string),
            extra_fields,
            loaded_at: Utc::now(),
            token: Some(token),
        }
    }

    /// Builds the identifier for an `(author, name)` pair, e.g. `"Acme.Logger"`.
    pub fn identifier_for(author: &str, name: &str) -> String {
        format!("{author}{IDENTIFIER_SEPARATOR}{name}")
    }

    /// Unique identifier of this plugin.
    pub fn identifier(&self) -> String {
        Self::identifier_for(&self.author, &self.name)
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn extra_fields(&self) -> &ExtraFields {
        &self.extra_fields
    }

    /// When the manager registered this plugin.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Flattened view of the plugin: `name`, `author`, `version`, then every
    /// extra field.
    ///
    /// Extra fields are applied last, so an extra field named `name`,
    /// `author` or `version` replaces the fixed value.
    pub fn data(&self) -> HashMap<String, serde_json::Value> {
        let mut data = HashMap::with_capacity(self.extra_fields.len() + 3);
        data.insert("name".to_string(), serde_json::json!(self.name));
        data.insert("author".to_string(), serde_json::json!(self.author));
        data.insert("version".to_string(), serde_json::json!(self.version));
        data.extend(self.extra_fields.clone());
        data
    }

    pub(crate) fn token(&self) -> Option<Uuid> {
        self.token
    }
}
