//! Directory source backed by TOML plugin manifests.
//!
//! Every file in the plugin directory carrying the configured extension is
//! one plugin; its identifier is the file stem. A manifest looks like:
//!
//! ```toml
//! author = "Acme"
//! name = "Logger"
//! version = "1.2.0"
//! depends = ["Acme.Core"]
//! soft_depends = ["Acme.Metrics"]
//!
//! [extra]
//! homepage = "https://acme.test"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use plughost_core::AppResult;
use plughost_core::config::PluginConfig;
use plughost_core::error::{AppError, ErrorKind};

use super::{InitRoutine, PluginSource};
use crate::manager::PluginManager;
use crate::plugin::ExtraFields;

/// Parsed plugin manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    pub author: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Hard dependencies, by identifier.
    #[serde(default)]
    pub depends: Vec<String>,
    /// Soft dependencies, by identifier.
    #[serde(default)]
    pub soft_depends: Vec<String>,
    #[serde(default)]
    pub extra: ExtraFields,
}

impl PluginManifest {
    /// Parses a manifest from TOML text.
    pub fn parse(contents: &str) -> AppResult<Self> {
        toml::from_str(contents).map_err(|e| {
            AppError::with_source(ErrorKind::Manifest, format!("Invalid manifest: {e}"), e)
        })
    }

    /// Reads and parses the manifest at `path`.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::with_source(
                ErrorKind::Manifest,
                format!("Failed to read manifest '{}': {e}", path.display()),
                e,
            )
        })?;
        Self::parse(&contents)
    }

    /// Registers the described plugin, then resolves its dependencies.
    pub fn apply(&self, manager: &mut PluginManager) -> AppResult<()> {
        manager.create_plugin(
            &self.author,
            &self.name,
            self.version.as_deref(),
            self.extra.clone(),
        )?;

        for dependency in &self.depends {
            manager.depends(dependency, true)?;
        }
        for dependency in &self.soft_depends {
            manager.depends(dependency, false)?;
        }

        Ok(())
    }
}

/// Scans one directory for plugin manifests.
///
/// Discovery order is the order the filesystem returns entries in and is
/// not deterministic. Dependencies declared in manifests are what fixes the
/// relative order of plugins that care about it.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    directory: PathBuf,
    extension: String,
}

impl ManifestSource {
    /// Creates a source over `directory` matching files with `extension`
    /// (given without the leading dot).
    pub fn new(directory: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            directory: directory.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Creates a source from the plugin configuration section.
    pub fn from_config(config: &PluginConfig) -> Self {
        Self::new(&config.directory, &config.extension)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn manifest_path(&self, identifier: &str) -> PathBuf {
        self.directory
            .join(format!("{identifier}.{}", self.extension))
    }
}

impl PluginSource for ManifestSource {
    fn discover(&self) -> AppResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.directory).map_err(|e| {
            AppError::with_source(
                ErrorKind::Discovery,
                format!(
                    "Failed to read plugin directory '{}': {e}",
                    self.directory.display()
                ),
                e,
            )
        })?;

        let mut identifiers = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) if !stem.is_empty() && !stem.starts_with('.') => {
                    identifiers.push(stem.to_string());
                }
                Some(_) => {}
                None => {
                    warn!(path = %path.display(), "Skipping manifest with non UTF-8 name");
                }
            }
        }

        debug!(
            directory = %self.directory.display(),
            count = identifiers.len(),
            "Discovered plugin manifests"
        );

        Ok(identifiers)
    }

    fn initializer(&self, identifier: &str) -> Option<InitRoutine> {
        let path = self.manifest_path(identifier);
        if !path.is_file() {
            return None;
        }

        Some(Arc::new(move |manager: &mut PluginManager| {
            PluginManifest::from_path(&path)?.apply(manager)
        }))
    }
}
