//! Compiled-in plugin source.

use std::sync::Arc;

use plughost_core::AppResult;

use super::{InitRoutine, PluginSource};
use crate::manager::PluginManager;

/// In-memory source with a fixed, ordered set of init routines.
///
/// Enumeration follows insertion order, which makes load order
/// deterministic.
#[derive(Clone, Default)]
pub struct StaticSource {
    entries: Vec<(String, InitRoutine)>,
}

impl StaticSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plugin. A later entry for the same identifier replaces the
    /// earlier routine but keeps its position.
    pub fn with_plugin<F>(mut self, identifier: &str, routine: F) -> Self
    where
        F: Fn(&mut PluginManager) -> AppResult<()> + Send + Sync + 'static,
    {
        let routine: InitRoutine = Arc::new(routine);
        match self.entries.iter_mut().find(|(id, _)| id == identifier) {
            Some(entry) => entry.1 = routine,
            None => self.entries.push((identifier.to_string(), routine)),
        }
        self
    }
}

impl PluginSource for StaticSource {
    fn discover(&self) -> AppResult<Vec<String>> {
        Ok(self.entries.iter().map(|(id, _)| id.clone()).collect())
    }

    fn initializer(&self, identifier: &str) -> Option<InitRoutine> {
        self.entries
            .iter()
            .find(|(id, _)| id == identifier)
            .map(|(_, routine)| routine.clone())
    }
}

impl std::fmt::Debug for StaticSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.entries.iter().map(|(id, _)| id.as_str()).collect();
        f.debug_struct("StaticSource")
            .field("plugins", &ids)
            .finish()
    }
}
