//! Plugin sources — where the manager finds plugins and their init routines.
//!
//! A source enumerates the identifiers it can provide and, per identifier,
//! hands back the routine that registers that plugin with the manager.

pub mod manifest;
pub mod static_source;

use std::sync::Arc;

use plughost_core::AppResult;

use crate::manager::PluginManager;

/// A plugin's initialization routine.
///
/// It must call [`PluginManager::create_plugin`] exactly once for its own
/// record, and may then call [`PluginManager::depends`].
pub type InitRoutine = Arc<dyn Fn(&mut PluginManager) -> AppResult<()> + Send + Sync>;

/// Supplies plugin identifiers and init routines to a [`PluginManager`].
pub trait PluginSource: Send + Sync + std::fmt::Debug {
    /// Identifiers currently available. Order is source-defined.
    fn discover(&self) -> AppResult<Vec<String>>;

    /// Init routine for `identifier`, or `None` if the source cannot
    /// provide it (anymore).
    fn initializer(&self, identifier: &str) -> Option<InitRoutine>;
}
