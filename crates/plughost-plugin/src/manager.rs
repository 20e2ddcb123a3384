//! Plugin manager — registry, loading queue, dependency resolution and the
//! event bus behind one owner.
//!
//! A load cycle rebuilds the queue from the [`PluginSource`], runs each
//! pending init routine, and lets routines pull in their dependencies on
//! demand through [`PluginManager::depends`]. Re-entrant loads are tracked
//! with an explicit stack of load frames, one per routine on the call stack.
//!
//! Any error an init routine propagates aborts the cycle where it happens,
//! except `DuplicatePlugin`, which marks the identifier as already loaded.
//! Plugins registered before the failure stay registered and the queue
//! keeps its state; there is no rollback.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use plughost_core::AppResult;
use plughost_core::config::PluginConfig;
use plughost_core::error::{AppError, ErrorKind};

use crate::bus::dispatcher::EventBus;
use crate::bus::registry::Listener;
use crate::event::{Event, PluginsLoadingEvent};
use crate::plugin::{ExtraFields, IDENTIFIER_SEPARATOR, Plugin};
use crate::queue::{LoadingQueue, QueueState};
use crate::source::manifest::ManifestSource;
use crate::source::{InitRoutine, PluginSource};

/// One init routine currently executing.
#[derive(Debug)]
struct LoadFrame {
    identifier: String,
    /// Set once the routine has called `create_plugin`.
    registered: bool,
}

/// Owns every plugin, listener and the loading queue of one host.
#[derive(Debug)]
pub struct PluginManager {
    source: Box<dyn PluginSource>,
    plugins: HashMap<String, Plugin>,
    /// Plugin identifiers in registration order.
    order: Vec<String>,
    bus: EventBus,
    queue: LoadingQueue,
    frames: Vec<LoadFrame>,
}

impl PluginManager {
    /// Creates a manager over `source`. Nothing is loaded until
    /// [`load_plugins`](Self::load_plugins) runs.
    pub fn new(source: impl PluginSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            plugins: HashMap::new(),
            order: Vec::new(),
            bus: EventBus::new(),
            queue: LoadingQueue::default(),
            frames: Vec::new(),
        }
    }

    /// Creates a manager reading manifests from the configured directory.
    pub fn from_config(config: &PluginConfig) -> Self {
        Self::new(ManifestSource::from_config(config))
    }

    // ── Loading ──

    /// Runs one load cycle.
    ///
    /// Rebuilds the queue from the source, drops identifiers missing from
    /// `allow_list` (when given), loads every identifier still pending, then
    /// fires [`PluginsLoadingEvent`] (not cancellable).
    ///
    /// Identifiers are visited in the order the source enumerates them. For
    /// directory-backed sources that order is not deterministic.
    pub fn load_plugins(&mut self, allow_list: Option<&HashSet<String>>) -> AppResult<()> {
        if let Some(frame) = self.frames.last() {
            return Err(AppError::illegal_context(format!(
                "load_plugins called from the init routine of '{}'",
                frame.identifier
            )));
        }

        self.queue = LoadingQueue::from_identifiers(self.source.discover()?);
        if let Some(allow_list) = allow_list {
            self.queue.retain_allowed(allow_list);
        }

        if self.queue.is_empty() {
            debug!(filtered = allow_list.is_some(), "No plugins to load");
        } else {
            debug!(
                queued = self.queue.len(),
                filtered = allow_list.is_some(),
                "Built loading queue"
            );
        }

        let identifiers = self.queue.identifiers().to_vec();
        for identifier in &identifiers {
            if !self.queue.is_pending(identifier) {
                continue;
            }

            let Some(routine) = self.source.initializer(identifier) else {
                warn!(plugin_id = %identifier, "Plugin source has no init routine, skipping");
                self.queue.mark(identifier, QueueState::Loaded);
                continue;
            };

            if let Err(e) = self.load_plugin(identifier, routine) {
                error!(plugin_id = %identifier, error = %e, "Plugin loading aborted");
                return Err(e);
            }
        }

        info!(
            plugins = self.plugins.len(),
            queued = self.queue.len(),
            "Plugin loading complete"
        );

        let event = PluginsLoadingEvent::new(self.plugins().cloned().collect());
        self.call(&event, false)?;

        Ok(())
    }

    /// Runs one init routine and checks that it registered a plugin.
    fn load_plugin(&mut self, identifier: &str, routine: InitRoutine) -> AppResult<()> {
        debug!(plugin_id = %identifier, depth = self.frames.len(), "Loading plugin");

        self.queue.mark(identifier, QueueState::Loading);
        self.frames.push(LoadFrame {
            identifier: identifier.to_string(),
            registered: false,
        });

        let outcome = routine(self);

        let frame = self.frames.pop();
        self.queue.mark(identifier, QueueState::Loaded);

        match outcome {
            Ok(()) => {}
            Err(e) if e.kind == ErrorKind::DuplicatePlugin => {
                warn!(plugin_id = %identifier, reason = %e.message, "Plugin already loaded");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        match frame {
            Some(frame) if frame.registered => Ok(()),
            _ => Err(AppError::contract_violation(format!(
                "Plugin '{identifier}' did not register itself via create_plugin"
            ))),
        }
    }

    /// Declares that the plugin currently loading needs `identifier`.
    ///
    /// Must be called from an init routine after its `create_plugin` call.
    /// A pending dependency is loaded immediately, depth-first. A missing
    /// one fails with `MissingHardDependency` when `hard`, and is ignored
    /// otherwise.
    pub fn depends(&mut self, identifier: &str, hard: bool) -> AppResult<()> {
        let caller = match self.frames.last() {
            Some(frame) if frame.registered => frame.identifier.clone(),
            Some(frame) => {
                return Err(AppError::illegal_context(format!(
                    "'{}' called depends before create_plugin",
                    frame.identifier
                )));
            }
            None => {
                return Err(AppError::illegal_context(
                    "depends called outside a plugin init routine",
                ));
            }
        };

        match self.queue.state(identifier) {
            Some(QueueState::Loaded) => Ok(()),
            Some(QueueState::Loading) => Err(AppError::cyclic_dependency(format!(
                "Dependency cycle: {} -> {identifier}",
                self.loading_chain()
            ))),
            Some(QueueState::Pending) => match self.source.initializer(identifier) {
                Some(routine) => {
                    debug!(plugin_id = %caller, dependency = %identifier, "Resolving dependency");
                    self.load_plugin(identifier, routine)
                }
                None => self.missing_dependency(&caller, identifier, hard),
            },
            None => self.missing_dependency(&caller, identifier, hard),
        }
    }

    fn missing_dependency(&self, caller: &str, identifier: &str, hard: bool) -> AppResult<()> {
        if hard {
            return Err(AppError::missing_dependency(format!(
                "Plugin '{caller}' requires '{identifier}', which was not found"
            )));
        }
        debug!(plugin_id = %caller, dependency = %identifier, "Soft dependency not found, continuing");
        Ok(())
    }

    fn loading_chain(&self) -> String {
        self.frames
            .iter()
            .map(|frame| frame.identifier.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    // ── Registration ──

    /// Registers a new plugin. This is the only way to obtain a [`Plugin`].
    ///
    /// Fails with `Validation` when `author` or `name` is empty or contains
    /// the identifier separator, and with `DuplicatePlugin` when the
    /// identifier is taken. May also be called by
    /// the host outside a load cycle.
    pub fn create_plugin(
        &mut self,
        author: &str,
        name: &str,
        version: Option<&str>,
        extra_fields: ExtraFields,
    ) -> AppResult<&Plugin> {
        if author.is_empty() || name.is_empty() {
            return Err(AppError::validation(
                "Plugin author and name must not be empty",
            ));
        }
        if author.contains(IDENTIFIER_SEPARATOR) || name.contains(IDENTIFIER_SEPARATOR) {
            return Err(AppError::validation(format!(
                "Plugin author and name must not contain '{IDENTIFIER_SEPARATOR}'"
            )));
        }

        let identifier = Plugin::identifier_for(author, name);
        if self.plugins.contains_key(&identifier) {
            return Err(AppError::duplicate_plugin(format!(
                "Plugin '{identifier}' is already registered"
            )));
        }

        let plugin = Plugin::new(author, name, version, extra_fields, Uuid::new_v4());

        if let Some(frame) = self.frames.last_mut() {
            frame.registered = true;
        }

        info!(
            plugin_id = %identifier,
            version = plugin.version().unwrap_or("-"),
            "Registering plugin"
        );

        self.order.push(identifier.clone());
        Ok(&*self.plugins.entry(identifier).or_insert(plugin))
    }

    /// Checks that `plugin` was minted by this manager and is the record
    /// registered under its identifier.
    pub fn verify_plugin(&self, plugin: &Plugin) -> AppResult<()> {
        let identifier = plugin.identifier();
        let registered = self.plugins.get(&identifier).and_then(Plugin::token);

        match (plugin.token(), registered) {
            (Some(token), Some(expected)) if token == expected => Ok(()),
            _ => Err(AppError::unauthorized_construction(format!(
                "Plugin '{identifier}' was not created by this manager"
            ))),
        }
    }

    // ── Queries ──

    /// Plugin identifiers in registration order.
    pub fn get_plugin_ids(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Registered plugins in registration order.
    pub fn plugins(&self) -> impl Iterator<Item = &Plugin> {
        self.order.iter().filter_map(|id| self.plugins.get(id))
    }

    pub fn get_plugin(&self, identifier: &str) -> AppResult<&Plugin> {
        self.plugins
            .get(identifier)
            .ok_or_else(|| AppError::unknown_plugin(format!("Plugin '{identifier}' not found")))
    }

    /// `name`, `author` and `version` merged with the plugin's extra fields.
    /// See [`Plugin::data`] for key collisions.
    pub fn get_plugin_data(&self, identifier: &str) -> AppResult<HashMap<String, serde_json::Value>> {
        Ok(self.get_plugin(identifier)?.data())
    }

    pub fn has_plugin(&self, identifier: &str) -> bool {
        self.plugins.contains_key(identifier)
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Queue state of `identifier` in the most recent load cycle.
    pub fn queue_state(&self, identifier: &str) -> Option<QueueState> {
        self.queue.state(identifier)
    }

    // ── Events ──

    /// Subscribes `listener` to `event_name`. Registering the same `Arc`
    /// twice for one event fails with `DuplicateListener`.
    pub fn listen(&mut self, event_name: &str, listener: Arc<dyn Listener>) -> AppResult<()> {
        self.bus.listen(event_name, listener)
    }

    /// Fires `event`. See [`EventBus::call`].
    pub fn call(&self, event: &dyn Event, cancelable: bool) -> AppResult<bool> {
        self.bus.call(event, cancelable)
    }

    pub fn listener_count(&self, event_name: &str) -> usize {
        self.bus.registry().count(event_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::static_source::StaticSource;

    fn register(
        author: &'static str,
        name: &'static str,
    ) -> impl Fn(&mut PluginManager) -> AppResult<()> + Send + Sync + 'static {
        move |manager: &mut PluginManager| {
            manager.create_plugin(author, name, Some("1.0.0"), ExtraFields::new())?;
            Ok(())
        }
    }

    #[test]
    fn test_create_plugin() {
        let mut manager = PluginManager::new(StaticSource::new());
        let plugin = manager
            .create_plugin("Acme", "Logger", Some("1.0.0"), ExtraFields::new())
            .unwrap();
        assert_eq!(plugin.identifier(), "Acme.Logger");

        assert!(manager.has_plugin("Acme.Logger"));
        assert_eq!(manager.get_plugin("Acme.Logger").unwrap().identifier(), "Acme.Logger");
        assert_eq!(manager.get_plugin_ids(), vec!["Acme.Logger"]);
    }

    #[test]
    fn test_create_plugin_duplicate() {
        let mut manager = PluginManager::new(StaticSource::new());
        manager
            .create_plugin("Acme", "Logger", None, ExtraFields::new())
            .unwrap();

        let err = manager
            .create_plugin("Acme", "Logger", Some("2.0.0"), ExtraFields::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicatePlugin);
        assert_eq!(manager.plugin_count(), 1);
        assert_eq!(manager.get_plugin("Acme.Logger").unwrap().version(), None);
    }

    #[test]
    fn test_create_plugin_requires_author_and_name() {
        let mut manager = PluginManager::new(StaticSource::new());
        let err = manager
            .create_plugin("", "Logger", None, ExtraFields::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        let err = manager
            .create_plugin("Acme", "", None, ExtraFields::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_create_plugin_rejects_separator() {
        let mut manager = PluginManager::new(StaticSource::new());
        let err = manager
            .create_plugin("Acme.Core", "X", None, ExtraFields::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        let err = manager
            .create_plugin("Acme", "Core.X", None, ExtraFields::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        assert_eq!(manager.plugin_count(), 0);
        assert!(!manager.has_plugin("Acme.Core.X"));
    }

    #[test]
    fn test_verify_plugin() {
        let mut manager = PluginManager::new(StaticSource::new());
        let plugin = manager
            .create_plugin("Acme", "Logger", None, ExtraFields::new())
            .unwrap()
            .clone();
        manager.verify_plugin(&plugin).unwrap();

        let forged: Plugin = serde_json::from_value(serde_json::to_value(&plugin).unwrap()).unwrap();
        let err = manager.verify_plugin(&forged).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnauthorizedConstruction);

        let mut other = PluginManager::new(StaticSource::new());
        other
            .create_plugin("Acme", "Logger", None, ExtraFields::new())
            .unwrap();
        let err = other.verify_plugin(&plugin).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnauthorizedConstruction);
    }

    #[test]
    fn test_unknown_plugin() {
        let manager = PluginManager::new(StaticSource::new());
        assert!(!manager.has_plugin("Nobody.Here"));
        assert_eq!(
            manager.get_plugin("Nobody.Here").unwrap_err().kind,
            ErrorKind::UnknownPlugin
        );
        assert_eq!(
            manager.get_plugin_data("Nobody.Here").unwrap_err().kind,
            ErrorKind::UnknownPlugin
        );
    }

    #[test]
    fn test_load_registers_in_source_order() {
        let source = StaticSource::new()
            .with_plugin("Acme.Logger", register("Acme", "Logger"))
            .with_plugin("Acme.Core", register("Acme", "Core"));
        let mut manager = PluginManager::new(source);

        manager.load_plugins(None).unwrap();

        assert_eq!(manager.get_plugin_ids(), vec!["Acme.Logger", "Acme.Core"]);
        assert_eq!(manager.queue_state("Acme.Core"), Some(QueueState::Loaded));
    }

    #[test]
    fn test_contract_violation() {
        let source = StaticSource::new().with_plugin("Acme.Silent", |_| Ok(()));
        let mut manager = PluginManager::new(source);

        let err = manager.load_plugins(None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PluginContractViolation);
    }

    #[test]
    fn test_depends_before_create_plugin() {
        let source = StaticSource::new()
            .with_plugin("Acme.Eager", |manager| manager.depends("Acme.Core", true))
            .with_plugin("Acme.Core", register("Acme", "Core"));
        let mut manager = PluginManager::new(source);

        let err = manager.load_plugins(None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalContext);
        assert!(!manager.has_plugin("Acme.Core"));
    }

    #[test]
    fn test_depends_outside_load() {
        let mut manager = PluginManager::new(StaticSource::new());
        let err = manager.depends("Acme.Core", false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalContext);
    }

    #[test]
    fn test_load_plugins_not_reentrant() {
        let source = StaticSource::new().with_plugin("Acme.Nested", |manager| {
            manager.create_plugin("Acme", "Nested", None, ExtraFields::new())?;
            manager.load_plugins(None)
        });
        let mut manager = PluginManager::new(source);

        let err = manager.load_plugins(None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalContext);
    }

    #[test]
    fn test_duplicate_in_routine_counts_as_loaded() {
        let source = StaticSource::new()
            .with_plugin("Acme.Logger", register("Acme", "Logger"))
            .with_plugin("Acme.LoggerCopy", register("Acme", "Logger"));
        let mut manager = PluginManager::new(source);

        manager.load_plugins(None).unwrap();
        assert_eq!(manager.get_plugin_ids(), vec!["Acme.Logger"]);
        assert_eq!(manager.queue_state("Acme.LoggerCopy"), Some(QueueState::Loaded));
    }

    #[test]
    fn test_propagated_error_aborts_cycle() {
        let source = StaticSource::new()
            .with_plugin("A.a", |manager| {
                manager.create_plugin("A", "a", None, ExtraFields::new())?;
                manager.get_plugin("No.Such")?;
                Ok(())
            })
            .with_plugin("B.b", register("B", "b"));
        let mut manager = PluginManager::new(source);

        let err = manager.load_plugins(None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownPlugin);
        assert!(manager.has_plugin("A.a"));
        assert!(!manager.has_plugin("B.b"));
        assert_eq!(manager.queue_state("B.b"), Some(QueueState::Pending));
    }

    #[test]
    fn test_missing_routine_is_skipped() {
        #[derive(Debug)]
        struct Flaky;

        impl PluginSource for Flaky {
            fn discover(&self) -> AppResult<Vec<String>> {
                Ok(vec!["Acme.Gone".to_string()])
            }

            fn initializer(&self, _identifier: &str) -> Option<InitRoutine> {
                None
            }
        }

        let mut manager = PluginManager::new(Flaky);
        manager.load_plugins(None).unwrap();
        assert_eq!(manager.plugin_count(), 0);
    }
}
