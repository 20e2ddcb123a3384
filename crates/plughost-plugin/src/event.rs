//! Events — anything with a stable name that can be dispatched on the bus.

use std::any::Any;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::plugin::Plugin;

/// A named occurrence dispatched to registered listeners.
pub trait Event: Send + Sync + 'static {
    /// Name identifying the event class. Listeners subscribe by this name.
    fn name(&self) -> &str;

    /// Upcast used by listeners to reach the concrete event type.
    fn as_any(&self) -> &dyn Any;
}

impl dyn Event {
    /// Returns the concrete event if it is of type `T`.
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Fired once after a load cycle drains the loading queue.
///
/// Carries a snapshot of every plugin the manager knows about at that point,
/// in registration order.
#[derive(Debug, Clone)]
pub struct PluginsLoadingEvent {
    plugins: Vec<Plugin>,
}

impl PluginsLoadingEvent {
    /// Event name.
    pub const NAME: &'static str = "plugins.loading";

    pub(crate) fn new(plugins: Vec<Plugin>) -> Self {
        Self { plugins }
    }

    /// Plugins known to the manager when the event fired.
    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    /// Identifiers of the known plugins, in registration order.
    pub fn plugin_ids(&self) -> Vec<String> {
        self.plugins.iter().map(Plugin::identifier).collect()
    }
}

impl Event for PluginsLoadingEvent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// General-purpose event for hosts: a name plus a key-value payload.
#[derive(Debug, Clone)]
pub struct NamedEvent {
    /// Event name.
    pub name: String,
    /// Arbitrary data keyed by string.
    pub data: HashMap<String, serde_json::Value>,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
}

impl NamedEvent {
    /// Creates an event with an empty payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Inserts a data value.
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    /// Inserts a string value.
    pub fn with_string(self, key: &str, value: &str) -> Self {
        self.with_data(key, serde_json::json!(value))
    }

    /// Gets a data value by key.
    pub fn get_data(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Gets a string data value.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }
}

impl Event for NamedEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
