//! # plughost-plugin
//!
//! Plugin runtime for plughost. Provides:
//!
//! - An immutable [`Plugin`] record that only a [`PluginManager`] can mint
//! - A loading queue with on-demand, depth-first dependency resolution
//! - A listener registry and an event bus with optional cancellation
//! - Plugin sources: compiled-in ([`StaticSource`]) and TOML manifests
//!   discovered on disk ([`ManifestSource`])

pub mod bus;
pub mod event;
pub mod macros;
pub mod manager;
pub mod plugin;
pub mod prelude;
pub mod queue;
pub mod source;

pub use bus::dispatcher::EventBus;
pub use bus::registry::{ClosureListener, Listener, ListenerAction, ListenerRegistry};
pub use event::{Event, NamedEvent, PluginsLoadingEvent};
pub use manager::PluginManager;
pub use plugin::{ExtraFields, Plugin};
pub use source::manifest::{ManifestSource, PluginManifest};
pub use source::static_source::StaticSource;
pub use source::{InitRoutine, PluginSource};
