//! Prelude for convenient imports.

pub use crate::bus::registry::{ClosureListener, Listener, ListenerAction};
pub use crate::event::{Event, NamedEvent, PluginsLoadingEvent};
pub use crate::manager::PluginManager;
pub use crate::plugin::{ExtraFields, Plugin};
pub use crate::source::static_source::StaticSource;
pub use crate::source::{InitRoutine, PluginSource};

pub use plughost_core::error::{AppError, ErrorKind};
pub use plughost_core::AppResult;

pub use crate::extra_fields;
