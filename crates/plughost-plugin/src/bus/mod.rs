//! Event bus — listener registry and the dispatcher that fires events.

pub mod dispatcher;
pub mod registry;

pub use dispatcher::EventBus;
pub use registry::{ClosureListener, Listener, ListenerAction, ListenerRegistry};
