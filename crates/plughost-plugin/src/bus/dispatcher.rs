//! Event dispatcher — fires events at their listeners in registration order.
//!
//! For cancellable dispatches:
//! - If a listener returns `Cancel`, dispatch stops and the remaining
//!   listeners are not invoked.
//!
//! For non-cancellable dispatches:
//! - `Cancel` is ignored and every listener runs.
//!
//! A listener's own error stops dispatch and propagates to the caller.

use std::sync::Arc;

use tracing::{debug, info, warn};

use plughost_core::AppResult;

use super::registry::{Listener, ListenerAction, ListenerRegistry};
use crate::event::Event;

/// Listener registry plus dispatch.
#[derive(Debug, Default)]
pub struct EventBus {
    registry: ListenerRegistry,
}

impl EventBus {
    /// Creates a bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `listener` to `event_name`.
    pub fn listen(&mut self, event_name: &str, listener: Arc<dyn Listener>) -> AppResult<()> {
        self.registry.register(event_name, listener)
    }

    /// Fires `event`.
    ///
    /// Returns `Ok(false)` only when `cancelable` is set and a listener
    /// cancelled; `Ok(true)` otherwise, including when nobody listens.
    pub fn call(&self, event: &dyn Event, cancelable: bool) -> AppResult<bool> {
        let listeners = self.registry.listeners(event.name());

        if listeners.is_empty() {
            return Ok(true);
        }

        debug!(
            event = %event.name(),
            listener_count = listeners.len(),
            cancelable,
            "Dispatching event"
        );

        for listener in listeners {
            match listener.handle(event)? {
                ListenerAction::Continue => {}
                ListenerAction::Cancel if cancelable => {
                    info!(
                        event = %event.name(),
                        listener = %listener.label(),
                        "Listener cancelled event"
                    );
                    return Ok(false);
                }
                ListenerAction::Cancel => {
                    warn!(
                        event = %event.name(),
                        listener = %listener.label(),
                        "Listener cancelled a non-cancellable event, ignoring"
                    );
                }
            }
        }

        Ok(true)
    }

    /// Returns the listener registry.
    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use plughost_core::ErrorKind;
    use plughost_core::error::AppError;

    use crate::bus::registry::ClosureListener;
    use crate::event::NamedEvent;

    fn recording(
        log: &Arc<Mutex<Vec<&'static str>>>,
        label: &'static str,
        action: ListenerAction,
    ) -> Arc<dyn Listener> {
        let log = log.clone();
        ClosureListener::wrap(label, move |_| {
            log.lock().unwrap().push(label);
            Ok(action)
        })
    }

    fn three_listeners(log: &Arc<Mutex<Vec<&'static str>>>) -> EventBus {
        let mut bus = EventBus::new();
        bus.listen("x", recording(log, "one", ListenerAction::Continue))
            .unwrap();
        bus.listen("x", recording(log, "two", ListenerAction::Cancel))
            .unwrap();
        bus.listen("x", recording(log, "three", ListenerAction::Continue))
            .unwrap();
        bus
    }

    #[test]
    fn test_no_listeners_proceeds() {
        let bus = EventBus::new();
        assert!(bus.call(&NamedEvent::new("nobody"), true).unwrap());
    }

    #[test]
    fn test_cancelable_stops_at_cancel() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = three_listeners(&log);

        let proceeded = bus.call(&NamedEvent::new("x"), true).unwrap();
        assert!(!proceeded);
        assert_eq!(*log.lock().unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn test_non_cancelable_ignores_cancel() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = three_listeners(&log);

        let proceeded = bus.call(&NamedEvent::new("x"), false).unwrap();
        assert!(proceeded);
        assert_eq!(*log.lock().unwrap(), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_listener_error_propagates() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.listen(
            "x",
            ClosureListener::wrap("broken", |_| Err(AppError::listener("boom"))),
        )
        .unwrap();
        bus.listen("x", recording(&log, "after", ListenerAction::Continue))
            .unwrap();

        let err = bus.call(&NamedEvent::new("x"), false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Listener);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_listener_sees_event_payload() {
        let seen = Arc::new(Mutex::new(None));
        let mut bus = EventBus::new();
        let sink = seen.clone();
        bus.listen(
            "user.login",
            ClosureListener::wrap("capture", move |event| {
                let user = event
                    .downcast_ref::<NamedEvent>()
                    .and_then(|e| e.get_string("user"))
                    .map(str::to_string);
                *sink.lock().unwrap() = user;
                Ok(ListenerAction::Continue)
            }),
        )
        .unwrap();

        let event = NamedEvent::new("user.login").with_string("user", "alice");
        assert!(bus.call(&event, true).unwrap());
        assert_eq!(seen.lock().unwrap().as_deref(), Some("alice"));
    }
}
