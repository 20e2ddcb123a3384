//! Listener registry — ordered listeners per event name.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use plughost_core::AppResult;
use plughost_core::error::AppError;

use crate::event::Event;

/// What a listener tells the dispatcher to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerAction {
    /// Continue to the next listener.
    Continue,
    /// Stop dispatch. Honoured only when the event is fired as cancellable.
    Cancel,
}

impl From<bool> for ListenerAction {
    /// `false` is the cancellation sentinel.
    fn from(proceed: bool) -> Self {
        if proceed { Self::Continue } else { Self::Cancel }
    }
}

/// Trait for event listener implementations.
pub trait Listener: Send + Sync {
    /// Handles one event. Errors propagate to the caller of the dispatch.
    fn handle(&self, event: &dyn Event) -> AppResult<ListenerAction>;

    /// Label used in log output.
    fn label(&self) -> &str {
        "listener"
    }
}

type ListenerFn = dyn Fn(&dyn Event) -> AppResult<ListenerAction> + Send + Sync;

/// A closure-based listener.
pub struct ClosureListener {
    label: String,
    handler: Box<ListenerFn>,
}

impl std::fmt::Debug for ClosureListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureListener")
            .field("label", &self.label)
            .field("handler", &"<closure>")
            .finish()
    }
}

impl ClosureListener {
    /// Creates a new closure-based listener.
    pub fn new<F>(label: &str, handler: F) -> Self
    where
        F: Fn(&dyn Event) -> AppResult<ListenerAction> + Send + Sync + 'static,
    {
        Self {
            label: label.to_string(),
            handler: Box::new(handler),
        }
    }

    /// Wraps a closure into an `Arc<dyn Listener>` ready for registration.
    pub fn wrap<F>(label: &str, handler: F) -> Arc<dyn Listener>
    where
        F: Fn(&dyn Event) -> AppResult<ListenerAction> + Send + Sync + 'static,
    {
        Arc::new(Self::new(label, handler))
    }
}

impl Listener for ClosureListener {
    fn handle(&self, event: &dyn Event) -> AppResult<ListenerAction> {
        (self.handler)(event)
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Registry of listeners organized by event name.
///
/// Listeners keep their registration order. Identity is the `Arc`
/// allocation: registering a clone of an already registered `Arc` under
/// the same event name is rejected.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: HashMap<String, Vec<Arc<dyn Listener>>>,
}

impl ListenerRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener for `event_name`.
    pub fn register(&mut self, event_name: &str, listener: Arc<dyn Listener>) -> AppResult<()> {
        let entries = self.listeners.entry(event_name.to_string()).or_default();

        if entries.iter().any(|existing| same_listener(existing, &listener)) {
            return Err(AppError::duplicate_listener(format!(
                "Listener '{}' is already registered for '{}'",
                listener.label(),
                event_name
            )));
        }

        debug!(
            event = %event_name,
            listener = %listener.label(),
            position = entries.len(),
            "Registered listener"
        );
        entries.push(listener);

        Ok(())
    }

    /// Listeners for `event_name`, in registration order.
    pub fn listeners(&self, event_name: &str) -> &[Arc<dyn Listener>] {
        self.listeners
            .get(event_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of listeners registered for `event_name`.
    pub fn count(&self, event_name: &str) -> usize {
        self.listeners(event_name).len()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.len()))
            .collect();
        f.debug_struct("ListenerRegistry")
            .field("listeners", &counts)
            .finish()
    }
}

fn same_listener(a: &Arc<dyn Listener>, b: &Arc<dyn Listener>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use plughost_core::ErrorKind;

    fn noop(label: &str) -> Arc<dyn Listener> {
        ClosureListener::wrap(label, |_| Ok(ListenerAction::Continue))
    }

    #[test]
    fn test_register_preserves_order() {
        let mut registry = ListenerRegistry::new();
        registry.register("x", noop("first")).unwrap();
        registry.register("x", noop("second")).unwrap();
        registry.register("x", noop("third")).unwrap();

        let labels: Vec<&str> = registry.listeners("x").iter().map(|l| l.label()).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_duplicate_listener_rejected() {
        let mut registry = ListenerRegistry::new();
        let listener = noop("once");
        registry.register("x", listener.clone()).unwrap();

        let err = registry.register("x", listener).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateListener);
        assert_eq!(registry.count("x"), 1);
    }

    #[test]
    fn test_same_listener_on_other_event() {
        let mut registry = ListenerRegistry::new();
        let listener = noop("shared");
        registry.register("x", listener.clone()).unwrap();
        registry.register("y", listener).unwrap();

        assert_eq!(registry.count("x"), 1);
        assert_eq!(registry.count("y"), 1);
    }

    #[test]
    fn test_unknown_event_has_no_listeners() {
        let registry = ListenerRegistry::new();
        assert!(registry.listeners("missing").is_empty());
        assert_eq!(registry.count("missing"), 0);
    }

    #[test]
    fn test_bool_sentinel() {
        assert_eq!(ListenerAction::from(true), ListenerAction::Continue);
        assert_eq!(ListenerAction::from(false), ListenerAction::Cancel);
    }
}
