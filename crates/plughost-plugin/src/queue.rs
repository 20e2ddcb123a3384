//! Loading queue — discovered plugin identifiers and their load state.

use std::collections::{HashMap, HashSet};

/// Load state of one queued identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Discovered, init routine not yet run.
    Pending,
    /// Init routine currently on the stack.
    Loading,
    /// Init routine has returned.
    Loaded,
}

/// Per-load-cycle set of discovered identifiers, kept in discovery order.
#[derive(Debug, Clone, Default)]
pub struct LoadingQueue {
    order: Vec<String>,
    states: HashMap<String, QueueState>,
}

impl LoadingQueue {
    /// Builds a queue with every identifier pending. Repeated identifiers
    /// keep their first position.
    pub fn from_identifiers(identifiers: impl IntoIterator<Item = String>) -> Self {
        let mut queue = Self::default();
        for identifier in identifiers {
            if queue.states.contains_key(&identifier) {
                continue;
            }
            queue
                .states
                .insert(identifier.clone(), QueueState::Pending);
            queue.order.push(identifier);
        }
        queue
    }

    /// Drops every identifier not in `allow_list`.
    pub fn retain_allowed(&mut self, allow_list: &HashSet<String>) {
        self.order.retain(|identifier| allow_list.contains(identifier));
        self.states
            .retain(|identifier, _| allow_list.contains(identifier));
    }

    /// State of `identifier`, or `None` if it is not queued.
    pub fn state(&self, identifier: &str) -> Option<QueueState> {
        self.states.get(identifier).copied()
    }

    pub fn is_pending(&self, identifier: &str) -> bool {
        self.state(identifier) == Some(QueueState::Pending)
    }

    /// Sets the state of a queued identifier. Unknown identifiers are ignored.
    pub fn mark(&mut self, identifier: &str, state: QueueState) {
        if let Some(current) = self.states.get_mut(identifier) {
            *current = state;
        }
    }

    /// Queued identifiers in discovery order.
    pub fn identifiers(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_pending_in_order() {
        let queue = LoadingQueue::from_identifiers(ids(&["A.a", "B.b", "A.a"]));
        assert_eq!(queue.identifiers(), ids(&["A.a", "B.b"]).as_slice());
        assert!(queue.is_pending("A.a"));
        assert!(queue.is_pending("B.b"));
        assert_eq!(queue.state("C.c"), None);
    }

    #[test]
    fn test_retain_allowed() {
        let mut queue = LoadingQueue::from_identifiers(ids(&["A.a", "B.b", "C.c"]));
        let allow: HashSet<String> = ids(&["C.c", "A.a", "Z.z"]).into_iter().collect();
        queue.retain_allowed(&allow);

        assert_eq!(queue.identifiers(), ids(&["A.a", "C.c"]).as_slice());
        assert_eq!(queue.state("B.b"), None);
        assert_eq!(queue.state("Z.z"), None);
    }

    #[test]
    fn test_mark() {
        let mut queue = LoadingQueue::from_identifiers(ids(&["A.a"]));
        queue.mark("A.a", QueueState::Loading);
        assert_eq!(queue.state("A.a"), Some(QueueState::Loading));
        queue.mark("A.a", QueueState::Loaded);
        assert_eq!(queue.state("A.a"), Some(QueueState::Loaded));

        queue.mark("missing", QueueState::Loaded);
        assert_eq!(queue.state("missing"), None);
    }
}
