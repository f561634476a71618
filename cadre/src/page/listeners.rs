//! Listener table keyed by (node, event name).

use std::rc::Rc;

use stagedom::{Event, NodeId};

use super::Page;

/// What a listener wants after it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Retain {
    /// Stay attached.
    #[default]
    Keep,
    /// Detach this listener.
    Remove,
}

/// Listener callback. Receives the page so it can mutate the document,
/// schedule timers and dispatch further events.
pub type Handler = Rc<dyn Fn(&mut Page, &Event) -> Retain>;

/// Handle returned by [`Page::listen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Entry {
    id: ListenerId,
    node: NodeId,
    event: String,
    handler: Handler,
}

/// Listeners in attach order.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: NodeId, event: impl Into<String>, handler: Handler) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push(Entry {
            id,
            node,
            event: event.into(),
            handler,
        });
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Snapshot of the handlers attached to `node` for `event`.
    pub fn handlers_for(&self, node: NodeId, event: &str) -> Vec<(ListenerId, Handler)> {
        self.entries
            .iter()
            .filter(|e| e.node == node && e.event == event)
            .map(|e| (e.id, Rc::clone(&e.handler)))
            .collect()
    }

    pub fn count(&self, node: NodeId, event: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.node == node && e.event == event)
            .count()
    }

}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
