//! Page runtime: one document plus everything that happens to it.
//!
//! A `Page` owns the document, focus, the listener table, the timer
//! scheduler and the template renderers. Everything runs on the thread that
//! owns the page; timers fire only when the page is advanced.

mod listeners;
mod scheduler;

pub use listeners::{Handler, ListenerId, Listeners, Retain};
pub use scheduler::{Scheduler, TimerId};

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use stagedom::{Document, Element, Event, FocusState, NodeId};

use crate::factory::Renderers;

/// A deferred unit of work run when its timer fires.
pub type Task = Box<dyn FnOnce(&mut Page)>;

/// Reports whether `node` is already past the point a special event marks.
///
/// Listeners attached for a special event on such a node run once, at
/// attach time. A hook returns `None` once its owner is gone; the page then
/// drops it.
pub type SpecialHook = Rc<dyn Fn(&Page, NodeId) -> Option<bool>>;

/// Identity of a page. Distinguishes node handles of different pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(u64);

impl PageId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

pub struct Page {
    id: PageId,
    document: Document,
    focus: FocusState,
    listeners: Listeners,
    specials: HashMap<String, Vec<SpecialHook>>,
    scheduler: Scheduler<Task>,
    renderers: Renderers,
}

impl Page {
    pub fn new(root: Element) -> Self {
        Self {
            id: PageId::next(),
            document: Document::new(root),
            focus: FocusState::new(),
            listeners: Listeners::new(),
            specials: HashMap::new(),
            scheduler: Scheduler::new(),
            renderers: Renderers::default(),
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn renderers(&self) -> &Renderers {
        &self.renderers
    }

    pub fn renderers_mut(&mut self) -> &mut Renderers {
        &mut self.renderers
    }

    /// Look up a node by its element id.
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.document.find_by_id(id)
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Attach `handler` for `event` on `node`.
    ///
    /// For special events whose hook reports `node` as already initialised,
    /// the handler also runs once right away.
    pub fn listen<F>(&mut self, node: NodeId, event: &str, handler: F) -> ListenerId
    where
        F: Fn(&mut Page, &Event) -> Retain + 'static,
    {
        let handler: Handler = Rc::new(handler);
        let id = self.listeners.add(node, event, Rc::clone(&handler));

        let hooks = self.specials.get(event).cloned().unwrap_or_default();
        let before = hooks.len();
        let mut late = false;
        let mut alive = Vec::with_capacity(before);
        for hook in hooks {
            if let Some(reached) = hook(self, node) {
                late |= reached;
                alive.push(hook);
            }
        }
        if alive.len() != before {
            log::trace!("[page] dropped {} stale hook(s) for '{}'", before - alive.len(), event);
            self.specials.insert(event.to_string(), alive);
        }

        if late {
            log::trace!("[page] late subscriber for '{}' on {}", event, node);
            let synthetic = Event::new(event, node);
            if handler(self, &synthetic) == Retain::Remove {
                self.listeners.remove(id);
            }
        }

        id
    }

    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.listeners.count(node, event)
    }

    /// Add a hook for `event`. A listener fires early if any hook for its
    /// event reports its node as reached.
    pub fn register_special(&mut self, event: impl Into<String>, hook: SpecialHook) {
        self.specials.entry(event.into()).or_default().push(hook);
    }

    /// Number of hooks registered for `event`.
    pub fn special_hooks(&self, event: &str) -> usize {
        self.specials.get(event).map_or(0, Vec::len)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Deliver `event` to its target and, if it bubbles, to each ancestor.
    ///
    /// Handlers attached during dispatch do not see the current event.
    /// Handlers detached by an earlier handler are skipped.
    pub fn dispatch(&mut self, event: Event) {
        let mut path = vec![event.target];
        if event.bubbles {
            path.extend(self.document.ancestors(event.target));
        }

        for node in path {
            let handlers = self.listeners.handlers_for(node, &event.name);
            if handlers.is_empty() {
                continue;
            }
            let mut current = event.clone();
            current.current_target = node;
            for (id, handler) in handlers {
                if !self.listeners.contains(id) {
                    continue;
                }
                if handler(self, &current) == Retain::Remove {
                    self.listeners.remove(id);
                }
            }
        }
    }

    pub fn trigger(&mut self, target: NodeId, name: &str) {
        self.dispatch(Event::new(name, target));
    }

    pub fn trigger_with(&mut self, target: NodeId, name: &str, payload: impl Into<Value>) {
        self.dispatch(Event::new(name, target).with_payload(payload));
    }

    pub fn click(&mut self, target: NodeId) {
        self.trigger(target, "click");
    }

    pub fn hover(&mut self, target: NodeId) {
        self.trigger(target, "mouseover");
    }

    pub fn leave(&mut self, target: NodeId) {
        self.trigger(target, "mouseleave");
    }

    // =========================================================================
    // Focus
    // =========================================================================

    pub fn focused(&self) -> Option<NodeId> {
        self.focus.focused()
    }

    /// Move focus to `target`, firing `blur` on the old node then `focus` on
    /// the new one. Non-focusable targets are ignored.
    pub fn focus(&mut self, target: NodeId) -> bool {
        let focusable = self.document.get(target).is_some_and(|n| n.focusable);
        if !focusable || self.focus.is_focused(target) {
            return false;
        }

        if let Some(old) = self.focus.blur() {
            self.trigger(old, "blur");
        }
        if !self.focus.focus(&self.document, target) {
            return false;
        }
        self.trigger(target, "focus");
        true
    }

    /// Clear focus, firing `blur` on the node that had it.
    pub fn blur(&mut self) -> bool {
        match self.focus.blur() {
            Some(old) => {
                self.trigger(old, "blur");
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Timers
    // =========================================================================

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn schedule<F>(&mut self, delay: Duration, task: F) -> TimerId
    where
        F: FnOnce(&mut Page) + 'static,
    {
        self.scheduler.schedule(delay, Box::new(task))
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.scheduler.cancel(id).is_some()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.scheduler.is_pending(id)
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.len()
    }

    /// Move virtual time forward by `by`, running every task that falls due,
    /// including tasks scheduled by tasks inside the window.
    pub fn advance(&mut self, by: Duration) {
        let until = self.scheduler.now() + by;
        while let Some((id, task)) = self.scheduler.pop_due(until) {
            log::trace!("[page] {} fired at {:?}", id, self.scheduler.now());
            task(self);
        }
        self.scheduler.advance_to(until);
    }

    /// Run tasks due now, e.g. zero-delay timers.
    pub fn tick(&mut self) {
        self.advance(Duration::ZERO);
    }

    /// Drive timers on the tokio clock until none remain.
    pub async fn run_until_idle(&mut self) {
        while let Some(deadline) = self.scheduler.next_deadline() {
            let wait = deadline.saturating_sub(self.scheduler.now());
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
            self.advance(wait);
        }
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.id)
            .field("nodes", &self.document.len())
            .field("focused", &self.focus.focused())
            .field("listeners", &self.listeners)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
