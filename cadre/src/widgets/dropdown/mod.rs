//! Dropdown widget.
//!
//! A dropdown root contains handles and expanders, paired by position. Each
//! pair moves between inactive and active through delayed transitions:
//!
//! ```text
//! Inactive -> PendingExpand -> Active -> PendingCollapse -> Inactive
//! ```
//!
//! Every completed transition may open a throttle window during which new
//! requests for that pair are dropped. A request in one direction always
//! cancels a pending transition in the other, so the last request wins.
//!
//! # Example
//!
//! ```ignore
//! let dropdowns = Dropdown::widget_type();
//! let menu = dropdowns.construct(&mut page, root);
//! menu.widget().expand(&mut page, 0, Duration::ZERO);
//! page.tick();
//! assert!(menu.widget().is_active(&page, 0));
//! ```

mod options;
mod timers;

pub use options::{DOCUMENT_SOURCE, DropdownOptions, TriggerSpec, Triggers};
pub use timers::{Decision, Direction, PairPhase, Request, TimerBank};

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use stagedom::{Document, Event, NodeId, Selector};

use crate::factory::{InstanceContext, Widget, WidgetType};
use crate::page::{Page, Retain};

/// Widget type name.
pub const NAME: &str = "dropdown";
/// Data key tagging handles and expanders with their pair index.
pub const INDEX_KEY: &str = "dropdown-index";
pub const EXPAND_EVENT: &str = "dropdownExpand";
pub const COLLAPSE_EVENT: &str = "dropdownCollapse";

struct DropdownInner {
    root: NodeId,
    options: DropdownOptions,
    handle_selector: Option<Selector>,
    expander_selector: Option<Selector>,
    timers: TimerBank,
}

/// Dropdown controller. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Dropdown {
    inner: Rc<RefCell<DropdownInner>>,
}

impl Widget for Dropdown {
    fn construct(page: &mut Page, cx: &InstanceContext) -> Self {
        let options = DropdownOptions::from_options(cx.options()).unwrap_or_else(|err| {
            log::warn!("[dropdown] {}; using built-in defaults", err);
            DropdownOptions::default()
        });

        let dropdown = Self {
            inner: Rc::new(RefCell::new(DropdownInner {
                root: cx.root(),
                handle_selector: parse_selector(&options.dropdown_handle_selector),
                expander_selector: parse_selector(&options.dropdown_expander_selector),
                options,
                timers: TimerBank::new(),
            })),
        };

        let handles = dropdown.handles(page);
        let expanders = dropdown.expanders(page);
        for (index, &handle) in handles.iter().enumerate() {
            let doc = page.document_mut();
            doc.set_data(handle, INDEX_KEY, index.to_string());
            if let Some(&expander) = expanders.get(index) {
                doc.set_data(expander, INDEX_KEY, index.to_string());
            }
        }

        dropdown.bind_on_triggers(page, &handles);
        dropdown.bind_toggle_triggers(page, &handles);
        dropdown.bind_hover(page, &expanders);

        log::debug!(
            "[dropdown] #{} bound {} pair(s) on {}",
            cx.index(),
            handles.len().min(expanders.len()),
            cx.root()
        );
        dropdown
    }
}

impl Dropdown {
    /// Dropdown widget type with the built-in default options.
    ///
    /// Each call defines a new type with its own instance registry. Define it
    /// once and share clones of the handle: two separate types would each
    /// build a dropdown on the same root and both react to every trigger.
    pub fn widget_type() -> WidgetType<Self> {
        let widget_type = WidgetType::define(NAME);
        widget_type.set_default_options(DropdownOptions::default().to_value());
        widget_type
    }

    /// Typed options this dropdown was built with.
    pub fn options(&self) -> DropdownOptions {
        self.inner.borrow().options.clone()
    }

    pub fn root(&self) -> NodeId {
        self.inner.borrow().root
    }

    // =========================================================================
    // Pairs
    // =========================================================================

    /// Handles in document order. Queried live.
    pub fn handles(&self, page: &Page) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        select(page.document(), inner.root, inner.handle_selector.as_ref())
    }

    /// Expanders in document order. Queried live.
    pub fn expanders(&self, page: &Page) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        select(page.document(), inner.root, inner.expander_selector.as_ref())
    }

    pub fn handle(&self, page: &Page, index: usize) -> Option<NodeId> {
        self.handles(page).get(index).copied()
    }

    pub fn expander(&self, page: &Page, index: usize) -> Option<NodeId> {
        self.expanders(page).get(index).copied()
    }

    pub fn pair_count(&self, page: &Page) -> usize {
        self.handles(page).len()
    }

    /// Whether pair `index` shows as active. The expander's class decides.
    pub fn is_active(&self, page: &Page, index: usize) -> bool {
        let class = self.inner.borrow().options.active_dropdown_class.clone();
        self.expander(page, index)
            .is_some_and(|expander| page.document().has_class(expander, &class))
    }

    pub fn phase(&self, page: &Page, index: usize) -> PairPhase {
        let active = self.is_active(page, index);
        self.inner.borrow().timers.phase(index, active)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    pub fn expand(&self, page: &mut Page, index: usize, delay: Duration) {
        self.set_state(page, index, delay, true);
    }

    pub fn collapse(&self, page: &mut Page, index: usize, delay: Duration) {
        self.set_state(page, index, delay, false);
    }

    /// Request that pair `index` become `active` after `delay`.
    ///
    /// A pending transition in the other direction is cancelled. The request
    /// is dropped while a throttle window is open or when the same transition
    /// is already pending. A zero delay still waits for the next tick.
    pub fn set_state(&self, page: &mut Page, index: usize, delay: Duration, active: bool) {
        let direction = Direction::from_active(active);
        let request = self.inner.borrow_mut().timers.request(index, direction);

        if let Some(superseded) = request.superseded {
            page.cancel(superseded);
            log::trace!("[dropdown] pair {} cancelled {:?}", index, direction.opposite());
        }

        if request.decision != Decision::Schedule {
            log::trace!(
                "[dropdown] pair {} {:?} dropped: {:?}",
                index,
                direction,
                request.decision
            );
            return;
        }

        let dropdown = self.clone();
        let timer = page.schedule(delay, move |page| dropdown.finish(page, index, direction));
        self.inner.borrow_mut().timers.arm(index, direction, timer);
    }

    /// Timer body: apply the transition, announce it, then open the
    /// throttle window.
    fn finish(&self, page: &mut Page, index: usize, direction: Direction) {
        let (class, throttle) = {
            let mut inner = self.inner.borrow_mut();
            inner.timers.complete(index, direction);
            (
                inner.options.active_dropdown_class.clone(),
                inner.options.throttle(),
            )
        };
        let active = direction.is_active();
        let handle = self.handle(page, index);
        let expander = self.expander(page, index);

        for node in [expander, handle].into_iter().flatten() {
            page.document_mut().toggle_class(node, &class, active);
        }

        log::debug!("[dropdown] pair {} -> {:?}", index, direction);

        if active {
            if let Some(expander) = expander {
                page.focus(expander);
            }
        }
        match handle {
            Some(handle) => page.trigger_with(handle, direction.event_name(), index),
            None => log::trace!("[dropdown] pair {} has no handle", index),
        }

        // Reactions to the transition above are not throttled.
        if !throttle.is_zero() {
            self.open_throttle(page, index, throttle);
        }
    }

    fn open_throttle(&self, page: &mut Page, index: usize, throttle: Duration) {
        let dropdown = self.clone();
        let window = page.schedule(throttle, move |_page| {
            // A replaced window is cancelled, so the one recorded is ours.
            let mut inner = dropdown.inner.borrow_mut();
            if let Some(window) = inner.timers.throttle(index) {
                inner.timers.release_throttle(index, window);
                log::trace!("[dropdown] pair {} throttle released", index);
            }
        });
        if let Some(previous) = self.inner.borrow_mut().timers.arm_throttle(index, window) {
            page.cancel(previous);
        }
    }

    // =========================================================================
    // Trigger wiring
    // =========================================================================

    fn trigger_sources(&self, page: &Page, spec: &TriggerSpec, handles: &[NodeId]) -> Vec<NodeId> {
        match spec.selector.as_deref() {
            None => handles.to_vec(),
            Some(DOCUMENT_SOURCE) => vec![page.document().root()],
            Some(raw) => parse_selector(raw)
                .map(|selector| page.document().select_all(&selector))
                .unwrap_or_default(),
        }
    }

    fn bind_on_triggers(&self, page: &mut Page, handles: &[NodeId]) {
        let on = self.inner.borrow().options.triggers.on.clone();
        for (name, spec) in &on {
            let delay = spec.delay();
            for source in self.trigger_sources(page, spec, handles) {
                let dropdown = self.clone();
                page.listen(source, name, move |page, event| {
                    let Some(index) = event_index(page.document(), event) else {
                        log::trace!("[dropdown] '{}' on {} has no pair", event.name, event.target);
                        return Retain::Keep;
                    };
                    let handle = dropdown.handle(page, index).unwrap_or(event.current_target);
                    dropdown.arm_off_triggers(page, index, handle);
                    dropdown.expand(page, index, delay);
                    Retain::Keep
                });
            }
        }
    }

    /// Attach the `off` triggers to `handle` for one use each.
    fn arm_off_triggers(&self, page: &mut Page, index: usize, handle: NodeId) {
        let off = self.inner.borrow().options.triggers.off.clone();
        for (name, spec) in off {
            let delay = spec.delay();
            let dropdown = self.clone();
            page.listen(handle, &name, move |page, event| {
                // Events coming from inside the expander don't count.
                if event.target != event.current_target
                    && dropdown.within_expander(page, index, event.target)
                {
                    return Retain::Keep;
                }
                dropdown.collapse(page, index, delay);
                Retain::Remove
            });
        }
    }

    fn bind_toggle_triggers(&self, page: &mut Page, handles: &[NodeId]) {
        let toggle = self.inner.borrow().options.triggers.toggle.clone();
        for (name, spec) in &toggle {
            let delay = spec.delay();
            for source in self.trigger_sources(page, spec, handles) {
                let dropdown = self.clone();
                page.listen(source, name, move |page, event| {
                    if let Some(index) = event_index(page.document(), event) {
                        let active = dropdown.is_active(page, index);
                        dropdown.set_state(page, index, delay, !active);
                    }
                    Retain::Keep
                });
            }
        }
    }

    /// Pointer over an expander keeps it open; leaving it closes it at once.
    fn bind_hover(&self, page: &mut Page, expanders: &[NodeId]) {
        for &expander in expanders {
            let dropdown = self.clone();
            page.listen(expander, "mouseover", move |page, event| {
                let Some(index) = index_of(page.document(), event.current_target) else {
                    return Retain::Keep;
                };
                let pending = dropdown
                    .inner
                    .borrow_mut()
                    .timers
                    .take(index, Direction::Collapse);
                let Some(timer) = pending else {
                    return Retain::Keep;
                };

                page.cancel(timer);
                log::trace!("[dropdown] pair {} collapse held by pointer", index);

                let dropdown = dropdown.clone();
                page.listen(event.current_target, "mouseleave", move |page, _event| {
                    dropdown.collapse(page, index, Duration::ZERO);
                    Retain::Remove
                });
                Retain::Keep
            });
        }
    }

    fn within_expander(&self, page: &Page, index: usize, target: NodeId) -> bool {
        if self.expander(page, index) == Some(target) {
            return true;
        }
        let inner = self.inner.borrow();
        let Some(selector) = inner.expander_selector.as_ref() else {
            return false;
        };
        let doc = page.document();
        doc.ancestors(target)
            .into_iter()
            .any(|node| selector.matches(doc, node))
    }
}

impl std::fmt::Debug for Dropdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Dropdown")
            .field("root", &inner.root)
            .field("options", &inner.options)
            .field("timers", &inner.timers)
            .finish()
    }
}

fn parse_selector(raw: &str) -> Option<Selector> {
    Selector::parse(raw)
        .map_err(|err| log::warn!("[dropdown] ignoring selector: {}", err))
        .ok()
}

fn select(doc: &Document, root: NodeId, selector: Option<&Selector>) -> Vec<NodeId> {
    selector
        .map(|selector| doc.select(root, selector))
        .unwrap_or_default()
}

fn index_of(doc: &Document, node: NodeId) -> Option<usize> {
    doc.data(node, INDEX_KEY)?.parse().ok()
}

/// Pair index for an event: its listener's node, else the nearest tagged
/// node at or above the target.
fn event_index(doc: &Document, event: &Event) -> Option<usize> {
    index_of(doc, event.current_target).or_else(|| {
        std::iter::once(event.target)
            .chain(doc.ancestors(event.target))
            .find_map(|node| index_of(doc, node))
    })
}
