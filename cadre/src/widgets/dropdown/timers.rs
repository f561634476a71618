//! Per-pair transition timers.
//!
//! The bank holds, per pair index, at most one pending expand timer, one
//! pending collapse timer and one throttle timer, with expand and collapse
//! mutually exclusive. It only records timer handles; scheduling and
//! cancelling on the page is the caller's job, driven by the bank's answers.

use std::collections::HashMap;

use crate::page::TimerId;

/// Direction of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Expand,
    Collapse,
}

impl Direction {
    pub fn from_active(active: bool) -> Self {
        if active { Self::Expand } else { Self::Collapse }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Expand => Self::Collapse,
            Self::Collapse => Self::Expand,
        }
    }

    /// Whether the pair is active once this transition completes.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Expand)
    }

    /// Event emitted on the handle when the transition completes.
    pub fn event_name(self) -> &'static str {
        match self {
            Self::Expand => super::EXPAND_EVENT,
            Self::Collapse => super::COLLAPSE_EVENT,
        }
    }
}

/// Observable state of one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairPhase {
    Inactive,
    PendingExpand,
    Active,
    PendingCollapse,
    /// A cooldown is running; new requests are dropped.
    Throttled,
}

/// What the bank decided about a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Schedule a timer and [`arm`](TimerBank::arm) it.
    Schedule,
    /// Dropped: a throttle window is open.
    Throttled,
    /// Dropped: the same transition is already pending.
    AlreadyPending,
}

/// Outcome of [`TimerBank::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    /// Opposite-direction timer that was superseded. Cancel it on the page.
    pub superseded: Option<TimerId>,
    pub decision: Decision,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Slots {
    expand: Option<TimerId>,
    collapse: Option<TimerId>,
    throttle: Option<TimerId>,
}

impl Slots {
    fn slot(&mut self, direction: Direction) -> &mut Option<TimerId> {
        match direction {
            Direction::Expand => &mut self.expand,
            Direction::Collapse => &mut self.collapse,
        }
    }

    fn get(&self, direction: Direction) -> Option<TimerId> {
        match direction {
            Direction::Expand => self.expand,
            Direction::Collapse => self.collapse,
        }
    }

    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Default)]
pub struct TimerBank {
    slots: HashMap<usize, Slots>,
}

impl TimerBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask to move pair `index` in `direction`.
    ///
    /// The opposite pending timer is always released, even when the request
    /// itself is dropped.
    pub fn request(&mut self, index: usize, direction: Direction) -> Request {
        let slots = self.slots.entry(index).or_default();
        let superseded = slots.slot(direction.opposite()).take();

        let decision = if slots.throttle.is_some() {
            Decision::Throttled
        } else if slots.get(direction).is_some() {
            Decision::AlreadyPending
        } else {
            Decision::Schedule
        };

        Request {
            superseded,
            decision,
        }
    }

    /// Record the timer scheduled for an accepted request.
    pub fn arm(&mut self, index: usize, direction: Direction, timer: TimerId) {
        *self.slots.entry(index).or_default().slot(direction) = Some(timer);
    }

    /// Clear a transition timer that fired.
    pub fn complete(&mut self, index: usize, direction: Direction) -> Option<TimerId> {
        self.take(index, direction)
    }

    /// Remove and return the pending timer for `direction`, if any.
    pub fn take(&mut self, index: usize, direction: Direction) -> Option<TimerId> {
        let slots = self.slots.get_mut(&index)?;
        let timer = slots.slot(direction).take();
        self.prune(index);
        timer
    }

    /// Record a throttle window. Returns the window it replaces, if any.
    pub fn arm_throttle(&mut self, index: usize, timer: TimerId) -> Option<TimerId> {
        self.slots.entry(index).or_default().throttle.replace(timer)
    }

    /// Close the throttle window opened by `timer`.
    pub fn release_throttle(&mut self, index: usize, timer: TimerId) -> bool {
        let Some(slots) = self.slots.get_mut(&index) else {
            return false;
        };
        if slots.throttle != Some(timer) {
            return false;
        }
        slots.throttle = None;
        self.prune(index);
        true
    }

    pub fn pending(&self, index: usize, direction: Direction) -> Option<TimerId> {
        self.slots.get(&index).and_then(|s| s.get(direction))
    }

    pub fn throttle(&self, index: usize) -> Option<TimerId> {
        self.slots.get(&index).and_then(|s| s.throttle)
    }

    /// Phase of pair `index`, given whether it currently shows as active.
    pub fn phase(&self, index: usize, active: bool) -> PairPhase {
        let slots = self.slots.get(&index).copied().unwrap_or_default();
        if slots.throttle.is_some() {
            PairPhase::Throttled
        } else if slots.expand.is_some() {
            PairPhase::PendingExpand
        } else if slots.collapse.is_some() {
            PairPhase::PendingCollapse
        } else if active {
            PairPhase::Active
        } else {
            PairPhase::Inactive
        }
    }

    /// True when no timer of any kind is pending.
    pub fn is_idle(&self) -> bool {
        self.slots.is_empty()
    }

    fn prune(&mut self, index: usize) {
        if self.slots.get(&index).is_some_and(Slots::is_empty) {
            self.slots.remove(&index);
        }
    }
}
