//! Virtual-clock timer queue.
//!
//! The scheduler never looks at a wall clock. Time moves only when the owner
//! advances it, which keeps timer-driven state machines deterministic.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Handle to a scheduled task. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// One-shot delayed tasks ordered by (deadline, insertion).
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, TimerId), T>,
    deadlines: HashMap<TimerId, Duration>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Queue `task` to run `delay` after the current time.
    ///
    /// A zero delay still queues; the task runs on the next advance.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let deadline = self.now + delay;
        self.queue.insert((deadline, id), task);
        self.deadlines.insert(id, deadline);
        id
    }

    /// Remove a pending task. Returns it if it had not run yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let deadline = self.deadlines.remove(&id)?;
        self.queue.remove(&(deadline, id))
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|&(deadline, _)| deadline)
    }

    /// Pop the earliest task due at or before `until`.
    ///
    /// The clock moves forward to the task's deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, T)> {
        let &(deadline, id) = self.queue.keys().next()?;
        if deadline > until {
            return None;
        }
        let task = self.queue.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        self.now = self.now.max(deadline);
        Some((id, task))
    }

    /// Move the clock forward to `until`. Never moves it backwards.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Scheduler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .finish()
    }
}
