//! # Runtime events emitted by the task runner.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Runner events**: run loop start/stop and stop requests
//! - **Task events**: activation, cleanup, failure, transition waits and signals
//! - **Subscriber events**: delivery problems inside the fan-out set
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task
//! name, task index, transition target and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use tickvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TransitionSignaled)
//!     .with_task("chop")
//!     .with_index(2)
//!     .with_target(3);
//!
//! assert_eq!(ev.kind, EventKind::TransitionSignaled);
//! assert_eq!(ev.task.as_deref(), Some("chop"));
//! assert_eq!(ev.target, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Runner events ===
    /// Run loop entered the running state.
    ///
    /// Sets:
    /// - `index`: number of tasks in the sequence
    RunnerStarted,

    /// `stop()` was requested while the runner was active.
    ///
    /// Sets:
    /// - `index`: current index at the time of the request
    StopRequested,

    /// Run loop exited and final cleanup finished.
    ///
    /// Sets:
    /// - `index`: current index at exit
    /// - `reason`: failure message (only when the run ended on a task failure)
    RunnerStopped,

    // === Task events ===
    /// Task became the active task.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `index`: task index
    TaskActivated,

    /// Task `cleanup()` finished; it is no longer active.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `index`: task index
    TaskCleanedUp,

    /// Task returned `AwaitSignal`; the loop is suspended until a transition arrives.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `index`: task index
    TransitionAwaited,

    /// A pending transition wait was settled.
    ///
    /// Sets:
    /// - `index`: current index
    /// - `target`: index that becomes current next
    TransitionSignaled,

    /// Task failed; the run terminates.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `index`: task index
    /// - `reason`: failure message
    TaskFailed,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task (or subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Task index, if applicable.
    pub index: Option<usize>,
    /// Transition target index, if applicable.
    pub target: Option<usize>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            index: None,
            target: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a task index.
    #[inline]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Attaches a transition target.
    #[inline]
    pub fn with_target(mut self, target: usize) -> Self {
        self.target = Some(target);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::RunnerStarted);
        let b = Event::new(EventKind::RunnerStopped);
        assert!(b.seq > a.seq);
    }
}
