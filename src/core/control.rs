//! # Runner control state shared between the run loop, tasks and the tick callback.
//!
//! ```text
//!             ┌──────────── RunnerHandle (clone) ────────────┐
//!             │                                              │
//!   run loop ─┤ begin / next_index / install_waiter / finish │
//!   tasks    ─┤ current_index / signal_transition / stop     │
//!   on_tick  ─┤ active_index / signal_transition / fail      │
//!             └──────────────────────────────────────────────┘
//!                 Mutex<ControlState> { state, current, active, waiter, phases }
//! ```
//!
//! ## Rules
//! - At most one transition wait exists; settling it consumes it.
//! - `signal_transition` without a waiter is a no-op (no double-signaling).
//! - `stop` settles an outstanding wait with the current index so the loop
//!   observes termination instead of hanging.
//! - Only a task suspended on the wait is ticked; settling the wait ends its ticks.
//! - The lock is never held while task code runs.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::error::{RuntimeError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::tasks::TaskPhase;

/// Lifecycle state of a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// Built, `run` not called yet.
    Idle,
    /// Inside the run loop.
    Running,
    /// Terminated (sequence exhausted, stopped, or failed). Not restartable.
    Stopped,
}

/// How a transition wait was settled.
#[derive(Debug)]
pub(crate) enum Transition {
    Goto(usize),
    Failed(TaskError),
}

struct ControlState {
    state: RunnerState,
    current: usize,
    active: Option<usize>,
    waiter: Option<oneshot::Sender<Transition>>,
    phases: Vec<TaskPhase>,
    stop_requested: bool,
}

struct Control {
    state: Mutex<ControlState>,
    token: CancellationToken,
    bus: Bus,
}

/// Cheap, cloneable handle for observing and steering a runner.
#[derive(Clone)]
pub struct RunnerHandle {
    inner: Arc<Control>,
}

impl fmt::Debug for RunnerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.lock();
        f.debug_struct("RunnerHandle")
            .field("state", &st.state)
            .field("current", &st.current)
            .field("active", &st.active)
            .field("awaiting", &st.waiter.is_some())
            .finish()
    }
}

impl RunnerHandle {
    pub(crate) fn new(task_count: usize, bus: Bus) -> Self {
        Self {
            inner: Arc::new(Control {
                state: Mutex::new(ControlState {
                    state: RunnerState::Idle,
                    current: 0,
                    active: None,
                    waiter: None,
                    phases: vec![TaskPhase::NotStarted; task_count],
                    stop_requested: false,
                }),
                token: CancellationToken::new(),
                bus,
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunnerState {
        self.lock().state
    }

    /// Returns `true` while the run loop is active and no stop was requested.
    pub fn is_running(&self) -> bool {
        self.state() == RunnerState::Running
    }

    /// Index of the task that runs next (or is running now).
    pub fn current_index(&self) -> usize {
        self.lock().current
    }

    /// Index of the active task, if one is active.
    pub fn active_index(&self) -> Option<usize> {
        self.lock().active
    }

    /// Returns `true` while the loop is suspended waiting for a transition.
    pub fn is_awaiting_transition(&self) -> bool {
        self.lock().waiter.is_some()
    }

    /// Number of tasks in the sequence.
    pub fn task_count(&self) -> usize {
        self.lock().phases.len()
    }

    /// Lifecycle phase of the task at `index`.
    pub fn phase(&self, index: usize) -> Option<TaskPhase> {
        self.lock().phases.get(index).copied()
    }

    /// Settles the outstanding transition wait with `target`, or with
    /// `current + 1` when `target` is `None`.
    ///
    /// Returns `false` (and does nothing) when nothing is waiting.
    pub fn signal_transition(&self, target: Option<usize>) -> bool {
        let (tx, current, next) = {
            let mut st = self.lock();
            let Some(tx) = st.waiter.take() else {
                return false;
            };
            let next = target.unwrap_or(st.current + 1);
            (tx, st.current, next)
        };
        self.inner.bus.publish(
            Event::new(EventKind::TransitionSignaled)
                .with_index(current)
                .with_target(next),
        );
        tx.send(Transition::Goto(next)).is_ok()
    }

    /// Marks the runner stopped and releases a suspended run loop.
    ///
    /// The loop finishes cleanup of the active task on its own; await the
    /// run future (or [`Orchestrator::join`](crate::Orchestrator::join)) to
    /// observe completion.
    pub fn stop(&self) {
        let (waiter, current) = {
            let mut st = self.lock();
            if st.state == RunnerState::Stopped {
                return;
            }
            st.state = RunnerState::Stopped;
            st.stop_requested = true;
            (st.waiter.take(), st.current)
        };
        self.inner.token.cancel();
        self.inner
            .bus
            .publish(Event::new(EventKind::StopRequested).with_index(current));
        if let Some(tx) = waiter {
            let _ = tx.send(Transition::Goto(current));
        }
    }

    /// Completes once the runner is stopped.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.token.cancelled()
    }

    /// Token cancelled when the runner stops.
    pub fn token(&self) -> CancellationToken {
        self.inner.token.clone()
    }

    /// Routes a tick-side task failure into the suspended run loop.
    pub(crate) fn fail(&self, error: TaskError) -> bool {
        let waiter = self.lock().waiter.take();
        match waiter {
            Some(tx) => tx.send(Transition::Failed(error)).is_ok(),
            None => false,
        }
    }

    /// Moves `Idle` to `Running`; any other state is rejected.
    pub(crate) fn begin(&self) -> Result<(), RuntimeError> {
        let mut st = self.lock();
        if st.state != RunnerState::Idle {
            return Err(RuntimeError::NotIdle { state: st.state });
        }
        st.state = RunnerState::Running;
        Ok(())
    }

    /// Index to activate next, or `None` when the loop must exit.
    pub(crate) fn next_index(&self) -> Option<usize> {
        let st = self.lock();
        (st.state == RunnerState::Running && st.current < st.phases.len()).then_some(st.current)
    }

    pub(crate) fn set_current(&self, index: usize) {
        self.lock().current = index;
    }

    pub(crate) fn set_active(&self, index: Option<usize>) {
        self.lock().active = index;
    }

    pub(crate) fn set_phase(&self, index: usize, phase: TaskPhase) {
        if let Some(slot) = self.lock().phases.get_mut(index) {
            *slot = phase;
        }
    }

    /// Installs the single transition wait, unless the runner was stopped meanwhile.
    pub(crate) fn install_waiter(&self) -> Option<oneshot::Receiver<Transition>> {
        let mut st = self.lock();
        if st.state != RunnerState::Running {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        st.waiter = Some(tx);
        Some(rx)
    }

    /// Returns `true` while the task at `index` is active and suspended on the
    /// transition wait. Once the wait is settled the task is finished and must
    /// not be ticked again.
    pub(crate) fn is_tickable(&self, index: usize) -> bool {
        let st = self.lock();
        st.state == RunnerState::Running && st.active == Some(index) && st.waiter.is_some()
    }

    /// Moves to `Stopped` after final cleanup; returns whether a stop was requested.
    pub(crate) fn finish(&self) -> bool {
        let mut st = self.lock();
        st.state = RunnerState::Stopped;
        st.active = None;
        st.waiter = None;
        let stop_requested = st.stop_requested;
        drop(st);
        self.inner.token.cancel();
        stop_requested
    }

    fn lock(&self) -> MutexGuard<'_, ControlState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(tasks: usize) -> RunnerHandle {
        RunnerHandle::new(tasks, Bus::new(8))
    }

    #[test]
    fn test_signal_without_waiter_is_noop() {
        let h = handle(3);
        h.begin().unwrap();
        assert!(!h.signal_transition(Some(2)));
        assert_eq!(h.current_index(), 0);
    }

    #[tokio::test]
    async fn test_signal_defaults_to_next_index() {
        let h = handle(3);
        h.begin().unwrap();
        h.set_current(1);

        let rx = h.install_waiter().unwrap();
        assert!(h.is_awaiting_transition());
        assert!(h.signal_transition(None));
        assert!(!h.signal_transition(Some(0)));

        match rx.await.unwrap() {
            Transition::Goto(next) => assert_eq!(next, 2),
            Transition::Failed(err) => panic!("unexpected failure: {err}"),
        }
    }

    #[tokio::test]
    async fn test_stop_releases_waiter_with_current_index() {
        let h = handle(3);
        h.begin().unwrap();
        h.set_current(2);
        let rx = h.install_waiter().unwrap();

        h.stop();

        assert_eq!(h.state(), RunnerState::Stopped);
        assert!(h.token().is_cancelled());
        match rx.await.unwrap() {
            Transition::Goto(next) => assert_eq!(next, 2),
            Transition::Failed(err) => panic!("unexpected failure: {err}"),
        }
        assert!(h.install_waiter().is_none());
        assert_eq!(h.next_index(), None);
    }

    #[test]
    fn test_runner_is_not_restartable() {
        let h = handle(1);
        h.begin().unwrap();
        h.finish();
        assert!(matches!(
            h.begin(),
            Err(RuntimeError::NotIdle {
                state: RunnerState::Stopped
            })
        ));
    }
}
