//! # Task-facing contexts.
//!
//! [`TaskContext`] is handed to every async lifecycle method. It bundles the
//! tick bridge (host access) with the runner handle (transition control), so
//! tasks never reach for ambient globals.
//!
//! [`TickContext`] is handed to [`TickHook::process_tick`](crate::TickHook::process_tick),
//! which already runs inside the tick callback and therefore gets the host directly.

use std::fmt;
use std::time::Duration;

use tokio_util::sync::WaitForCancellationFuture;

use crate::bridge::{TickBridge, TickFuture};
use crate::core::RunnerHandle;

/// Typed read surface of the host, used by the convenience readers on [`TaskContext`].
///
/// Anything else is reachable through [`TaskContext::run_on_tick`].
pub trait Host: 'static {
    /// Handle to an interface component.
    type Widget: Send + 'static;

    /// Value of a bit-packed client variable.
    fn varbit(&self, id: u32) -> i32;

    /// Value of a player variable.
    fn varp(&self, id: u32) -> i32;

    /// Interface component by group and child id, if it is loaded.
    fn widget(&self, group: u32, child: u32) -> Option<Self::Widget>;
}

/// Host access and runner control available to task logic.
pub struct TaskContext<H> {
    bridge: TickBridge<H>,
    runner: RunnerHandle,
}

impl<H> Clone for TaskContext<H> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            runner: self.runner.clone(),
        }
    }
}

impl<H: 'static> fmt::Debug for TaskContext<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("bridge", &self.bridge)
            .field("runner", &self.runner)
            .finish()
    }
}

impl<H: 'static> TaskContext<H> {
    pub(crate) fn new(bridge: TickBridge<H>, runner: RunnerHandle) -> Self {
        Self { bridge, runner }
    }

    /// Underlying tick bridge.
    pub fn bridge(&self) -> &TickBridge<H> {
        &self.bridge
    }

    /// Handle to the runner executing this task.
    pub fn runner(&self) -> &RunnerHandle {
        &self.runner
    }

    /// Runs `op` with host access on the next tick.
    pub fn run_on_tick<F, R>(&self, op: F) -> TickFuture<R>
    where
        F: FnOnce(&mut H) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.bridge.submit(op)
    }

    /// Like [`run_on_tick`](Self::run_on_tick) with an explicit deadline.
    pub fn run_on_tick_within<F, R>(&self, op: F, timeout: Duration) -> TickFuture<R>
    where
        F: FnOnce(&mut H) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.bridge.submit_with_timeout(op, timeout)
    }

    /// Runs a fallible `op` on the next tick; `Err` becomes [`TaskError::Execution`](crate::TaskError::Execution).
    pub fn try_run_on_tick<F, R, E>(&self, op: F) -> TickFuture<R>
    where
        F: FnOnce(&mut H) -> Result<R, E> + Send + 'static,
        R: Send + 'static,
        E: fmt::Display,
    {
        self.bridge.try_submit(op)
    }

    /// Waits without touching the host.
    pub async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Index the runner considers current.
    pub fn current_index(&self) -> usize {
        self.runner.current_index()
    }

    /// See [`RunnerHandle::signal_transition`].
    pub fn signal_transition(&self, target: Option<usize>) -> bool {
        self.runner.signal_transition(target)
    }

    /// See [`RunnerHandle::stop`].
    pub fn stop(&self) {
        self.runner.stop();
    }

    /// Returns `true` while the runner has not been stopped.
    pub fn is_running(&self) -> bool {
        self.runner.is_running()
    }

    /// Completes once the runner is stopped.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.runner.cancelled()
    }
}

impl<H: Host> TaskContext<H> {
    /// Reads a varbit on the next tick.
    pub fn read_varbit(&self, id: u32) -> TickFuture<i32> {
        self.run_on_tick(move |host: &mut H| host.varbit(id))
    }

    /// Reads a player variable on the next tick.
    pub fn read_varp(&self, id: u32) -> TickFuture<i32> {
        self.run_on_tick(move |host: &mut H| host.varp(id))
    }

    /// Looks up a widget on the next tick.
    pub fn read_widget(&self, group: u32, child: u32) -> TickFuture<Option<H::Widget>> {
        self.run_on_tick(move |host: &mut H| host.widget(group, child))
    }
}

/// Context passed to [`TickHook::process_tick`](crate::TickHook::process_tick).
#[derive(Debug, Clone)]
pub struct TickContext {
    tick: u64,
    task_tick: u64,
    index: usize,
    runner: RunnerHandle,
}

impl TickContext {
    pub(crate) fn new(tick: u64, index: usize, runner: RunnerHandle) -> Self {
        Self {
            tick,
            task_tick: 0,
            index,
            runner,
        }
    }

    /// Same context with the task-local tick counter set.
    pub fn with_task_tick(mut self, task_tick: u64) -> Self {
        self.task_tick = task_tick;
        self
    }

    /// Host tick number (1-based, counted by the runner).
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Ticks processed by the active task since it started (1-based).
    pub fn task_tick(&self) -> u64 {
        self.task_tick
    }

    /// Index of the active task.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Handle to the runner.
    pub fn runner(&self) -> &RunnerHandle {
        &self.runner
    }

    /// See [`RunnerHandle::signal_transition`].
    pub fn signal_transition(&self, target: Option<usize>) -> bool {
        self.runner.signal_transition(target)
    }

    /// See [`RunnerHandle::stop`].
    pub fn stop(&self) {
        self.runner.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Config, Runner, RunnerState};
    use crate::error::TaskError;

    struct Client {
        bank_open: bool,
    }

    impl Host for Client {
        type Widget = (u32, u32);

        fn varbit(&self, id: u32) -> i32 {
            id as i32 * 2
        }

        fn varp(&self, _id: u32) -> i32 {
            -1
        }

        fn widget(&self, group: u32, child: u32) -> Option<(u32, u32)> {
            self.bank_open.then_some((group, child))
        }
    }

    fn context(bridge: TickBridge<Client>) -> (Runner<Client>, TaskContext<Client>) {
        let runner = Runner::builder(Config::default())
            .with_bridge(bridge)
            .build();
        let ctx = runner.context().clone();
        (runner, ctx)
    }

    #[tokio::test]
    async fn test_host_readers_go_through_the_bridge() {
        let bridge = TickBridge::default();
        let (_runner, ctx) = context(bridge.clone());

        let varbit = ctx.read_varbit(21);
        let varp = ctx.read_varp(3);
        let widget = ctx.read_widget(12, 1);
        assert_eq!(bridge.queued(), 3);

        bridge.drain(&mut Client { bank_open: true });

        assert_eq!(varbit.await, Ok(42));
        assert_eq!(varp.await, Ok(-1));
        assert_eq!(widget.await, Ok(Some((12, 1))));
    }

    #[tokio::test]
    async fn test_fallible_operation_maps_error() {
        let bridge = TickBridge::default();
        let (_runner, ctx) = context(bridge.clone());

        let fut = ctx.try_run_on_tick(|c: &mut Client| {
            c.widget(12, 1).ok_or("bank is not open")
        });
        bridge.drain(&mut Client { bank_open: false });

        assert_eq!(
            fut.await,
            Err(TaskError::Execution {
                error: "bank is not open".into()
            })
        );
    }

    #[tokio::test]
    async fn test_cancelled_completes_after_stop() {
        let (runner, ctx) = context(TickBridge::default());
        assert!(!ctx.is_running());

        ctx.stop();
        ctx.cancelled().await;

        assert_eq!(runner.handle().state(), RunnerState::Stopped);
        assert!(!ctx.signal_transition(None));
    }
}
