//! # Sequential task runner.
//!
//! [`Runner`] owns an ordered list of tasks and runs exactly one of them at a
//! time. Task indices are the addressing scheme for transitions.
//!
//! ## Run loop
//! ```text
//! run()
//!   begin (Idle → Running, else NotIdle)
//!   while running && current < len:
//!     ├─► cleanup(previous)                 (awaited before anything else starts)
//!     ├─► activate(current) ─► initialize ─► execute
//!     │     ├─ Next(i)      ─► current = i
//!     │     ├─ AwaitSignal  ─► install wait (task lock still held)
//!     │     │                   └─► suspend until signal / stop / tick failure
//!     │     └─ Err(e)       ─► log, on_error, terminate
//!   cleanup(active)                          (final cleanup)
//!   finish (→ Stopped)
//! ```
//!
//! ## Tick integration
//! ```text
//! on_tick(host)
//!   ├─► bridge.drain(host)
//!   ├─► runner stopped or no active task   ─► done
//!   ├─► active task busy (loop holds lock) ─► done
//!   ├─► transition wait already settled    ─► done
//!   └─► tick_hook()?.process_tick(host)
//!         ├─ Ok(true)  ─► stay
//!         ├─ Ok(false) ─► signal_transition(None)
//!         └─ Err/panic ─► route failure into the waiting loop
//! ```
//!
//! ## Rules
//! - At most one task is active at any instant.
//! - `cleanup` of the outgoing task completes before the incoming task's `initialize`.
//! - The transition wait is installed before the task lock is released, so a
//!   tick can never finish a task that the loop is not yet waiting on.
//! - A task failure ends the run; it is never retried.
//! - Nothing raised by task code escapes `on_tick`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, error, info, trace, warn};

use crate::bridge::{DrainReport, TickBridge, panic_message};
use crate::core::builder::RunnerBuilder;
use crate::core::config::Config;
use crate::core::control::{RunnerHandle, Transition};
use crate::error::{RuntimeError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::SubscriberSet;
use crate::tasks::{Task, TaskContext, TaskOutcome, TaskPhase, TickContext};

/// Why the run loop ended without a task failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// The current index ran past the end of the task list.
    Completed,
    /// `stop()` was requested.
    Stopped,
}

/// Result of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of task activations (re-running a task counts again).
    pub activations: u64,
    /// Current index when the loop exited.
    pub last_index: usize,
    /// Why the loop ended.
    pub exit: RunExit,
}

/// What a single [`Runner::on_tick`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number (1-based).
    pub tick: u64,
    /// Bridge drain counters.
    pub drained: DrainReport,
    /// `process_tick` of the active task was invoked.
    pub processed: bool,
    /// The active task reported it is finished (or failed) on this tick.
    pub finished: bool,
}

/// What the loop does after the active task released its lock.
enum Step {
    Goto(usize),
    Wait(oneshot::Receiver<Transition>),
    Halt,
    Fail(TaskError),
}

/// Sequential state machine over an ordered list of tasks.
pub struct Runner<H: 'static> {
    tasks: Vec<Mutex<Box<dyn Task<H>>>>,
    names: Vec<Arc<str>>,
    ctx: TaskContext<H>,
    control: RunnerHandle,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    ticks: AtomicU64,
}

impl<H: 'static> Runner<H> {
    /// Starts building a runner with the given configuration.
    pub fn builder(cfg: Config) -> RunnerBuilder<H> {
        RunnerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        tasks: Vec<Box<dyn Task<H>>>,
        bridge: TickBridge<H>,
        bus: Bus,
        subs: Arc<SubscriberSet>,
    ) -> Self {
        let names = tasks.iter().map(|t| Arc::<str>::from(t.name())).collect();
        let control = RunnerHandle::new(tasks.len(), bus.clone());
        let ctx = TaskContext::new(bridge, control.clone());
        Self {
            tasks: tasks.into_iter().map(Mutex::new).collect(),
            names,
            ctx,
            control,
            bus,
            subs,
            ticks: AtomicU64::new(0),
        }
    }

    /// Handle for observing and steering this runner.
    pub fn handle(&self) -> &RunnerHandle {
        &self.control
    }

    /// Bridge shared by all tasks of this runner.
    pub fn bridge(&self) -> &TickBridge<H> {
        self.ctx.bridge()
    }

    /// Context handed to task lifecycle methods.
    pub fn context(&self) -> &TaskContext<H> {
        &self.ctx
    }

    /// Event bus of this runner.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Number of tasks in the sequence.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Name of the task at `index`.
    pub fn task_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(|n| n.as_ref())
    }

    /// Number of ticks seen by [`on_tick`](Self::on_tick).
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// See [`RunnerHandle::stop`].
    pub fn stop(&self) {
        self.control.stop();
    }

    /// See [`RunnerHandle::signal_transition`].
    pub fn signal_task_transition(&self, target: Option<usize>) -> bool {
        self.control.signal_transition(target)
    }

    /// Runs the task sequence until it is exhausted, stopped, or a task fails.
    ///
    /// May be called once; later calls return [`RuntimeError::NotIdle`].
    pub async fn run(&self) -> Result<RunSummary, RuntimeError> {
        self.control.begin()?;
        self.subscriber_listener();

        let count = self.tasks.len();
        self.bus
            .publish(Event::new(EventKind::RunnerStarted).with_index(count));
        info!(tasks = count, "runner started");

        let mut previous: Option<usize> = None;
        let mut activations = 0u64;
        let mut failure: Option<RuntimeError> = None;

        while let Some(index) = self.control.next_index() {
            if let Some(prev) = previous.take() {
                debug!(task = %self.names[prev], "cleaning up previous task");
                self.cleanup_task(prev).await;
                if !self.control.is_running() {
                    break;
                }
            }

            self.activate(index);
            activations += 1;
            previous = Some(index);

            let step = self.execute_task(index).await;
            let next = match step {
                Step::Goto(next) => next,
                Step::Halt => break,
                Step::Wait(rx) => {
                    self.bus.publish(
                        Event::new(EventKind::TransitionAwaited)
                            .with_task(Arc::clone(&self.names[index]))
                            .with_index(index),
                    );
                    debug!(task = %self.names[index], "awaiting transition signal");
                    match rx.await {
                        Ok(Transition::Goto(next)) => next,
                        Ok(Transition::Failed(err)) => {
                            failure = Some(self.fail_task(index, err).await);
                            break;
                        }
                        Err(_closed) => break,
                    }
                }
                Step::Fail(err) => {
                    failure = Some(self.fail_task(index, err).await);
                    break;
                }
            };
            self.control.set_current(next);
        }

        if let Some(active) = previous {
            debug!(task = %self.names[active], "final cleanup, stopping task");
            self.cleanup_task(active).await;
        }

        let stopped = self.control.finish();
        let last_index = self.control.current_index();
        let mut ev = Event::new(EventKind::RunnerStopped).with_index(last_index);
        if let Some(err) = &failure {
            ev = ev.with_reason(err.as_message());
        }
        self.bus.publish(ev);

        if let Some(err) = failure {
            return Err(err);
        }
        let exit = if stopped {
            RunExit::Stopped
        } else {
            RunExit::Completed
        };
        info!(activations, last_index, exit = ?exit, "runner stopped");
        Ok(RunSummary {
            activations,
            last_index,
            exit,
        })
    }

    /// Tick entry point; call once per host tick from the host's callback.
    pub fn on_tick(&self, host: &mut H) -> TickReport {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let drained = self.ctx.bridge().drain(host);
        let mut report = TickReport {
            tick,
            drained,
            processed: false,
            finished: false,
        };

        if !self.control.is_running() {
            return report;
        }
        let Some(index) = self.control.active_index() else {
            return report;
        };
        let Ok(mut task) = self.tasks[index].try_lock() else {
            trace!(tick, index, "active task busy, skipping tick processing");
            return report;
        };
        // Checked under the task lock: the wait is installed before `execute`
        // releases it, and is gone once the task finished or was told to move on.
        if !self.control.is_tickable(index) {
            trace!(tick, index, "active task not suspended, skipping tick processing");
            return report;
        }
        let Some(hook) = task.tick_hook() else {
            return report;
        };

        let tick_ctx = TickContext::new(tick, index, self.control.clone());
        let res = panic::catch_unwind(AssertUnwindSafe(|| hook.process_tick(host, &tick_ctx)));
        drop(task);
        report.processed = true;

        let failure = match res {
            Ok(Ok(true)) => return report,
            Ok(Ok(false)) => {
                report.finished = true;
                self.control.signal_transition(None);
                return report;
            }
            Ok(Err(err)) => err,
            Err(payload) => TaskError::Fatal {
                error: format!("process_tick panicked: {}", panic_message(payload.as_ref())),
            },
        };
        report.finished = true;
        if !self.control.fail(failure) {
            warn!(tick, index, "tick failure arrived with no transition wait");
        }
        report
    }

    fn activate(&self, index: usize) {
        let name = &self.names[index];
        self.control.set_active(Some(index));
        info!("executing task {}/{}: {}", index + 1, self.tasks.len(), name);
        self.bus.publish(
            Event::new(EventKind::TaskActivated)
                .with_task(Arc::clone(name))
                .with_index(index),
        );
    }

    /// Runs `initialize` and `execute` under the task lock and decides the next step
    /// before the lock is released.
    async fn execute_task(&self, index: usize) -> Step {
        let mut task = self.tasks[index].lock().await;

        self.control.set_phase(index, TaskPhase::Initializing);
        let res = AssertUnwindSafe(async {
            task.initialize(&self.ctx).await?;
            self.control.set_phase(index, TaskPhase::Executing);
            task.execute(&self.ctx).await
        })
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| {
            Err(TaskError::Fatal {
                error: format!("task panicked: {}", panic_message(payload.as_ref())),
            })
        });

        match res {
            Ok(TaskOutcome::Next(next)) => Step::Goto(next),
            Ok(TaskOutcome::AwaitSignal) => match self.control.install_waiter() {
                Some(rx) => Step::Wait(rx),
                None => Step::Halt,
            },
            Err(err) => Step::Fail(err),
        }
    }

    async fn fail_task(&self, index: usize, err: TaskError) -> RuntimeError {
        let name = &self.names[index];
        error!(task = %name, index, error = %err, "task failed");
        self.bus.publish(
            Event::new(EventKind::TaskFailed)
                .with_task(Arc::clone(name))
                .with_index(index)
                .with_reason(err.as_message()),
        );

        let mut task = self.tasks[index].lock().await;
        if AssertUnwindSafe(task.on_error(&self.ctx, &err))
            .catch_unwind()
            .await
            .is_err()
        {
            warn!(task = %name, "on_error hook panicked");
        }

        RuntimeError::TaskFailed {
            task: name.to_string(),
            index,
            error: err,
        }
    }

    async fn cleanup_task(&self, index: usize) {
        let name = &self.names[index];
        self.control.set_phase(index, TaskPhase::CleaningUp);

        let res = {
            let mut task = self.tasks[index].lock().await;
            AssertUnwindSafe(task.cleanup(&self.ctx))
                .catch_unwind()
                .await
        };
        match res {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(task = %name, error = %err, "cleanup failed"),
            Err(payload) => warn!(
                task = %name,
                panic = %panic_message(payload.as_ref()),
                "cleanup panicked"
            ),
        }

        self.control.set_phase(index, TaskPhase::Done);
        self.control.set_active(None);
        self.bus.publish(
            Event::new(EventKind::TaskCleanedUp)
                .with_task(Arc::clone(name))
                .with_index(index),
        );
    }

    /// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
    fn subscriber_listener(&self) {
        if self.subs.is_empty() {
            return;
        }
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                set.emit(&ev);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RunnerState;
    use crate::tasks::{TaskFn, TickHook};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    type Log = Arc<StdMutex<Vec<String>>>;

    fn log(entries: &Log, line: impl Into<String>) {
        entries.lock().unwrap().push(line.into());
    }

    /// Task that records its lifecycle and returns scripted outcomes.
    struct Scripted {
        name: &'static str,
        outcomes: Vec<Result<TaskOutcome, TaskError>>,
        log: Log,
        slow_cleanup: bool,
    }

    impl Scripted {
        fn new(
            name: &'static str,
            log: &Log,
            outcomes: Vec<Result<TaskOutcome, TaskError>>,
        ) -> Self {
            Self {
                name,
                outcomes,
                log: Arc::clone(log),
                slow_cleanup: false,
            }
        }
    }

    #[async_trait]
    impl Task<()> for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn initialize(&mut self, _ctx: &TaskContext<()>) -> Result<(), TaskError> {
            log(&self.log, format!("{}:init", self.name));
            Ok(())
        }

        async fn execute(&mut self, _ctx: &TaskContext<()>) -> Result<TaskOutcome, TaskError> {
            log(&self.log, format!("{}:exec", self.name));
            if self.outcomes.is_empty() {
                return Ok(TaskOutcome::Next(usize::MAX));
            }
            self.outcomes.remove(0)
        }

        async fn cleanup(&mut self, _ctx: &TaskContext<()>) -> Result<(), TaskError> {
            if self.slow_cleanup {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            log(&self.log, format!("{}:cleanup", self.name));
            Ok(())
        }

        async fn on_error(&mut self, _ctx: &TaskContext<()>, error: &TaskError) {
            log(&self.log, format!("{}:on_error:{}", self.name, error.as_label()));
        }
    }

    /// Tick-resident task with a scripted per-tick result.
    struct Ticking {
        calls: Arc<AtomicU64>,
        result: fn(u64) -> Result<bool, TaskError>,
        /// Explicit transition target signaled from every tick.
        jump: Option<usize>,
    }

    #[async_trait]
    impl Task<()> for Ticking {
        fn name(&self) -> &str {
            "ticking"
        }

        async fn execute(&mut self, _ctx: &TaskContext<()>) -> Result<TaskOutcome, TaskError> {
            Ok(TaskOutcome::AwaitSignal)
        }

        fn tick_hook(&mut self) -> Option<&mut dyn TickHook<()>> {
            Some(self)
        }
    }

    impl TickHook<()> for Ticking {
        fn process_tick(&mut self, _host: &mut (), ctx: &TickContext) -> Result<bool, TaskError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(target) = self.jump {
                ctx.signal_transition(Some(target));
            }
            (self.result)(n)
        }
    }

    fn build(tasks: Vec<Box<dyn Task<()>>>) -> Arc<Runner<()>> {
        let mut builder = Runner::builder(Config::default());
        for task in tasks {
            builder = builder.with_boxed_task(task);
        }
        Arc::new(builder.build())
    }

    async fn wait_until(cond: impl Fn() -> bool) {
        for _ in 0..1000 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_activation_follows_returned_and_signaled_indices() {
        let entries: Log = Arc::default();
        let runner = build(vec![
            Box::new(Scripted::new(
                "a",
                &entries,
                vec![Ok(TaskOutcome::Next(1)), Ok(TaskOutcome::Next(3))],
            )),
            Box::new(Scripted::new("b", &entries, vec![Ok(TaskOutcome::AwaitSignal)])),
            Box::new(Scripted::new("c", &entries, vec![])),
        ]);

        let join = tokio::spawn({
            let runner = Arc::clone(&runner);
            async move { runner.run().await }
        });

        let handle = runner.handle().clone();
        wait_until(|| handle.is_awaiting_transition()).await;
        assert_eq!(handle.active_index(), Some(1));
        assert!(runner.signal_task_transition(Some(0)));

        let summary = join.await.unwrap().unwrap();
        assert_eq!(summary.exit, RunExit::Completed);
        assert_eq!(summary.activations, 3);
        assert_eq!(summary.last_index, 3);
        assert_eq!(
            *entries.lock().unwrap(),
            vec![
                "a:init", "a:exec", "a:cleanup", "b:init", "b:exec", "b:cleanup", "a:init",
                "a:exec", "a:cleanup",
            ]
        );
        assert_eq!(handle.state(), RunnerState::Stopped);
        assert_eq!(handle.phase(2), Some(TaskPhase::NotStarted));
        assert_eq!(handle.phase(0), Some(TaskPhase::Done));
    }

    #[tokio::test]
    async fn test_cleanup_completes_before_next_activation() {
        let entries: Log = Arc::default();
        let mut first = Scripted::new("first", &entries, vec![Ok(TaskOutcome::Next(1))]);
        first.slow_cleanup = true;
        let runner = build(vec![
            Box::new(first),
            Box::new(Scripted::new("second", &entries, vec![])),
        ]);

        runner.run().await.unwrap();

        assert_eq!(
            *entries.lock().unwrap(),
            vec![
                "first:init",
                "first:exec",
                "first:cleanup",
                "second:init",
                "second:exec",
                "second:cleanup",
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_while_awaiting_transition_ends_run() {
        let entries: Log = Arc::default();
        let runner = build(vec![Box::new(Scripted::new(
            "waiter",
            &entries,
            vec![Ok(TaskOutcome::AwaitSignal)],
        ))]);

        let join = tokio::spawn({
            let runner = Arc::clone(&runner);
            async move { runner.run().await }
        });
        wait_until(|| runner.handle().is_awaiting_transition()).await;

        runner.stop();
        assert_eq!(runner.handle().state(), RunnerState::Stopped);

        let summary = join.await.unwrap().unwrap();
        assert_eq!(summary.exit, RunExit::Stopped);
        assert_eq!(summary.last_index, 0);
        assert_eq!(
            *entries.lock().unwrap(),
            vec!["waiter:init", "waiter:exec", "waiter:cleanup"]
        );
    }

    #[tokio::test]
    async fn test_task_failure_runs_error_hook_and_terminates() {
        let entries: Log = Arc::default();
        let runner = build(vec![
            Box::new(Scripted::new(
                "broken",
                &entries,
                vec![Err(TaskError::fatal("tree not found"))],
            )),
            Box::new(Scripted::new("never", &entries, vec![])),
        ]);

        let err = runner.run().await.unwrap_err();
        match err {
            RuntimeError::TaskFailed { task, index, error } => {
                assert_eq!(task, "broken");
                assert_eq!(index, 0);
                assert_eq!(error, TaskError::fatal("tree not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            *entries.lock().unwrap(),
            vec![
                "broken:init",
                "broken:exec",
                "broken:on_error:task_fatal",
                "broken:cleanup"
            ]
        );
        assert_eq!(runner.handle().state(), RunnerState::Stopped);
    }

    #[tokio::test]
    async fn test_run_twice_is_rejected() {
        let runner = build(vec![]);
        let summary = runner.run().await.unwrap();
        assert_eq!(summary.activations, 0);
        assert!(matches!(
            runner.run().await,
            Err(RuntimeError::NotIdle {
                state: RunnerState::Stopped
            })
        ));
    }

    #[tokio::test]
    async fn test_panicking_task_is_a_task_failure() {
        let step = TaskFn::new("boom", |_ctx: TaskContext<()>| async move {
            if true {
                panic!("kaboom");
            }
            Ok::<_, TaskError>(TaskOutcome::Next(1))
        });
        let runner = build(vec![Box::new(step)]);

        let err = runner.run().await.unwrap_err();
        assert_eq!(err.as_label(), "runner_task_failed");
        assert!(err.as_message().contains("kaboom"));
    }

    #[tokio::test]
    async fn test_tick_finishing_task_advances_to_next_index() {
        let calls = Arc::new(AtomicU64::new(0));
        let entries: Log = Arc::default();
        let runner = build(vec![
            Box::new(Ticking {
                calls: Arc::clone(&calls),
                result: |n| Ok(n < 2),
                jump: None,
            }),
            Box::new(Scripted::new("after", &entries, vec![])),
        ]);

        let join = tokio::spawn({
            let runner = Arc::clone(&runner);
            async move { runner.run().await }
        });
        wait_until(|| runner.handle().is_awaiting_transition()).await;

        let first = runner.on_tick(&mut ());
        assert!(first.processed && !first.finished);
        let second = runner.on_tick(&mut ());
        assert!(second.processed && second.finished);

        let summary = join.await.unwrap().unwrap();
        assert_eq!(summary.exit, RunExit::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*entries.lock().unwrap(), vec!["after:init", "after:exec", "after:cleanup"]);
    }

    #[tokio::test]
    async fn test_tick_error_and_panic_end_the_run() {
        let results: [fn(u64) -> Result<bool, TaskError>; 2] = [
            |_| Err(TaskError::fail("animation stuck")),
            |_| panic!("hook exploded"),
        ];
        for result in results {
            let calls = Arc::new(AtomicU64::new(0));
            let runner = build(vec![Box::new(Ticking {
                calls: Arc::clone(&calls),
                result,
                jump: None,
            })]);

            let join = tokio::spawn({
                let runner = Arc::clone(&runner);
                async move { runner.run().await }
            });
            wait_until(|| runner.handle().is_awaiting_transition()).await;

            let report = runner.on_tick(&mut ());
            assert!(report.finished);

            let err = join.await.unwrap().unwrap_err();
            assert!(matches!(err, RuntimeError::TaskFailed { index: 0, .. }));
            assert_eq!(runner.handle().state(), RunnerState::Stopped);
        }
    }

    #[tokio::test]
    async fn test_tick_skips_processing_when_not_running() {
        let calls = Arc::new(AtomicU64::new(0));
        let runner = build(vec![Box::new(Ticking {
            calls: Arc::clone(&calls),
            result: |_| Ok(true),
            jump: None,
        })]);

        let report = runner.on_tick(&mut ());
        assert_eq!(report.tick, 1);
        assert!(!report.processed);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_finished_task_is_not_ticked_again_before_transition() {
        let calls = Arc::new(AtomicU64::new(0));
        let entries: Log = Arc::default();
        let runner = build(vec![
            Box::new(Ticking {
                calls: Arc::clone(&calls),
                result: |_| Ok(false),
                jump: None,
            }),
            Box::new(Scripted::new("next", &entries, vec![Ok(TaskOutcome::AwaitSignal)])),
        ]);

        let join = tokio::spawn({
            let runner = Arc::clone(&runner);
            async move { runner.run().await }
        });
        wait_until(|| runner.handle().is_awaiting_transition()).await;

        // Back to back, the run loop gets no chance to clean up in between.
        let first = runner.on_tick(&mut ());
        assert!(first.processed && first.finished);
        let second = runner.on_tick(&mut ());
        assert!(!second.processed && !second.finished);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        wait_until(|| {
            runner.handle().active_index() == Some(1) && runner.handle().is_awaiting_transition()
        })
        .await;
        let third = runner.on_tick(&mut ());
        assert!(!third.processed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        runner.stop();
        let summary = join.await.unwrap().unwrap();
        assert_eq!(summary.exit, RunExit::Stopped);
        assert_eq!(summary.activations, 2);
    }

    #[tokio::test]
    async fn test_tick_signaled_target_wins_over_next_index() {
        let calls = Arc::new(AtomicU64::new(0));
        let entries: Log = Arc::default();
        let runner = build(vec![
            Box::new(Ticking {
                calls: Arc::clone(&calls),
                result: |_| Ok(false),
                jump: Some(2),
            }),
            Box::new(Scripted::new("skipped", &entries, vec![])),
            Box::new(Scripted::new("bank", &entries, vec![Ok(TaskOutcome::Next(3))])),
        ]);

        let join = tokio::spawn({
            let runner = Arc::clone(&runner);
            async move { runner.run().await }
        });
        wait_until(|| runner.handle().is_awaiting_transition()).await;

        let report = runner.on_tick(&mut ());
        assert!(report.processed && report.finished);

        let summary = join.await.unwrap().unwrap();
        assert_eq!(summary.exit, RunExit::Completed);
        assert_eq!(summary.activations, 2);
        assert_eq!(summary.last_index, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *entries.lock().unwrap(),
            vec!["bank:init", "bank:exec", "bank:cleanup"]
        );
        assert_eq!(runner.handle().phase(1), Some(TaskPhase::NotStarted));
    }
}
