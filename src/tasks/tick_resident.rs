//! # Tick-resident tasks.
//!
//! Some tasks do their real work once per host tick rather than in a single
//! async body (e.g. watching an animation, counting items as they arrive).
//! [`TickResident`] wraps a [`TickLogic`] and provides the lifecycle glue:
//!
//! ```text
//! initialize ─► running = true, ticks = 0, logic.on_start()
//! execute    ─► initialize (if not yet running) ─► AwaitSignal
//! each tick  ─► running? ticks += 1, logic.on_tick(host) : false
//! cleanup    ─► running = false, logic.on_stop()
//! ```
//!
//! ## Rules
//! - `process_tick` returns `false` without calling the logic once `running` is cleared.
//! - `on_tick` returning `false` finishes the task; the runner transitions to the
//!   index the logic signaled earlier, or to the next index.

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::context::{TaskContext, TickContext};
use crate::tasks::task::{Task, TaskOutcome, TickHook};

/// Per-tick logic of a tick-resident task.
#[async_trait]
pub trait TickLogic<H: 'static>: Send + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Async setup (may read host state through the bridge).
    async fn on_start(&mut self, _ctx: &TaskContext<H>) -> Result<(), TaskError> {
        Ok(())
    }

    /// Called once per tick while running; `Ok(false)` finishes the task.
    fn on_tick(&mut self, host: &mut H, tick: &TickContext) -> Result<bool, TaskError>;

    /// Async teardown.
    async fn on_stop(&mut self, _ctx: &TaskContext<H>) -> Result<(), TaskError> {
        Ok(())
    }

    /// Called once when this task's failure terminates the run.
    async fn on_error(&mut self, _ctx: &TaskContext<H>, _error: &TaskError) {}
}

/// Task whose work happens through the per-tick hook.
pub struct TickResident<L> {
    logic: L,
    running: bool,
    ticks: u64,
}

impl<L> TickResident<L> {
    /// Wraps `logic` into a task.
    pub fn new(logic: L) -> Self {
        Self {
            logic,
            running: false,
            ticks: 0,
        }
    }

    /// Returns `true` between `initialize` and `cleanup`.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ticks processed since the last `initialize`.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The wrapped logic.
    pub fn logic(&self) -> &L {
        &self.logic
    }
}

#[async_trait]
impl<H: 'static, L: TickLogic<H>> Task<H> for TickResident<L> {
    fn name(&self) -> &str {
        TickLogic::<H>::name(&self.logic)
    }

    async fn initialize(&mut self, ctx: &TaskContext<H>) -> Result<(), TaskError> {
        self.running = true;
        self.ticks = 0;
        self.logic.on_start(ctx).await
    }

    async fn execute(&mut self, ctx: &TaskContext<H>) -> Result<TaskOutcome, TaskError> {
        tracing::info!(task = TickLogic::<H>::name(&self.logic), "starting tick-resident task");
        if !self.running {
            Task::<H>::initialize(self, ctx).await?;
        }
        Ok(TaskOutcome::AwaitSignal)
    }

    async fn cleanup(&mut self, ctx: &TaskContext<H>) -> Result<(), TaskError> {
        self.running = false;
        self.logic.on_stop(ctx).await
    }

    async fn on_error(&mut self, ctx: &TaskContext<H>, error: &TaskError) {
        self.logic.on_error(ctx, error).await;
    }

    fn tick_hook(&mut self) -> Option<&mut dyn TickHook<H>> {
        Some(self)
    }
}

impl<H: 'static, L: TickLogic<H>> TickHook<H> for TickResident<L> {
    fn process_tick(&mut self, host: &mut H, ctx: &TickContext) -> Result<bool, TaskError> {
        if !self.running {
            return Ok(false);
        }
        self.ticks += 1;
        let ctx = ctx.clone().with_task_tick(self.ticks);
        self.logic.on_tick(host, &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Config, Runner};

    #[derive(Default)]
    struct Counter {
        seen: Vec<(u64, u64)>,
        started: u32,
        stopped: u32,
    }

    #[async_trait]
    impl TickLogic<u32> for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        async fn on_start(&mut self, _ctx: &TaskContext<u32>) -> Result<(), TaskError> {
            self.started += 1;
            Ok(())
        }

        fn on_tick(&mut self, host: &mut u32, tick: &TickContext) -> Result<bool, TaskError> {
            *host += 1;
            self.seen.push((tick.tick(), tick.task_tick()));
            Ok(tick.task_tick() < 2)
        }

        async fn on_stop(&mut self, _ctx: &TaskContext<u32>) -> Result<(), TaskError> {
            self.stopped += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_ticks_only_between_initialize_and_cleanup() {
        let runner: Runner<u32> = Runner::builder(Config::default()).build();
        let ctx = runner.context().clone();
        let mut task = TickResident::new(Counter::default());
        let mut host = 0u32;

        let before = TickContext::new(1, 0, runner.handle().clone());
        assert_eq!(task.process_tick(&mut host, &before), Ok(false));
        assert_eq!(host, 0);

        assert_eq!(task.execute(&ctx).await, Ok(TaskOutcome::AwaitSignal));
        assert!(task.is_running());
        assert_eq!(task.execute(&ctx).await, Ok(TaskOutcome::AwaitSignal));
        assert_eq!(task.logic().started, 1);

        let tick = |n| TickContext::new(n, 0, runner.handle().clone());
        assert_eq!(task.process_tick(&mut host, &tick(7)), Ok(true));
        assert_eq!(task.process_tick(&mut host, &tick(8)), Ok(false));
        assert_eq!(task.ticks(), 2);

        Task::<u32>::cleanup(&mut task, &ctx).await.unwrap();
        assert!(!task.is_running());
        assert_eq!(task.process_tick(&mut host, &tick(9)), Ok(false));

        assert_eq!(host, 2);
        assert_eq!(task.logic().seen, vec![(7, 1), (8, 2)]);
        assert_eq!(task.logic().stopped, 1);
    }
}
