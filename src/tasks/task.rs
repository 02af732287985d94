//! # Task abstraction.
//!
//! A [`Task`] is one step of an automation plan. The runner drives it through a
//! three-phase lifecycle:
//!
//! ```text
//! initialize ──► execute ──► (Next(i) | AwaitSignal) ──► ... ──► cleanup
//! ```
//!
//! Tasks never touch host state directly; they go through the
//! [`TaskContext`] helpers, which queue work on the tick bridge.
//!
//! Tick-resident tasks additionally expose a [`TickHook`] through
//! [`Task::tick_hook`]; the runner calls it once per host tick while the task
//! is active. See [`TickResident`](crate::TickResident) for the stock implementation.

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::context::{TaskContext, TickContext};

/// What the runner should do after `execute` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Make this index current. The current index re-runs the same task; an
    /// index past the end of the sequence finishes the run.
    Next(usize),
    /// Stay active and suspend until a transition is signaled.
    AwaitSignal,
}

/// Lifecycle phase of a task, as tracked by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskPhase {
    /// Never activated.
    #[default]
    NotStarted,
    /// `initialize` in progress.
    Initializing,
    /// `execute` in progress, or suspended awaiting a transition.
    Executing,
    /// `cleanup` in progress.
    CleaningUp,
    /// Cleaned up; may be activated again later.
    Done,
}

/// # Sequential unit of automation logic.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tickvisor::{Task, TaskContext, TaskError, TaskOutcome};
///
/// struct Greet;
///
/// #[async_trait]
/// impl Task<u32> for Greet {
///     fn name(&self) -> &str { "greet" }
///
///     async fn execute(&mut self, ctx: &TaskContext<u32>) -> Result<TaskOutcome, TaskError> {
///         let level = ctx.run_on_tick(|host: &mut u32| *host).await?;
///         if level == 0 {
///             return Err(TaskError::fatal("host not ready"));
///         }
///         Ok(TaskOutcome::Next(ctx.current_index() + 1))
///     }
/// }
/// ```
#[async_trait]
pub trait Task<H: 'static>: Send + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Establishes task-local state; runs right before every `execute`.
    async fn initialize(&mut self, _ctx: &TaskContext<H>) -> Result<(), TaskError> {
        Ok(())
    }

    /// Main logic. Return an error for unrecoverable precondition failures
    /// instead of silently returning.
    async fn execute(&mut self, ctx: &TaskContext<H>) -> Result<TaskOutcome, TaskError>;

    /// Teardown; runs before a different task becomes active and once more
    /// when the runner terminates with this task active.
    async fn cleanup(&mut self, _ctx: &TaskContext<H>) -> Result<(), TaskError> {
        Ok(())
    }

    /// Called once when this task's failure terminates the run.
    async fn on_error(&mut self, _ctx: &TaskContext<H>, _error: &TaskError) {}

    /// Per-tick capability. `None` for ordinary tasks.
    fn tick_hook(&mut self) -> Option<&mut dyn TickHook<H>> {
        None
    }
}

/// Per-tick processing for tick-resident tasks.
///
/// Runs synchronously inside the host's tick callback with direct host access.
pub trait TickHook<H>: Send {
    /// Returns `Ok(false)` when the task is finished and the runner should
    /// transition, `Ok(true)` to remain active. An error is a task failure.
    fn process_tick(&mut self, host: &mut H, ctx: &TickContext) -> Result<bool, TaskError>;
}
