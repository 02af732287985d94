//! # Task abstractions.
//!
//! This module provides the core task-related types:
//! - [`Task`] - trait for sequential async tasks driven by the runner
//! - [`TaskOutcome`] - what the runner does after `execute` (`Next(i)` or `AwaitSignal`)
//! - [`TickHook`] - per-tick capability of tick-resident tasks
//! - [`TickResident`] / [`TickLogic`] - stock tick-resident task
//! - [`TaskFn`] - function-based task implementation
//! - [`TaskContext`] / [`TickContext`] / [`Host`] - what task logic can reach

mod context;
mod task;
mod task_fn;
mod tick_resident;

pub use context::{Host, TaskContext, TickContext};
pub use task::{Task, TaskOutcome, TaskPhase, TickHook};
pub use task_fn::TaskFn;
pub use tick_resident::{TickLogic, TickResident};
