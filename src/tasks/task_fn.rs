//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: FnMut(TaskContext<H>) -> Fut`, producing a
//! fresh future per activation. Handy for short steps that need no
//! `initialize`/`cleanup` of their own.
//!
//! ## Example
//! ```rust
//! use tickvisor::{TaskContext, TaskError, TaskFn, TaskOutcome};
//!
//! let step = TaskFn::new("read-level", |ctx: TaskContext<u32>| async move {
//!     let level = ctx.run_on_tick(|host: &mut u32| *host).await?;
//!     if level == 0 {
//!         return Err(TaskError::fatal("not logged in"));
//!     }
//!     Ok(TaskOutcome::Next(ctx.current_index() + 1))
//! });
//!
//! assert_eq!(step.name(), "read-level");
//! ```

use std::borrow::Cow;
use std::future::Future;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::context::TaskContext;
use crate::tasks::task::{Task, TaskOutcome};

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Task name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<H, F, Fut> Task<H> for TaskFn<F>
where
    H: 'static,
    F: FnMut(TaskContext<H>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<TaskOutcome, TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&mut self, ctx: &TaskContext<H>) -> Result<TaskOutcome, TaskError> {
        (self.f)(ctx.clone()).await
    }
}
