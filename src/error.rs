//! Error types used by the tickvisor runtime and tasks.
//!
//! This module defines two main error enums:
//!
//! - [`TaskError`]: errors raised while a task runs (bridge operations and task bodies).
//! - [`RuntimeError`]: errors raised by the task runner itself.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics
//! and additional utilities such as [`TaskError::is_recoverable`].

use std::time::Duration;
use thiserror::Error;

use crate::core::RunnerState;

/// # Errors produced by task execution.
///
/// Bridge-level failures (`Timeout`, `Execution`) are local to the task that
/// issued the operation; the task decides whether to retry, abandon or fail.
/// Anything a task returns from `execute` is fatal to the current run.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// No tick drained the operation before its deadline; the thunk was never invoked.
    #[error("tick timeout after {timeout:?}")]
    Timeout {
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// The thunk failed (returned an error or panicked) while running inside a tick.
    #[error("tick operation failed: {error}")]
    Execution {
        /// The underlying error message.
        error: String,
    },

    /// Task logic failed.
    #[error("task failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Unrecoverable precondition failure (e.g. a required host entity is absent).
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// The operation was abandoned because the bridge went away.
    #[error("operation cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`TaskError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        TaskError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tickvisor::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(3) };
    /// assert_eq!(err.as_label(), "tick_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "tick_timeout",
            TaskError::Execution { .. } => "tick_execution_failed",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Canceled => "operation_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Execution { error } => format!("execution: {error}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Canceled => "operation cancelled".to_string(),
        }
    }

    /// Indicates whether the calling task can reasonably recover from the error.
    ///
    /// Returns `true` for bridge-level failures ([`TaskError::Timeout`] and
    /// [`TaskError::Execution`]), `false` otherwise.
    ///
    /// # Example
    /// ```
    /// use tickvisor::TaskError;
    ///
    /// let local = TaskError::Execution { error: "no such widget".into() };
    /// assert!(local.is_recoverable());
    ///
    /// let fatal = TaskError::fatal("player not logged in");
    /// assert!(!fatal.is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TaskError::Timeout { .. } | TaskError::Execution { .. })
    }
}

/// # Errors produced by the task runner.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// `run` was called on a runner that is not idle; runners are not restartable.
    #[error("runner is {state:?}; a runner can only be run once")]
    NotIdle {
        /// State observed when `run` was called.
        state: RunnerState,
    },

    /// The run loop terminated because a task failed.
    #[error("task {task:?} (index {index}) failed: {error}")]
    TaskFailed {
        /// Name of the failing task.
        task: String,
        /// Index of the failing task.
        index: usize,
        /// The task's error.
        error: TaskError,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NotIdle { .. } => "runner_not_idle",
            RuntimeError::TaskFailed { .. } => "runner_task_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::NotIdle { state } => format!("runner not idle: state={state:?}"),
            RuntimeError::TaskFailed { task, index, error } => {
                format!("task {task} at index {index} failed; {}", error.as_message())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        assert!(
            TaskError::Timeout {
                timeout: Duration::from_millis(10)
            }
            .is_recoverable()
        );
        assert!(!TaskError::fail("walking failed").is_recoverable());
        assert!(!TaskError::Canceled.is_recoverable());
    }

    #[test]
    fn test_runtime_error_message_names_task() {
        let err = RuntimeError::TaskFailed {
            task: "walk".into(),
            index: 1,
            error: TaskError::fail("walking failed"),
        };
        assert_eq!(err.as_label(), "runner_task_failed");
        assert!(err.as_message().contains("walk"));
        assert!(err.to_string().contains("walking failed"));
    }
}
