//! # Deadline-guarded completion future.
//!
//! [`TickFuture`] is returned by every bridge submission. It resolves with the
//! thunk's outcome once a tick drains the operation, or with
//! [`TaskError::Timeout`] when the deadline elapses first.
//!
//! The deadline timer is created on first poll, so operations can be submitted
//! from outside a tokio context (e.g. from a thunk running on the host thread).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{self, Instant, Sleep};

use super::pending::PendingTable;
use crate::error::TaskError;

/// Completion handle of one bridge operation.
///
/// Dropping the future abandons the operation: its pending entry is removed and
/// a later drain skips the thunk. Use [`TickFuture::detach`] for fire-and-forget
/// commands that must still run.
#[must_use = "dropping a TickFuture abandons the operation; use `detach` to run it anyway"]
pub struct TickFuture<R> {
    id: u64,
    rx: oneshot::Receiver<Result<R, TaskError>>,
    deadline: Instant,
    timeout: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
    pending: Arc<PendingTable>,
    done: bool,
}

impl<R> TickFuture<R> {
    pub(crate) fn new(
        id: u64,
        rx: oneshot::Receiver<Result<R, TaskError>>,
        deadline: Instant,
        timeout: Duration,
        pending: Arc<PendingTable>,
    ) -> Self {
        Self {
            id,
            rx,
            deadline,
            timeout,
            sleep: None,
            pending,
            done: false,
        }
    }

    /// Identifier of the underlying operation (monotonic per bridge).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Lets the operation run on the next tick without waiting for its outcome.
    pub fn detach(mut self) {
        self.done = true;
    }

    fn settle(&mut self, outcome: Result<R, TaskError>) -> Poll<Result<R, TaskError>> {
        self.done = true;
        self.sleep = None;
        Poll::Ready(outcome)
    }
}

impl<R> Future for TickFuture<R> {
    type Output = Result<R, TaskError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => return this.settle(outcome),
            Poll::Ready(Err(_closed)) => {
                // Sender dropped unsent: either a drain discarded the expired
                // operation, or the bridge itself is gone.
                this.pending.remove(this.id);
                let err = if Instant::now() >= this.deadline {
                    TaskError::Timeout {
                        timeout: this.timeout,
                    }
                } else {
                    TaskError::Canceled
                };
                return this.settle(Err(err));
            }
            Poll::Pending => {}
        }

        let deadline = this.deadline;
        let sleep = this
            .sleep
            .get_or_insert_with(|| Box::pin(time::sleep_until(deadline)));

        if sleep.as_mut().poll(cx).is_ready() && this.pending.remove(this.id) {
            let timeout = this.timeout;
            return this.settle(Err(TaskError::Timeout { timeout }));
        }
        // Either still waiting, or a drain already claimed the entry and the
        // outcome is about to arrive on `rx`.
        Poll::Pending
    }
}

impl<R> Drop for TickFuture<R> {
    fn drop(&mut self) {
        if !self.done {
            self.pending.remove(self.id);
        }
    }
}
