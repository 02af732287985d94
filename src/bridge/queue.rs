//! # Operation queue and drain.
//!
//! [`TickBridge`] accepts host-touching work from task logic at any time and
//! executes it only when the host calls [`TickBridge::drain`] from its tick
//! callback.
//!
//! ## Drain flow
//! ```text
//! drain(host)
//!   loop {
//!     ├─► pop oldest operation (queue lock released immediately)
//!     ├─► claim its pending entry
//!     │     ├─ Live    ─► run thunk with &mut host ─► send outcome
//!     │     ├─ Expired ─► drop (future observes Timeout)
//!     │     └─ Gone    ─► skip (future already timed out or was dropped)
//!     └─► until queue empty (including work queued by thunks in this drain)
//!   }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::future::TickFuture;
use super::pending::{Claim, PendingTable};
use crate::core::DEFAULT_OP_TIMEOUT;
use crate::error::TaskError;

type Thunk<H> = Box<dyn FnOnce(&mut H) + Send + 'static>;

/// One queued unit of host-touching work.
struct PendingOperation<H> {
    id: u64,
    run: Thunk<H>,
}

struct Inner<H> {
    queue: Mutex<VecDeque<PendingOperation<H>>>,
    pending: Arc<PendingTable>,
    next_id: AtomicU64,
    default_timeout: Duration,
}

/// Counters describing what a single [`TickBridge::drain`] call did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Thunks invoked (successfully or not).
    pub executed: usize,
    /// Operations dropped because their deadline passed before this drain.
    pub expired: usize,
    /// Operations whose future had already settled or been dropped.
    pub skipped: usize,
}

impl DrainReport {
    /// Total number of operations removed from the queue.
    pub fn total(&self) -> usize {
        self.executed + self.expired + self.skipped
    }
}

/// FIFO bridge between async task logic and the host's tick callback.
///
/// Cheap to clone; all clones share one queue.
///
/// ## Example
/// ```
/// use tickvisor::TickBridge;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// struct Game { level: u32 }
///
/// let bridge: TickBridge<Game> = TickBridge::default();
/// let level = bridge.submit(|game: &mut Game| game.level);
///
/// // Host side, inside its tick callback:
/// let mut game = Game { level: 42 };
/// bridge.drain(&mut game);
///
/// assert_eq!(level.await.unwrap(), 42);
/// # }
/// ```
pub struct TickBridge<H> {
    inner: Arc<Inner<H>>,
}

impl<H> Clone for TickBridge<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: 'static> Default for TickBridge<H> {
    fn default() -> Self {
        Self::new(DEFAULT_OP_TIMEOUT)
    }
}

impl<H: 'static> fmt::Debug for TickBridge<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickBridge")
            .field("queued", &self.queued())
            .field("pending", &self.pending())
            .field("default_timeout", &self.inner.default_timeout)
            .finish()
    }
}

impl<H: 'static> TickBridge<H> {
    /// Creates a bridge whose operations time out after `default_timeout` unless overridden.
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(VecDeque::new()),
                pending: Arc::new(PendingTable::default()),
                next_id: AtomicU64::new(0),
                default_timeout,
            }),
        }
    }

    /// Default deadline applied by [`submit`](Self::submit).
    pub fn default_timeout(&self) -> Duration {
        self.inner.default_timeout
    }

    /// Queues `thunk` for the next tick with the default deadline.
    pub fn submit<F, R>(&self, thunk: F) -> TickFuture<R>
    where
        F: FnOnce(&mut H) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_with_timeout(thunk, self.inner.default_timeout)
    }

    /// Queues `thunk` for the next tick with an explicit deadline.
    pub fn submit_with_timeout<F, R>(&self, thunk: F, timeout: Duration) -> TickFuture<R>
    where
        F: FnOnce(&mut H) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.enqueue(move |host| Ok(thunk(host)), timeout)
    }

    /// Queues a fallible thunk; an `Err` settles the future with [`TaskError::Execution`].
    pub fn try_submit<F, R, E>(&self, thunk: F) -> TickFuture<R>
    where
        F: FnOnce(&mut H) -> Result<R, E> + Send + 'static,
        R: Send + 'static,
        E: fmt::Display,
    {
        self.try_submit_with_timeout(thunk, self.inner.default_timeout)
    }

    /// Fallible variant of [`submit_with_timeout`](Self::submit_with_timeout).
    pub fn try_submit_with_timeout<F, R, E>(&self, thunk: F, timeout: Duration) -> TickFuture<R>
    where
        F: FnOnce(&mut H) -> Result<R, E> + Send + 'static,
        R: Send + 'static,
        E: fmt::Display,
    {
        self.enqueue(move |host| thunk(host).map_err(|e| e.to_string()), timeout)
    }

    /// Executes every queued operation, oldest first, with access to `host`.
    ///
    /// Must only be called from the host's tick callback. Never panics on
    /// behalf of a thunk.
    pub fn drain(&self, host: &mut H) -> DrainReport {
        let mut report = DrainReport::default();

        loop {
            let next = self.lock_queue().pop_front();
            let Some(op) = next else { break };

            match self.inner.pending.claim(op.id, Instant::now()) {
                Claim::Live => {
                    (op.run)(host);
                    report.executed += 1;
                }
                Claim::Expired => {
                    debug!(op = op.id, "dropping tick operation past its deadline");
                    report.expired += 1;
                }
                Claim::Gone => {
                    trace!(op = op.id, "skipping settled tick operation");
                    report.skipped += 1;
                }
            }
        }

        if report.total() > 0 {
            trace!(
                executed = report.executed,
                expired = report.expired,
                skipped = report.skipped,
                "tick drain complete"
            );
        }
        report
    }

    /// Number of operations waiting for the next drain.
    pub fn queued(&self) -> usize {
        self.lock_queue().len()
    }

    /// Number of completion handles that have not settled yet.
    pub fn pending(&self) -> usize {
        self.inner.pending.len()
    }

    fn enqueue<F, R>(&self, thunk: F, timeout: Duration) -> TickFuture<R>
    where
        F: FnOnce(&mut H) -> Result<R, String> + Send + 'static,
        R: Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let deadline = Instant::now() + timeout;
        let (tx, rx) = oneshot::channel();

        let run: Thunk<H> = Box::new(move |host: &mut H| {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| thunk(host))) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(error)) => Err(TaskError::Execution { error }),
                Err(payload) => Err(TaskError::Execution {
                    error: panic_message(payload.as_ref()),
                }),
            };
            // Receiver gone means the caller stopped waiting; nothing to report.
            let _ = tx.send(outcome);
        });

        self.inner.pending.insert(id, deadline);
        self.lock_queue().push_back(PendingOperation { id, run });

        TickFuture::new(id, rx, deadline, timeout, Arc::clone(&self.inner.pending))
    }

    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<PendingOperation<H>>> {
        self.inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
