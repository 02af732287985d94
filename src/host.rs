//! # Host lifecycle glue.
//!
//! [`Orchestrator`] is what a host integration holds on to: it starts the run
//! loop on a tokio runtime, forwards tick callbacks and stops the runner on
//! shutdown.
//!
//! ```text
//! host startup  ─► Orchestrator::start(runner, rt) ─► rt.spawn(runner.run())
//! host tick     ─► Orchestrator::on_tick(&mut host) ─► Runner::on_tick
//! host shutdown ─► Orchestrator::shutdown()          ─► RunnerHandle::stop
//!                  Orchestrator::join().await        ─► run loop finished
//! ```
//!
//! A run-loop failure is logged here and never reaches the host.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::core::{RunSummary, Runner, RunnerHandle, TickReport};

/// Owns a started runner on behalf of the host.
pub struct Orchestrator<H: 'static> {
    runner: Arc<Runner<H>>,
    join: Mutex<Option<JoinHandle<Option<RunSummary>>>>,
}

impl<H: 'static> Orchestrator<H> {
    /// Spawns `runner.run()` on `rt` and returns immediately.
    pub fn start(runner: Runner<H>, rt: &Handle) -> Self {
        let runner = Arc::new(runner);
        let task_runner = Arc::clone(&runner);
        let join = rt.spawn(async move {
            match task_runner.run().await {
                Ok(summary) => Some(summary),
                Err(err) => {
                    error!(error = %err, label = err.as_label(), "runner failed");
                    None
                }
            }
        });
        info!(tasks = runner.task_count(), "orchestrator started");
        Self {
            runner,
            join: Mutex::new(Some(join)),
        }
    }

    /// Forwards one host tick.
    pub fn on_tick(&self, host: &mut H) -> TickReport {
        self.runner.on_tick(host)
    }

    /// Requests the runner to stop; the loop finishes its final cleanup in the background.
    pub fn shutdown(&self) {
        info!("orchestrator shutdown requested");
        self.runner.stop();
    }

    /// Waits for the run loop to finish.
    ///
    /// Returns `None` if the run failed (already logged), panicked, or was
    /// joined before.
    pub async fn join(&self) -> Option<RunSummary> {
        let join = self
            .join
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        match join.await {
            Ok(summary) => summary,
            Err(err) => {
                error!(error = %err, "run loop aborted");
                None
            }
        }
    }

    /// The managed runner.
    pub fn runner(&self) -> &Arc<Runner<H>> {
        &self.runner
    }

    /// Handle of the managed runner.
    pub fn handle(&self) -> &RunnerHandle {
        self.runner.handle()
    }
}
