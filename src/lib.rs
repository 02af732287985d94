//! # tickvisor
//!
//! **Tickvisor** runs multi-step async automation against a host that only
//! exposes its mutable state inside brief, periodic, synchronous callbacks
//! ("ticks").
//!
//! Task logic is written as ordinary async code. Whenever it needs the host it
//! submits a closure to the [`TickBridge`]; the host drains the bridge from its
//! tick callback, and the awaiting task resumes with the result. A sequential
//! [`Runner`] owns the ordered task list and decides which task is active.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────────────┐
//!     │  Task #0     │   │  Task #1     │   │  TickResident #2     │
//!     │  (TaskFn)    │   │ (impl Task)  │   │  (impl TickLogic)    │
//!     └──────┬───────┘   └──────┬───────┘   └──────────┬───────────┘
//!            ▼                  ▼                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runner (sequential state machine, at most one active task)       │
//! │  - RunnerHandle (state, current index, transition wait, stop)     │
//! │  - TaskContext  (bridge + handle, given to every task)            │
//! │  - Bus          (broadcast events)                                │
//! └──────┬──────────────────────────────┬─────────────────────────────┘
//!        │ run_on_tick / read_varbit    │ on_tick(host)
//!        ▼                              ▼
//! ┌────────────────────────┐    ┌──────────────────────────────────┐
//! │ TickBridge             │◄───│ host tick callback               │
//! │ FIFO of operations,    │    │  1. bridge.drain(host)           │
//! │ deadline per operation │    │  2. active.process_tick(host)    │
//! └────────────────────────┘    └──────────────────────────────────┘
//!
//! Bus ──► subscriber_listener ──► SubscriberSet ──► worker per subscriber
//! ```
//!
//! ### Lifecycle
//! ```text
//! Runner::run()
//!
//! while running && current < len {
//!   ├─► cleanup(previous)
//!   ├─► publish TaskActivated{ task, index }
//!   ├─► initialize ─► execute
//!   │       ├─ Next(i)     ─► current = i
//!   │       ├─ AwaitSignal ─► wait for signal_transition / stop / tick failure
//!   │       └─ Err         ─► publish TaskFailed, on_error, exit
//! }
//! final cleanup ─► publish RunnerStopped
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                           |
//! |-------------------|----------------------------------------------------------------|----------------------------------------------|
//! | **Bridge**        | Tick-synchronized host access with per-operation deadlines.    | [`TickBridge`], [`TickFuture`]               |
//! | **Tasks**         | Async tasks and tick-resident tasks.                           | [`Task`], [`TaskFn`], [`TickResident`]       |
//! | **Runner**        | Ordered task sequence with transitions and stop.               | [`Runner`], [`RunnerHandle`]                 |
//! | **Host**          | Startup / tick / shutdown glue.                                | [`Orchestrator`], [`Host`]                   |
//! | **Subscriber API**| Hook into runner events.                                       | [`Subscribe`], [`ActivityTracker`]           |
//! | **Errors**        | Typed errors for operations and runs.                          | [`TaskError`], [`RuntimeError`]              |
//! | **Configuration** | Operation deadline and bus sizing.                             | [`Config`]                                   |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`](crate::subscribers::LogWriter), a subscriber
//!   that renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use tickvisor::{Config, Runner, RunnerState, TaskContext, TaskError, TaskFn, TaskOutcome};
//!
//! struct Game { logs: u32 }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let runner = Runner::builder(Config::default())
//!         .with_task(TaskFn::new("cut", |ctx: TaskContext<Game>| async move {
//!             ctx.run_on_tick(|game: &mut Game| game.logs += 1).await?;
//!             Ok::<_, TaskError>(TaskOutcome::Next(1))
//!         }))
//!         .build();
//!
//!     let mut game = Game { logs: 0 };
//!     let run = runner.run();
//!     tokio::pin!(run);
//!
//!     // The host side: tick until the sequence is done.
//!     let summary = loop {
//!         runner.on_tick(&mut game);
//!         tokio::select! {
//!             res = &mut run => break res.unwrap(),
//!             _ = tokio::task::yield_now() => {}
//!         }
//!     };
//!
//!     assert_eq!(game.logs, 1);
//!     assert_eq!(summary.activations, 1);
//!     assert_eq!(runner.handle().state(), RunnerState::Stopped);
//! }
//! ```

mod bridge;
mod core;
mod error;
mod events;
mod host;
pub mod logger;
pub mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use bridge::{DrainReport, TickBridge, TickFuture};
pub use crate::core::{
    Config, DEFAULT_OP_TIMEOUT, RunExit, RunSummary, Runner, RunnerBuilder, RunnerHandle,
    RunnerState, TickReport,
};
pub use error::{RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use host::Orchestrator;
pub use subscribers::{ActivityTracker, Subscribe, SubscriberSet};
pub use tasks::{
    Host, Task, TaskContext, TaskFn, TaskOutcome, TaskPhase, TickContext, TickHook, TickLogic,
    TickResident,
};
