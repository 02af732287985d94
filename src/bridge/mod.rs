//! # Tick synchronization bridge.
//!
//! The host only lets its state be touched from inside its tick callback. Task
//! logic, on the other hand, runs as ordinary async code on tokio. The bridge
//! reconciles the two:
//!
//! ```text
//!   task logic (tokio)                           host thread
//!   ───────────────────                          ───────────
//!   bridge.submit(|host| ...) ──► [ FIFO queue ] ◄── on_tick(host)
//!        │                          │                  └─► drain(host)
//!        ▼                          │                        ├─► claim pending entry
//!   TickFuture ◄──── oneshot ───────┘                        ├─► thunk(host)
//!        │                                                   └─► send outcome
//!        └─► deadline elapsed, not yet drained ─► Err(Timeout), entry removed
//! ```
//!
//! ## Rules
//! - Operations are queued at `submit` time; drain runs them strictly in submission order.
//! - A drain also runs operations enqueued by thunks earlier in the same drain.
//! - Each thunk runs at most once, and never after its deadline elapsed.
//! - Every future settles exactly once: value, `Execution` error, or `Timeout`.
//! - `drain` never panics on behalf of a thunk; failures become settlements.

mod future;
mod pending;
mod queue;

pub use future::TickFuture;
pub use queue::{DrainReport, TickBridge};

pub(crate) use queue::panic_message;
