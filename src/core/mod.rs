//! Runtime core: sequencing and lifecycle.
//!
//! The public API from this module is [`Runner`] (built through
//! [`RunnerBuilder`]) and its cloneable [`RunnerHandle`].
//!
//! Internal modules:
//! - [`config`]: operation deadline and bus sizing;
//! - [`control`]: shared runner state, transition waits and stop requests;
//! - [`runner`]: the sequential run loop and tick integration;
//! - [`builder`]: assembles tasks, bridge, bus and subscribers.

mod builder;
mod config;
mod control;
mod runner;

pub use builder::RunnerBuilder;
pub use config::{Config, DEFAULT_OP_TIMEOUT};
pub use control::{RunnerHandle, RunnerState};
pub use runner::{RunExit, RunSummary, Runner, TickReport};
