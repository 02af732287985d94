//! # Event subscribers for the tickvisor runtime.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations
//! for handling runtime events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Runner ── publish(Event) ──► Bus ──► subscriber_listener ──► SubscriberSet
//!                                                                  │
//!                                                        ┌─────────┼─────────┐
//!                                                        ▼         ▼         ▼
//!                                                 ActivityTracker LogWriter Custom
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers** - observe and react to events (metrics, alerts)
//! - **Stateful subscribers** - maintain internal state based on events ([`ActivityTracker`])
//! - **Log writer** - `LogWriter` renders events through `tracing` (feature `logging`)

mod activity;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
mod log;

pub use activity::ActivityTracker;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;

#[cfg(feature = "logging")]
pub use log::LogWriter;
