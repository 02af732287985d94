//! # Active-task tracker with sequence-based ordering.
//!
//! Maintains an eventually consistent view of which task the runner has
//! active and how often each task was activated, using event sequence numbers
//! to handle out-of-order delivery.
//!
//! ## Architecture
//! ```text
//! Runner ──► Bus ──► subscriber_listener() ──► SubscriberSet ──► ActivityTracker::update()
//!                                                                       │
//!                                                                       ▼
//!                                                        { active, last_seq, activations }
//! ```
//!
//! ## Rules
//! - Only `TaskActivated` / `TaskCleanedUp` / `RunnerStopped` change the active task
//! - Events with `seq <= last_seq` are **rejected** (stale)

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

#[derive(Debug, Default)]
struct Activity {
    last_seq: u64,
    active: Option<(usize, String)>,
    activations: HashMap<String, u32>,
    stopped: bool,
}

/// Subscriber that tracks the active task and per-task activation counts.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    state: RwLock<Activity>,
}

impl ActivityTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an event if it is newer than the last one seen.
    ///
    /// Returns `true` when the event changed the tracked state.
    pub async fn update(&self, ev: &Event) -> bool {
        let mut state = self.state.write().await;
        if ev.seq <= state.last_seq {
            return false;
        }
        state.last_seq = ev.seq;

        match ev.kind {
            EventKind::TaskActivated => {
                let (Some(task), Some(index)) = (ev.task.as_deref(), ev.index) else {
                    return false;
                };
                *state.activations.entry(task.to_string()).or_insert(0) += 1;
                state.active = Some((index, task.to_string()));
                true
            }
            EventKind::TaskCleanedUp => {
                let active_index = state.active.as_ref().map(|(i, _)| *i);
                if active_index.is_some() && active_index == ev.index {
                    state.active = None;
                    return true;
                }
                false
            }
            EventKind::RunnerStopped => {
                state.active = None;
                state.stopped = true;
                true
            }
            _ => false,
        }
    }

    /// Name and index of the currently active task, if any.
    pub async fn active(&self) -> Option<(usize, String)> {
        self.state.read().await.active.clone()
    }

    /// How many times the named task has been activated.
    pub async fn activations(&self, task: &str) -> u32 {
        self.state
            .read()
            .await
            .activations
            .get(task)
            .copied()
            .unwrap_or(0)
    }

    /// Returns `true` once a `RunnerStopped` event was observed.
    pub async fn is_stopped(&self) -> bool {
        self.state.read().await.stopped
    }
}

#[async_trait]
impl Subscribe for ActivityTracker {
    async fn on_event(&self, event: &Event) {
        self.update(event).await;
    }

    fn name(&self) -> &'static str {
        "activity-tracker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activated(task: &str, index: usize) -> Event {
        Event::new(EventKind::TaskActivated)
            .with_task(task.to_string())
            .with_index(index)
    }

    #[tokio::test]
    async fn test_tracks_active_task_and_counts() {
        let tracker = ActivityTracker::new();

        assert!(tracker.update(&activated("walk", 1)).await);
        assert!(
            tracker
                .update(&Event::new(EventKind::TaskCleanedUp).with_index(1))
                .await
        );
        assert!(tracker.update(&activated("walk", 1)).await);

        assert_eq!(tracker.active().await, Some((1, "walk".to_string())));
        assert_eq!(tracker.activations("walk").await, 2);
        assert_eq!(tracker.activations("chop").await, 0);
    }

    #[tokio::test]
    async fn test_rejects_stale_events() {
        let tracker = ActivityTracker::new();
        let stale = activated("init", 0);
        let fresh = activated("walk", 1);

        assert!(tracker.update(&fresh).await);
        assert!(!tracker.update(&stale).await);
        assert_eq!(tracker.active().await, Some((1, "walk".to_string())));
    }
}
