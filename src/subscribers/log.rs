//! # Event logging subscriber for debugging and demos.
//!
//! [`LogWriter`] turns runtime events into `tracing` records under the
//! `tickvisor::events` target, one line per event.
//!
//! ## Output format
//! ```text
//! [runner-started] tasks=5
//! [activated] task=walk index=1
//! [awaiting] task=chop index=2
//! [signaled] index=2 target=3
//! [failed] task=walk index=1 reason="fail: never got near the tree"
//! [stop-requested] index=2
//! [runner-stopped] index=2
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "tickvisor::events";

/// Subscriber that writes every event through `tracing`.
///
/// Enabled via the `logging` feature. Failures are logged at `warn`, everything
/// else at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    fn render(e: &Event) -> String {
        let task = e.task.as_deref().unwrap_or("-");
        let index = e.index.map_or_else(|| "-".to_string(), |i| i.to_string());
        match e.kind {
            EventKind::RunnerStarted => format!("[runner-started] tasks={index}"),
            EventKind::TaskActivated => format!("[activated] task={task} index={index}"),
            EventKind::TaskCleanedUp => format!("[cleaned-up] task={task} index={index}"),
            EventKind::TransitionAwaited => format!("[awaiting] task={task} index={index}"),
            EventKind::TransitionSignaled => {
                format!("[signaled] index={index} target={:?}", e.target)
            }
            EventKind::TaskFailed => {
                format!("[failed] task={task} index={index} reason={:?}", e.reason)
            }
            EventKind::StopRequested => format!("[stop-requested] index={index}"),
            EventKind::RunnerStopped => match &e.reason {
                Some(reason) => format!("[runner-stopped] index={index} reason={reason:?}"),
                None => format!("[runner-stopped] index={index}"),
            },
            EventKind::SubscriberOverflow => {
                format!("[subscriber-overflow] subscriber={task} reason={:?}", e.reason)
            }
            EventKind::SubscriberPanicked => {
                format!("[subscriber-panicked] subscriber={task} reason={:?}", e.reason)
            }
        }
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let line = Self::render(e);
        match e.kind {
            EventKind::TaskFailed
            | EventKind::SubscriberOverflow
            | EventKind::SubscriberPanicked => {
                tracing::warn!(target: TARGET, seq = e.seq, "{line}");
            }
            _ => tracing::debug!(target: TARGET, seq = e.seq, "{line}"),
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lines() {
        let ev = Event::new(EventKind::TaskActivated)
            .with_task("walk")
            .with_index(1);
        assert_eq!(LogWriter::render(&ev), "[activated] task=walk index=1");

        let ev = Event::new(EventKind::TransitionSignaled)
            .with_index(2)
            .with_target(3);
        assert_eq!(LogWriter::render(&ev), "[signaled] index=2 target=Some(3)");

        let ev = Event::new(EventKind::RunnerStopped).with_index(4);
        assert_eq!(LogWriter::render(&ev), "[runner-stopped] index=4");
    }
}
