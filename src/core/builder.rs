use std::sync::Arc;

use crate::{
    bridge::TickBridge,
    core::Config,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
    tasks::Task,
};
use super::runner::Runner;

/// Builder for constructing a [`Runner`] with its task sequence.
///
/// Task order is the order of `with_task` calls; indices start at 0.
pub struct RunnerBuilder<H: 'static> {
    cfg: Config,
    tasks: Vec<Box<dyn Task<H>>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    bridge: Option<TickBridge<H>>,
}

impl<H: 'static> RunnerBuilder<H> {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            tasks: Vec::new(),
            subscribers: Vec::new(),
            bridge: None,
        }
    }

    /// Appends a task to the sequence.
    pub fn with_task<T: Task<H>>(mut self, task: T) -> Self {
        self.tasks.push(Box::new(task));
        self
    }

    /// Appends an already boxed task to the sequence.
    pub fn with_boxed_task(mut self, task: Box<dyn Task<H>>) -> Self {
        self.tasks.push(task);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (activations, transitions, failures)
    /// through dedicated workers with bounded queues. Building with subscribers
    /// requires a tokio runtime context.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Uses an existing bridge instead of creating one from [`Config::op_timeout`].
    pub fn with_bridge(mut self, bridge: TickBridge<H>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Builds the runner in the `Idle` state.
    pub fn build(self) -> Runner<H> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let bridge = self
            .bridge
            .unwrap_or_else(|| TickBridge::new(self.cfg.op_timeout()));

        Runner::new_internal(self.tasks, bridge, bus, subs)
    }
}
