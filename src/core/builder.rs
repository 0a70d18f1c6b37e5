use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::supervisor::Supervisor;
use crate::config::DaemonConfig;
use crate::events::Bus;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`Supervisor`].
pub struct SupervisorBuilder {
    cfg: DaemonConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: DaemonConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (resolution, dispatch, unit
    /// lifecycle, shutdown) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the supervisor.
    ///
    /// Spawns the subscriber workers, so it must be called from within a
    /// tokio runtime.
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        Arc::new(Supervisor::new_internal(
            self.cfg,
            bus,
            subs,
            CancellationToken::new(),
        ))
    }
}
