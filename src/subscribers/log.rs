//! # LogWriter: renders runtime events through `tracing`.
//!
//! Routine traffic (dispatched/dropped events) is logged at `debug`/`trace`,
//! lifecycle at `info`, failures at `warn`/`error`.
//!
//! ## Example output
//! ```text
//! INFO  sway_dispatch::events: handlers resolved count=3
//! INFO  sway_dispatch::events: subscribed count=1
//! DEBUG sway_dispatch::events: event dispatched event="window" change="focus" handler="on_focus"
//! ERROR sway_dispatch::events: unit failed unit="handlers:heartbeat" reason="execution failed: boom"
//! INFO  sway_dispatch::events: connection closed
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, trace, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const EVENTS_TARGET: &str = "sway_dispatch::events";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let unit = e.unit.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::HandlersResolved => {
                info!(target: EVENTS_TARGET, count = e.count, "handlers resolved");
            }
            EventKind::Connected => info!(target: EVENTS_TARGET, "connected"),
            EventKind::Subscribed => {
                info!(target: EVENTS_TARGET, count = e.count, "subscribed");
            }
            EventKind::EventDispatched => debug!(
                target: EVENTS_TARGET,
                event = e.event.as_deref(),
                change = e.change.as_deref(),
                handler = e.handler.as_deref(),
                "event dispatched"
            ),
            EventKind::EventDropped => trace!(
                target: EVENTS_TARGET,
                event = e.event.as_deref(),
                change = e.change.as_deref(),
                "event has no handler"
            ),
            EventKind::UnitStarting => info!(target: EVENTS_TARGET, unit, "unit starting"),
            EventKind::UnitStopped => info!(target: EVENTS_TARGET, unit, "unit stopped"),
            EventKind::UnitFailed => error!(
                target: EVENTS_TARGET,
                unit,
                reason,
                event = e.event.as_deref(),
                change = e.change.as_deref(),
                handler = e.handler.as_deref(),
                "unit failed"
            ),
            EventKind::ShutdownRequested => {
                info!(target: EVENTS_TARGET, reason, "shutdown requested");
            }
            EventKind::AllStoppedWithin => info!(target: EVENTS_TARGET, "all units stopped"),
            EventKind::GraceExceeded => {
                warn!(target: EVENTS_TARGET, aborted = e.count, "grace period exceeded");
            }
            EventKind::ConnectionClosed => info!(target: EVENTS_TARGET, "connection closed"),
            EventKind::SubscriberOverflow => {
                warn!(target: EVENTS_TARGET, subscriber = unit, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                warn!(target: EVENTS_TARGET, subscriber = unit, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
