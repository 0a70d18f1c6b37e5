//! # Runtime events emitted by the supervisor, the dispatcher and task units.
//!
//! [`EventKind`] classifies what happened:
//! - **Startup**: handlers resolved, connection opened, subscription sent
//! - **Dispatch**: an IPC event was routed to a handler or dropped
//! - **Units**: a unit (the dispatcher or a task) started, stopped or failed
//! - **Shutdown**: shutdown requested, units stopped (or grace exceeded), connection closed
//!
//! [`Event`] carries the optional metadata relevant to its kind.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically.
//!
//! ## Example
//! ```rust
//! use sway_dispatch::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::EventDispatched)
//!     .with_route("window", "focus")
//!     .with_handler("handlers:on_focus");
//!
//! assert_eq!(ev.kind, EventKind::EventDispatched);
//! assert_eq!(ev.event.as_deref(), Some("window"));
//! assert_eq!(ev.change.as_deref(), Some("focus"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `unit` (subscriber name) and `reason`.
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `unit` (subscriber name) and `reason`.
    SubscriberOverflow,

    // === Startup ===
    /// Every distinct handler reference resolved.
    ///
    /// Sets `count` (distinct references).
    HandlersResolved,

    /// Connection opened.
    Connected,

    /// Subscribe request accepted.
    ///
    /// Sets `count` (event names subscribed).
    Subscribed,

    // === Dispatch ===
    /// An IPC event was handled.
    ///
    /// Sets `event`, `change`, `handler`.
    EventDispatched,

    /// An IPC event had no handler and was discarded.
    ///
    /// Sets `event`, `change`.
    EventDropped,

    // === Units ===
    /// A unit started.
    ///
    /// Sets `unit`.
    UnitStarting,

    /// A unit stopped (finished or cancelled).
    ///
    /// Sets `unit`.
    UnitStopped,

    /// A unit failed; shutdown follows.
    ///
    /// Sets `unit`, `reason` and, for dispatch failures, `event`, `change`, `handler`.
    UnitFailed,

    // === Shutdown ===
    /// Shutdown requested (OS signal, explicit request or unit failure).
    ///
    /// Sets `reason`.
    ShutdownRequested,

    /// All units stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; remaining units were aborted.
    ///
    /// Sets `count` (aborted units).
    GraceExceeded,

    /// The connection was closed.
    ConnectionClosed,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Unit or subscriber name, if applicable.
    pub unit: Option<Arc<str>>,
    /// Handler name, if applicable.
    pub handler: Option<Arc<str>>,
    /// IPC event name, if applicable.
    pub event: Option<Arc<str>>,
    /// IPC change kind, if applicable.
    pub change: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Count attached to startup/shutdown events.
    pub count: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            unit: None,
            handler: None,
            event: None,
            change: None,
            reason: None,
            count: None,
        }
    }

    /// Attaches a unit name.
    #[inline]
    pub fn with_unit(mut self, unit: impl Into<Arc<str>>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Attaches a handler name.
    #[inline]
    pub fn with_handler(mut self, handler: impl Into<Arc<str>>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Attaches the IPC event name and change kind.
    #[inline]
    pub fn with_route(mut self, event: impl Into<Arc<str>>, change: impl Into<Arc<str>>) -> Self {
        self.event = Some(event.into());
        self.change = Some(change.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a count (saturating at `u32::MAX`).
    #[inline]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(u32::try_from(count).unwrap_or(u32::MAX));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_unit(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_unit(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::Connected);
        let b = Event::new(EventKind::Connected);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn count_saturates() {
        let ev = Event::new(EventKind::Subscribed).with_count(3);
        assert_eq!(ev.count, Some(3));
    }
}
