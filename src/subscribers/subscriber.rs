//! # Event subscriber trait.
//!
//! [`Subscribe`] plugs observers into the runtime event stream.
//!
//! Each subscriber gets:
//! - a dedicated worker task,
//! - a bounded queue (capacity via [`Subscribe::queue_capacity`]),
//! - panic isolation (panics are caught and reported as `EventKind::SubscriberPanicked`).
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use sway_dispatch::{Event, EventKind, Subscribe};
//!
//! struct Dropped;
//!
//! #[async_trait]
//! impl Subscribe for Dropped {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::EventDropped) {
//!             // count unrouted events, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "dropped" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Runtime event observer.
///
/// Events are delivered in FIFO order per subscriber, from a worker task,
/// never in the publisher's context.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    async fn on_event(&self, event: &Event);

    /// Subscriber name used in logs and overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity (clamped to at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
