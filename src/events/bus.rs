//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] used by the
//! supervisor, the dispatcher and task units to publish [`Event`]s.
//!
//! ```text
//! Publishers (many):                    Consumers:
//!   Supervisor ──┐
//!   Dispatcher ──┼──► Bus ──► subscriber_listener ──► SubscriberSet
//!   Task unit  ──┘     └────► Bus::subscribe() (tests, embedders)
//! ```
//!
//! ## Rules
//! - `publish()` never blocks.
//! - Slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - Events are lost if nobody is subscribed at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes subsequently published events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
