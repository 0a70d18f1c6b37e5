//! # Exactly-once connection close.
//!
//! The supervisor is the only owner allowed to close the connection. Units
//! hold clones of the [`Connection`] but never close it.
//!
//! ```text
//! run() end ──► guard.close() ──┐
//! run() dropped ─► Drop ────────┼─► closed.swap(true) ── first? ──► transport.close()
//! (any repeat) ─────────────────┘                         └─ no ──► no-op
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::error::TransportError;
use crate::events::{Bus, Event, EventKind};
use crate::transport::Connection;

/// Closes a [`Connection`] at most once.
pub(crate) struct ConnectionGuard {
    connection: Connection,
    closed: AtomicBool,
    bus: Bus,
}

impl ConnectionGuard {
    pub(crate) fn new(connection: Connection, bus: Bus) -> Self {
        Self {
            connection,
            closed: AtomicBool::new(false),
            bus,
        }
    }

    /// Closes the connection unless already closed.
    ///
    /// Returns `Ok(false)` when an earlier call already closed it.
    pub(crate) async fn close(&self) -> Result<bool, TransportError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        let res = self.connection.close().await;
        self.bus.publish(Event::new(EventKind::ConnectionClosed));
        res.map(|()| true)
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        // `run` was dropped before reaching its close step.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let connection = Arc::clone(&self.connection);
        let bus = self.bus.clone();
        handle.spawn(async move {
            if let Err(err) = connection.close().await {
                debug!(error = %err, "close after drop failed");
            }
            bus.publish(Event::new(EventKind::ConnectionClosed));
        });
    }
}
