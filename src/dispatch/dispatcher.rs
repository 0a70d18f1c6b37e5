//! # Dispatcher: subscribe, listen, route.
//!
//! ```text
//! Idle ──subscribe(table.events())──► Subscribed ──► Listening
//!                                                      │  ▲
//!                                     listen() ─► event│  │handler done / no route
//!                                                      ▼  │
//!                                                  Dispatching
//! any state ── token cancelled ──► Stopped
//! ```
//!
//! ## Rules
//! - One event at a time: the next `listen()` starts only after the current
//!   handler returned. A slow handler delays the stream; it never reorders it.
//! - Events without a route are discarded without invoking anything.
//! - Every suspension point races the cancellation token; in-flight handler
//!   work is dropped on cancellation.
//! - With an empty table nothing is subscribed and the dispatcher idles
//!   until cancelled.
//! - Transport and handler failures end the dispatcher with an error.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::SubscriptionTable;
use crate::error::{HandlerError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::plugins::HandlerContext;
use crate::transport::{Connection, IpcEvent};

/// Unit name used in events and errors.
pub const DISPATCHER_UNIT: &str = "dispatcher";

/// The event-routing unit.
pub struct Dispatcher {
    table: Arc<SubscriptionTable>,
    connection: Connection,
    bus: Bus,
}

impl Dispatcher {
    /// Creates a dispatcher over `table` and the shared connection.
    pub fn new(table: Arc<SubscriptionTable>, connection: Connection, bus: Bus) -> Self {
        Self {
            table,
            connection,
            bus,
        }
    }

    /// Runs until `token` is cancelled or a failure occurs.
    ///
    /// Cancellation returns `Ok(())`.
    pub async fn run(self, token: CancellationToken) -> Result<(), RuntimeError> {
        let events = self.table.events();
        if events.is_empty() {
            debug!("no event has a handler; dispatcher idle");
            token.cancelled().await;
            return Ok(());
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            res = self.connection.subscribe(&events) => res?,
        }
        self.bus
            .publish(Event::new(EventKind::Subscribed).with_count(events.len()));
        debug!(?events, "subscribed");

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(()),
                next = self.connection.listen() => next?,
            };
            self.dispatch(next, &token).await?;
        }
    }

    /// Routes one event and awaits its handler.
    async fn dispatch(&self, ev: IpcEvent, token: &CancellationToken) -> Result<(), RuntimeError> {
        let IpcEvent {
            event,
            change,
            payload,
        } = ev;

        let Some(handler) = self.table.route(&event, &change) else {
            trace!(%event, %change, "no handler, dropping event");
            self.bus
                .publish(Event::new(EventKind::EventDropped).with_route(event, change));
            return Ok(());
        };

        let ctx = HandlerContext::new(Arc::clone(&self.connection), token.clone());
        let res = tokio::select! {
            biased;
            _ = token.cancelled() => Err(HandlerError::Canceled),
            res = handler.invoke(ctx, payload) => res,
        };

        match res {
            Ok(()) => {
                self.bus.publish(
                    Event::new(EventKind::EventDispatched)
                        .with_route(event, change)
                        .with_handler(handler.name()),
                );
                Ok(())
            }
            Err(HandlerError::Canceled) => Ok(()),
            Err(source) => {
                self.bus.publish(
                    Event::new(EventKind::UnitFailed)
                        .with_unit(DISPATCHER_UNIT)
                        .with_route(event.as_str(), change.as_str())
                        .with_handler(handler.name())
                        .with_reason(source.to_string()),
                );
                Err(RuntimeError::Handler {
                    unit: format!("{DISPATCHER_UNIT} ({event}/{change} → {})", handler.name()),
                    source,
                })
            }
        }
    }
}
