//! # IPC transport seam.
//!
//! The dispatcher never speaks a wire protocol itself. It consumes the
//! [`Transport`] trait: subscribe to a set of event names, wait for the next
//! matching event, issue commands, and close. [`Connect`] opens one.
//!
//! ```text
//! Supervisor ── Connect::connect() ──► Connection (Arc<dyn Transport>)
//!                                          │ shared, never closed by units
//!                  ┌───────────────────────┼──────────────────────┐
//!                  ▼                       ▼                      ▼
//!             Dispatcher              task unit #1   ...     task unit #N
//!      subscribe()/listen()           command()               command()
//! ```
//!
//! ## Rules
//! - Every method takes `&self`; implementations serialize their own I/O.
//! - `close` is idempotent.
//! - After `close`, or once the peer hangs up, `listen` returns
//!   [`TransportError::Closed`] and never restarts.
//!
//! [`LinesTransport`] is the bundled implementation over a JSON-lines stream.

mod lines;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

pub use lines::{LinesTransport, StdioConnector};

/// One event delivered by the window manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpcEvent {
    /// Top-level event category (`window`, `workspace`, ...).
    pub event: String,
    /// Sub-type of the event (`focus`, `close`, ...).
    pub change: String,
    /// Event body, opaque to the dispatcher.
    #[serde(default)]
    pub payload: Value,
}

impl IpcEvent {
    /// Creates an event.
    pub fn new(event: impl Into<String>, change: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            change: change.into(),
            payload,
        }
    }
}

/// A long-lived connection to the window manager.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Subscribes to the named events. Rejection is fatal for the dispatcher.
    async fn subscribe(&self, events: &[String]) -> Result<(), TransportError>;

    /// Suspends until the next subscribed event arrives.
    async fn listen(&self) -> Result<IpcEvent, TransportError>;

    /// Runs a window-manager command and returns the reply body.
    async fn command(&self, command: &str) -> Result<Value, TransportError>;

    /// Closes the connection. Calling it again is a no-op.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Shared connection handle passed to the dispatcher, handlers and tasks.
pub type Connection = Arc<dyn Transport>;

/// Opens a [`Connection`].
#[async_trait]
pub trait Connect: Send + Sync {
    /// Opens the connection. Called once per supervisor run.
    async fn connect(&self) -> Result<Connection, TransportError>;
}
