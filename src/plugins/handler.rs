//! # Handler abstraction and closure-backed handlers.
//!
//! A [`Handler`] is the invokable form of a `path:function` reference. The
//! same interface serves event subscriptions (called with the event payload)
//! and background tasks (called once with `Value::Null` and expected to run
//! until cancelled).
//!
//! ## Example
//! ```rust
//! use sway_dispatch::{Handler, HandlerContext, HandlerError, HandlerFn, SharedHandler};
//! use serde_json::Value;
//!
//! let on_focus: SharedHandler =
//!     HandlerFn::arc("on_focus", |ctx: HandlerContext, payload: Value| async move {
//!         if payload.get("container").is_some() {
//!             ctx.command("border pixel 2").await?;
//!         }
//!         Ok::<_, HandlerError>(())
//!     });
//! assert_eq!(on_focus.name(), "on_focus");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;
use crate::transport::Connection;

/// What a handler gets besides its payload: command access to the shared
/// connection and the cancellation token of the unit running it.
///
/// The connection itself stays private; only the supervisor closes it.
#[derive(Clone)]
pub struct HandlerContext {
    connection: Connection,
    token: CancellationToken,
}

impl HandlerContext {
    /// Creates a context.
    pub fn new(connection: Connection, token: CancellationToken) -> Self {
        Self { connection, token }
    }

    /// Cancellation token of the running unit.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Runs a window-manager command over the shared connection.
    pub async fn command(&self, command: &str) -> Result<Value, HandlerError> {
        Ok(self.connection.command(command).await?)
    }
}

/// # Invokable plugin entry point.
///
/// Implementations should return [`HandlerError::Canceled`] (or `Ok`) promptly
/// once the context token is cancelled; the runtime drops in-flight futures
/// on shutdown anyway.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Returns a stable, human-readable handler name.
    fn name(&self) -> &str;

    /// Invokes the handler.
    async fn invoke(&self, ctx: HandlerContext, payload: Value) -> Result<(), HandlerError>;
}

/// Shared handler instance. One per distinct reference.
pub type SharedHandler = Arc<dyn Handler>;

/// Closure-backed handler. Every invocation creates a fresh future.
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a closure-backed handler.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a [`SharedHandler`]-compatible `Arc`.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(HandlerContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, ctx: HandlerContext, payload: Value) -> Result<(), HandlerError> {
        (self.f)(ctx, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LinesTransport;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[tokio::test]
    async fn command_goes_over_the_shared_connection() {
        let (events, _wm_events) = tokio::io::duplex(256);
        let (requests, wm_requests) = tokio::io::duplex(256);
        let connection: Connection = Arc::new(LinesTransport::new(events, requests));
        let ctx = HandlerContext::new(connection, CancellationToken::new());

        let reply = ctx.command("workspace 2").await.unwrap();
        assert_eq!(reply["success"], Value::Bool(true));

        let mut lines = BufReader::new(wm_requests).lines();
        let request = lines.next_line().await.unwrap().unwrap();
        assert_eq!(request, r#"{"command":"workspace 2"}"#);
    }
}
