//! # sway-dispatch
//!
//! **sway-dispatch** bridges a window manager's IPC event stream to handler
//! functions declared in a JSON settings document, and supervises background
//! tasks alongside it.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   settings.json                           plugins/
//!   {"subscriptions": {...}, "tasks": [..]}   handlers.sh, ...
//!          │                                     │
//!          ▼                                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Resolver (path:function → Handler, each ref and file once)       │
//! │  - Loader: Registry (compiled-in) | ExecLoader (out of process)   │
//! └──────┬──────────────────────────────────────────────┬─────────────┘
//!        ▼                                              ▼
//!  SubscriptionTable (event → change → handler)    TaskUnit list
//!        │                                              │
//! ┌──────┴──────────────────────────────────────────────┴─────────────┐
//! │  Supervisor                                                       │
//! │  - Connect::connect() once, ConnectionGuard closes it once        │
//! │  - JoinSet of units, each with a child CancellationToken          │
//! │  - OS signals / shutdown() / first failure → cancel all           │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐      ┌──────────┐       ┌──────────┐
//!   │Dispatcher│      │ task #1  │  ...  │ task #N  │
//!   └────┬─────┘      └────┬─────┘       └────┬─────┘
//!        │ Publishes: Subscribed, EventDispatched, UnitStarting, UnitFailed...
//!        ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                     subscriber_listener ──► SubscriberSet ──► LogWriter, ...
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                          |
//! |-------------------|------------------------------------------------------------|---------------------------------------------|
//! | **Handlers**      | Invokable units shared by subscriptions and tasks.         | [`Handler`], [`HandlerFn`], [`HandlerContext`] |
//! | **Plugins**       | Resolve `path:function` references.                        | [`Resolver`], [`Registry`], [`ExecLoader`]  |
//! | **Transport**     | IPC seam and a JSON-lines implementation.                  | [`Transport`], [`Connect`], [`LinesTransport`] |
//! | **Supervision**   | Run the dispatcher and tasks, shut down cleanly.           | [`Supervisor`]                              |
//! | **Subscriber API**| Observe runtime events.                                    | [`Subscribe`], [`LogWriter`]                |
//! | **Errors**        | Typed errors per stage.                                    | [`RuntimeError`] and friends                |
//! | **Configuration** | Runtime knobs and the settings document.                   | [`DaemonConfig`], [`Settings`]              |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use serde_json::Value;
//! use sway_dispatch::{
//!     DaemonConfig, HandlerContext, HandlerError, HandlerFn, LinesTransport, Connect,
//!     Connection, RegisteredModule, Registry, Resolver, Settings, Supervisor, TransportError,
//! };
//!
//! struct Loopback;
//!
//! #[async_trait::async_trait]
//! impl Connect for Loopback {
//!     async fn connect(&self) -> Result<Connection, TransportError> {
//!         let (_events_peer, events) = tokio::io::duplex(64);
//!         let (requests, _requests_peer) = tokio::io::duplex(64);
//!         Ok(Arc::new(LinesTransport::new(events, requests)))
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let plugins = tempfile::tempdir()?;
//!     std::fs::write(plugins.path().join("demo.plugin"), "")?;
//!
//!     let registry = Registry::new().register(
//!         "demo",
//!         RegisteredModule::new().with_handler(
//!             "hello",
//!             HandlerFn::arc("hello", |ctx: HandlerContext, _payload: Value| async move {
//!                 ctx.token().cancelled().await;
//!                 Ok::<_, HandlerError>(())
//!             }),
//!         ),
//!     );
//!     let resolver = Resolver::new(plugins.path(), Arc::new(registry));
//!     let settings = Settings::from_slice(br#"{"subscriptions": {}, "tasks": ["demo:hello"]}"#)?;
//!
//!     let mut cfg = DaemonConfig::default();
//!     cfg.grace = Duration::from_secs(1);
//!     let sup = Supervisor::builder(cfg).build();
//!
//!     let stopper = Arc::clone(&sup);
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(50)).await;
//!         stopper.shutdown();
//!     });
//!
//!     sup.run(&settings, &resolver, &Loopback).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;

pub mod dispatch;
pub mod events;
pub mod plugins;
pub mod settings;
pub mod subscribers;
pub mod telemetry;
pub mod transport;

// ---- Public re-exports ----

pub use config::DaemonConfig;
pub use core::{Supervisor, SupervisorBuilder};
pub use dispatch::{Dispatcher, SubscriptionTable};
pub use error::{ConfigError, HandlerError, ResolveError, RuntimeError, TransportError};
pub use events::{Bus, Event, EventKind};
pub use plugins::{
    ExecLoader, Handler, HandlerContext, HandlerFn, HandlerRef, Loader, Module, RegisteredModule,
    Registry, Resolver, SharedHandler,
};
pub use settings::Settings;
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use transport::{Connect, Connection, IpcEvent, LinesTransport, StdioConnector, Transport};
