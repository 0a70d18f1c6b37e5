//! # Supervisor: resolves handlers, owns the connection, runs the units.
//!
//! The [`Supervisor`] owns the event bus, the [`SubscriberSet`] and the
//! runtime [`CancellationToken`]. One `run` call goes through:
//!
//! ```text
//! Settings ──► Resolver::resolve_settings()      fail-fast, nothing connected yet
//!                   │
//!                   ▼
//!          ShutdownSignals::install()
//!                   │
//!                   ▼
//!          Connect::connect() ──► ConnectionGuard
//!                   │
//!                   ▼
//!   JoinSet: [task 0] [task 1] ... [dispatcher]   each with runtime_token.child_token()
//!                   │
//!   drive():  select! {
//!               OS signal            → publish ShutdownRequested, cancel
//!               shutdown() called    → (already published), stop driving
//!               unit failed          → publish ShutdownRequested, cancel
//!               all units finished   → done
//!             }
//!                   │
//!   wait_all_with_grace(cfg.grace):
//!       ├─ all joined     → publish AllStoppedWithin
//!       └─ timeout        → abort_all, publish GraceExceeded
//!                   │
//!   guard.close()  (exactly once) ──► publish ConnectionClosed
//! ```
//!
//! Events published on the bus are fanned out to subscribers by a listener
//! task that lives for the duration of `run` and flushes before it returns.
//!
//! ## Rules
//! - A supervisor runs once; after cancellation every unit it starts stops immediately.
//! - Units never close the connection.
//! - The first non-cancellation unit error is what `run` returns.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use sway_dispatch::{
//!     DaemonConfig, ExecLoader, LogWriter, Resolver, StdioConnector, Subscribe, Supervisor,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let sup = Supervisor::builder(DaemonConfig::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let root = "/home/me/.config/sway-dispatch";
//!     let resolver = Resolver::new(format!("{root}/plugins"), Arc::new(ExecLoader::new()));
//!     sup.run_from_path(format!("{root}/settings.json"), &resolver, &StdioConnector)
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::builder::SupervisorBuilder;
use super::connection::ConnectionGuard;
use super::runner;
use super::shutdown::ShutdownSignals;
use crate::config::DaemonConfig;
use crate::dispatch::{DISPATCHER_UNIT, Dispatcher};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::plugins::{Resolved, Resolver};
use crate::settings::Settings;
use crate::subscribers::SubscriberSet;
use crate::transport::{Connect, Connection};

/// What a unit hands back to the supervisor: its name and outcome.
type UnitExit = (String, Result<(), RuntimeError>);

/// Coordinates the dispatcher and task units, event delivery and shutdown.
pub struct Supervisor {
    cfg: DaemonConfig,
    bus: Bus,
    subs: Mutex<Option<SubscriberSet>>,
    runtime_token: CancellationToken,
}

impl Supervisor {
    /// Starts building a supervisor.
    pub fn builder(cfg: DaemonConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(super) fn new_internal(
        cfg: DaemonConfig,
        bus: Bus,
        subs: SubscriberSet,
        runtime_token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            subs: Mutex::new(Some(subs)),
            runtime_token,
        }
    }

    /// Runtime event bus.
    ///
    /// Receivers only see events published after they subscribed.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Requests a graceful shutdown. Safe to call repeatedly and concurrently.
    pub fn shutdown(&self) {
        if self.runtime_token.is_cancelled() {
            return;
        }
        self.request_shutdown("requested");
    }

    /// Loads the settings at `path`, then behaves like [`Supervisor::run`].
    pub async fn run_from_path(
        &self,
        path: impl AsRef<Path>,
        resolver: &Resolver,
        connector: &dyn Connect,
    ) -> Result<(), RuntimeError> {
        let settings = Settings::load(path)?;
        self.run(&settings, resolver, connector).await
    }

    /// Resolves every handler of `settings`, connects, and runs the
    /// dispatcher and tasks until shutdown or the first failure.
    ///
    /// The connection is closed exactly once before this returns.
    pub async fn run(
        &self,
        settings: &Settings,
        resolver: &Resolver,
        connector: &dyn Connect,
    ) -> Result<(), RuntimeError> {
        let stop_listener = CancellationToken::new();
        let listener = self.subscriber_listener(stop_listener.clone());

        let res = self.run_units(settings, resolver, connector).await;

        stop_listener.cancel();
        if let Some(handle) = listener {
            let _ = handle.await;
        }
        res
    }

    async fn run_units(
        &self,
        settings: &Settings,
        resolver: &Resolver,
        connector: &dyn Connect,
    ) -> Result<(), RuntimeError> {
        let resolved = resolver.resolve_settings(settings).await?;
        self.bus
            .publish(Event::new(EventKind::HandlersResolved).with_count(resolved.handlers.len()));

        let signals = match ShutdownSignals::install() {
            Ok(signals) => Some(signals),
            Err(err) => {
                warn!(error = %err, "signal handlers unavailable; relying on shutdown()");
                None
            }
        };

        let connection = connector.connect().await?;
        self.bus.publish(Event::new(EventKind::Connected));
        let guard = ConnectionGuard::new(Arc::clone(&connection), self.bus.clone());

        let mut set = JoinSet::new();
        let mut running = Vec::new();
        self.spawn_units(&mut set, &mut running, resolved, connection);

        let outcome = self.drive(&mut set, &mut running, signals).await;

        match guard.close().await {
            Ok(_) => outcome,
            Err(err) => {
                warn!(error = %err, label = err.as_label(), "closing connection failed");
                outcome.and(Err(RuntimeError::Transport(err)))
            }
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set until
    /// `stop` fires, then drains what is buffered and flushes the workers.
    fn subscriber_listener(&self, stop: CancellationToken) -> Option<JoinHandle<()>> {
        let set = self.subs.lock().ok()?.take()?;
        let mut rx = self.bus.subscribe();
        Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "subscriber listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => break,
                }
            }
            while let Ok(ev) = rx.try_recv() {
                set.emit(&ev);
            }
            set.shutdown().await;
        }))
    }

    /// Spawns task units in settings order, then the dispatcher.
    fn spawn_units(
        &self,
        set: &mut JoinSet<UnitExit>,
        running: &mut Vec<String>,
        resolved: Resolved,
        connection: Connection,
    ) {
        let Resolved { table, tasks, .. } = resolved;

        for task in tasks {
            let name = task.reference.clone();
            let fut = runner::run_task(
                task,
                Arc::clone(&connection),
                self.bus.clone(),
                self.runtime_token.child_token(),
            );
            spawn_unit(set, running, name, fut);
        }

        let dispatcher = Dispatcher::new(Arc::new(table), connection, self.bus.clone());
        let fut = runner::run_dispatcher(
            dispatcher,
            self.bus.clone(),
            self.runtime_token.child_token(),
        );
        spawn_unit(set, running, DISPATCHER_UNIT.to_string(), fut);
    }

    /// Waits until a shutdown trigger fires or every unit has finished.
    async fn drive(
        &self,
        set: &mut JoinSet<UnitExit>,
        running: &mut Vec<String>,
        signals: Option<ShutdownSignals>,
    ) -> Result<(), RuntimeError> {
        let signal = shutdown_signal(signals);
        tokio::pin!(signal);

        let mut first_err = None;
        loop {
            tokio::select! {
                biased;
                name = &mut signal => {
                    self.request_shutdown(name);
                    break;
                }
                _ = self.runtime_token.cancelled() => break,
                joined = set.join_next() => {
                    let Some(joined) = joined else {
                        debug!("all units finished");
                        return Ok(());
                    };
                    if let Some(err) = self.on_unit_exit(joined, running) {
                        self.request_shutdown("unit failed");
                        first_err = Some(err);
                        break;
                    }
                }
            }
        }

        let drained = self.wait_all_with_grace(set, running, &mut first_err).await;
        match first_err {
            Some(err) => Err(err),
            None => drained,
        }
    }

    /// Waits for all units to stop within the configured grace period.
    ///
    /// Publishes [`EventKind::AllStoppedWithin`] on success, or aborts the
    /// stragglers, publishes [`EventKind::GraceExceeded`] and returns
    /// [`RuntimeError::GraceExceeded`] naming them.
    async fn wait_all_with_grace(
        &self,
        set: &mut JoinSet<UnitExit>,
        running: &mut Vec<String>,
        first_err: &mut Option<RuntimeError>,
    ) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let done = async {
            while let Some(joined) = set.join_next().await {
                if let Some(err) = self.on_unit_exit(joined, running) {
                    first_err.get_or_insert(err);
                }
            }
        };

        if tokio::time::timeout(grace, done).await.is_ok() {
            self.bus.publish(Event::new(EventKind::AllStoppedWithin));
            return Ok(());
        }

        let stuck = std::mem::take(running);
        set.abort_all();
        while set.join_next().await.is_some() {}
        self.bus
            .publish(Event::new(EventKind::GraceExceeded).with_count(stuck.len()));
        Err(RuntimeError::GraceExceeded { grace, stuck })
    }

    /// Records a unit exit; returns its error, if it failed.
    fn on_unit_exit(
        &self,
        joined: Result<UnitExit, JoinError>,
        running: &mut Vec<String>,
    ) -> Option<RuntimeError> {
        match joined {
            Ok((name, res)) => {
                if let Some(pos) = running.iter().position(|n| *n == name) {
                    running.swap_remove(pos);
                }
                res.err()
            }
            // Units catch their own panics, so only aborts land here.
            Err(err) => {
                debug!(error = %err, "unit join failed");
                None
            }
        }
    }

    fn request_shutdown(&self, reason: &str) {
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(reason));
        self.runtime_token.cancel();
    }
}

/// Spawns `fut` as a named unit, converting a panic into
/// [`RuntimeError::UnitPanicked`].
fn spawn_unit<F>(set: &mut JoinSet<UnitExit>, running: &mut Vec<String>, name: String, fut: F)
where
    F: Future<Output = Result<(), RuntimeError>> + Send + 'static,
{
    running.push(name.clone());
    set.spawn(async move {
        let res = match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(res) => res,
            Err(_) => {
                warn!(unit = %name, "unit panicked");
                Err(RuntimeError::UnitPanicked { unit: name.clone() })
            }
        };
        (name, res)
    });
}

/// Resolves with the signal name; never resolves without installed handlers.
async fn shutdown_signal(signals: Option<ShutdownSignals>) -> &'static str {
    match signals {
        Some(mut signals) => signals.recv().await,
        None => std::future::pending().await,
    }
}
