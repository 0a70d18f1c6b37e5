//! # Cross-platform OS signal handling.
//!
//! [`ShutdownSignals::install`] registers the listeners up front, so a signal
//! that arrives before anyone awaits [`ShutdownSignals::recv`] is still
//! observed instead of taking the default (terminating) action.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd and session managers)
//! - `SIGQUIT` (quit signal)
//!
//! **Windows:**
//! - `Ctrl-C` via [`tokio::signal::windows::ctrl_c`]

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Installed termination signal listeners.
#[cfg(unix)]
pub(crate) struct ShutdownSignals {
    sigint: Signal,
    sigterm: Signal,
    sigquit: Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Registers the listeners. Returns `Err` if registration fails.
    pub(crate) fn install() -> std::io::Result<Self> {
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sigquit: signal(SignalKind::quit())?,
        })
    }

    /// Waits for the next termination signal and returns its name.
    pub(crate) async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigint.recv()  => "SIGINT",
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigquit.recv() => "SIGQUIT",
        }
    }
}

/// Installed termination signal listeners.
#[cfg(windows)]
pub(crate) struct ShutdownSignals {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl ShutdownSignals {
    /// Registers the listener. Returns `Err` if registration fails.
    pub(crate) fn install() -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    /// Waits for the next Ctrl-C.
    pub(crate) async fn recv(&mut self) -> &'static str {
        self.ctrl_c.recv().await;
        "ctrl-c"
    }
}
