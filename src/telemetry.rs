//! Structured telemetry initialisation for the daemon.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "sway_dispatch=info";

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global tracing subscriber on first call.
///
/// `RUST_LOG` takes precedence over `default_filter`. Repeated calls are
/// idempotent: only the first one touches global state.
///
/// ```rust
/// use sway_dispatch::telemetry;
///
/// # fn main() -> Result<(), telemetry::TelemetryError> {
/// telemetry::init(telemetry::DEFAULT_FILTER)?;
/// telemetry::init("debug")?;
/// # Ok(())
/// # }
/// ```
pub fn init(default_filter: &str) -> Result<(), TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(default_filter))
        .map(|_| ())
}

fn install_subscriber(default_filter: &str) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|error| TelemetryError::Filter(error.to_string()))?,
    };

    // Stdout may carry the IPC stream; logs go to stderr only.
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
