//! Error types used by the dispatcher runtime, the resolver and handlers.
//!
//! - [`ConfigError`]: settings document or config directory could not be prepared.
//! - [`ResolveError`]: a `path:function` reference cannot be turned into a handler.
//! - [`TransportError`]: the IPC connection failed or rejected a request.
//! - [`HandlerError`]: a handler or background task failed (or was cancelled).
//! - [`RuntimeError`]: what [`Supervisor::run`](crate::Supervisor::run) returns.
//!
//! Every type exposes `as_label` for stable snake_case log labels.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// # Errors raised while locating or parsing the settings document.
///
/// All of them are fatal at startup: the daemon never runs with a
/// partially parsed configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("{var} is not set")]
    MissingEnv {
        /// Name of the variable.
        var: &'static str,
    },

    /// Preparing the config directory tree failed.
    #[error("failed to prepare {path}: {source}")]
    Io {
        /// Path being created or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is absent or unreadable.
    #[error("failed to read settings {path}: {source}")]
    Read {
        /// Settings file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings document is not valid JSON or misses a required key.
    #[error("invalid settings {path}: {source}")]
    Parse {
        /// Settings file path (`<inline>` for in-memory documents).
        path: PathBuf,
        /// Decoder error, carries line/column.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::MissingEnv { .. } => "config_missing_env",
            ConfigError::Io { .. } => "config_io",
            ConfigError::Read { .. } => "config_read",
            ConfigError::Parse { .. } => "config_parse",
        }
    }
}

/// # Errors raised while resolving a handler reference.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The reference has no `:` separator, or an empty path / function part.
    #[error("malformed handler reference {reference:?}: expected `path:function`")]
    MalformedRef {
        /// The offending reference.
        reference: String,
    },

    /// No plugin source exists at the computed path.
    #[error("plugin for {reference:?} not found at {path}")]
    PluginNotFound {
        /// The reference being resolved.
        reference: String,
        /// Computed source path.
        path: PathBuf,
    },

    /// The plugin loaded but does not export the requested function.
    #[error("plugin {path} has no function {symbol:?} (needed by {reference:?})")]
    PluginSymbol {
        /// The reference being resolved.
        reference: String,
        /// Source path of the loaded plugin.
        path: PathBuf,
        /// Missing function name.
        symbol: String,
    },

    /// The loader failed to load the plugin source.
    #[error("failed to load plugin {path}: {reason}")]
    Load {
        /// Source path of the plugin.
        path: PathBuf,
        /// Loader-specific reason.
        reason: String,
    },
}

impl ResolveError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ResolveError::MalformedRef { .. } => "resolve_malformed_ref",
            ResolveError::PluginNotFound { .. } => "resolve_plugin_not_found",
            ResolveError::PluginSymbol { .. } => "resolve_plugin_symbol",
            ResolveError::Load { .. } => "resolve_load",
        }
    }
}

/// # Errors raised by the IPC connection.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TransportError {
    /// The connection could not be opened.
    #[error("connect failed: {reason}")]
    Connect {
        /// Transport-specific reason.
        reason: String,
    },

    /// The peer rejected a request (e.g. an unknown event name in subscribe).
    #[error("request rejected: {reason}")]
    Rejected {
        /// Transport-specific reason.
        reason: String,
    },

    /// Reading or writing the underlying stream failed.
    #[error("transport i/o: {0}")]
    Io(#[from] std::io::Error),

    /// A message from the peer could not be decoded.
    #[error("undecodable message: {0}")]
    Decode(#[from] serde_json::Error),

    /// The connection is closed; no further events will arrive.
    #[error("connection closed")]
    Closed,
}

impl TransportError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::Connect { .. } => "transport_connect",
            TransportError::Rejected { .. } => "transport_rejected",
            TransportError::Io(_) => "transport_io",
            TransportError::Decode(_) => "transport_decode",
            TransportError::Closed => "transport_closed",
        }
    }
}

/// # Errors produced by handler and task execution.
///
/// [`HandlerError::Canceled`] is the cooperative-shutdown signal and is never
/// reported as a failure.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Handler execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// A connection operation issued by the handler failed.
    #[error("connection: {0}")]
    Transport(#[from] TransportError),

    /// Handler was cancelled because the daemon is shutting down.
    #[error("context cancelled")]
    Canceled,
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        HandlerError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Transport(_) => "handler_transport",
            HandlerError::Canceled => "handler_canceled",
        }
    }

    /// True for the cancellation signal.
    pub fn is_canceled(&self) -> bool {
        matches!(self, HandlerError::Canceled)
    }
}

/// # Errors surfaced by the supervisor.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Settings could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A handler reference could not be resolved; nothing was started.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Connecting, subscribing or listening failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A dispatched handler or a background task failed.
    #[error("unit {unit:?} failed: {source}")]
    Handler {
        /// Name of the failing unit (`dispatcher` or the task reference).
        unit: String,
        /// The handler error.
        #[source]
        source: HandlerError,
    },

    /// A unit panicked.
    #[error("unit {unit:?} panicked")]
    UnitPanicked {
        /// Name of the panicking unit.
        unit: String,
    },

    /// Units did not stop within the grace period and were aborted.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Units that had to be aborted.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Config(e) => e.as_label(),
            RuntimeError::Resolve(e) => e.as_label(),
            RuntimeError::Transport(e) => e.as_label(),
            RuntimeError::Handler { .. } => "runtime_unit_failed",
            RuntimeError::UnitPanicked { .. } => "runtime_unit_panicked",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let err = RuntimeError::from(ResolveError::MalformedRef {
            reference: "nocolon".into(),
        });
        assert_eq!(err.as_label(), "resolve_malformed_ref");

        let err = RuntimeError::GraceExceeded {
            grace: Duration::from_secs(1),
            stuck: vec![],
        };
        assert_eq!(err.as_label(), "runtime_grace_exceeded");
    }

    #[test]
    fn canceled_is_not_a_failure() {
        assert!(HandlerError::Canceled.is_canceled());
        assert!(!HandlerError::fail("boom").is_canceled());
        assert_eq!(HandlerError::fail("boom").to_string(), "execution failed: boom");
    }
}
