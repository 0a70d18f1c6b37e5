//! Runtime core: orchestration and lifecycle.
//!
//! The public API from this module is [`Supervisor`] and its
//! [`SupervisorBuilder`].
//!
//! Internal modules:
//! - [`runner`]: runs one unit (a task or the dispatcher) with lifecycle events;
//! - [`supervisor`]: resolves, connects, drives the units, handles shutdown;
//! - [`connection`]: exactly-once connection close;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod connection;
mod runner;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use supervisor::Supervisor;
