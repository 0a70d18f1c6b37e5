//! # Runtime event subscribers.
//!
//! ```text
//! Dispatcher / task units ── publish(Event) ──► Bus ──► SubscriberSet
//!                                                  ┌─────────┼─────────┐
//!                                                  ▼         ▼         ▼
//!                                              LogWriter  Metrics   Custom
//! ```
//!
//! - [`Subscribe`]: observer trait
//! - [`SubscriberSet`]: bounded per-subscriber queues with panic isolation
//! - [`LogWriter`]: built-in `tracing` renderer

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
