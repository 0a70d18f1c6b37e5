//! Runtime events: types and broadcast bus.
//!
//! - [`EventKind`], [`Event`]: event classification and metadata
//! - [`Bus`]: thin wrapper over `tokio::sync::broadcast`
//!
//! Publishers: `Supervisor`, `Dispatcher`, task units, `SubscriberSet`
//! workers (overflow/panic). Consumers: the supervisor's subscriber listener
//! and anyone holding [`Supervisor::bus`](crate::Supervisor::bus).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
