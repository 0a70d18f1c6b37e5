//! # Event dispatch.
//!
//! - [`SubscriptionTable`]: `event → change → handler` map derived from settings
//! - [`Dispatcher`]: subscribes to the table's events and routes each
//!   incoming event to its handler, one at a time

mod dispatcher;
mod table;

pub use dispatcher::{DISPATCHER_UNIT, Dispatcher};
pub use table::SubscriptionTable;
