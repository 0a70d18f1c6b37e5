//! # Plugins: handler references, loaders and resolution.
//!
//! - [`Handler`] / [`HandlerFn`]: the invokable interface shared by
//!   subscriptions and background tasks
//! - [`HandlerRef`]: parsed `path:function` reference
//! - [`Loader`] / [`Module`]: how a plugin source becomes handlers
//! - [`Registry`]: compiled-in modules
//! - [`ExecLoader`]: executable plugins run out of process
//! - [`Resolver`]: resolves references once each and builds the routing inputs

mod exec;
mod handler;
mod handler_ref;
mod loader;
mod registry;
mod resolver;

pub use exec::{EXEC_EXTENSION, ExecLoader};
pub use handler::{Handler, HandlerContext, HandlerFn, SharedHandler};
pub use handler_ref::HandlerRef;
pub use loader::{LoadContext, Loader, Module};
pub use registry::{REGISTRY_EXTENSION, RegisteredModule, Registry};
pub use resolver::{Resolved, Resolver, TaskUnit};
