//! # Settings document and config-directory bootstrap.
//!
//! - [`Settings`]: the parsed `subscriptions` / `tasks` document
//! - [`bootstrap`]: locates `$XDG_CONFIG_HOME/<app>/`, creates it and seeds
//!   the bundled default settings on first run

pub mod bootstrap;
mod document;

pub use document::Settings;
pub(crate) use document::present;
