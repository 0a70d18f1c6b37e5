//! # Daemon runtime configuration.
//!
//! [`DaemonConfig`] centralizes the knobs that are not part of the settings
//! document: shutdown grace, event-bus sizing and the config-directory
//! layout used by [`bootstrap`](crate::settings::bootstrap).
//!
//! ## Sentinel values
//! - `grace = 0s` → do not wait; units still running after cancellation are aborted immediately
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `grace`: maximum wait for units to stop after cancellation
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `app_dir`: directory name under `$XDG_CONFIG_HOME`
/// - `settings_file`: settings document name inside `app_dir`
/// - `plugin_dir`: plugin root name inside `app_dir`
#[derive(Clone, Debug)]
pub struct DaemonConfig {
    /// Maximum time to wait for units to stop after cancellation.
    ///
    /// Units still running afterwards are aborted and reported in
    /// `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Capacity of the runtime event bus.
    ///
    /// Subscribers lagging further behind skip the oldest events.
    pub bus_capacity: usize,

    /// Directory name under the user config home.
    pub app_dir: String,

    /// Settings document file name.
    pub settings_file: String,

    /// Plugin root directory name.
    pub plugin_dir: String,
}

impl DaemonConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for DaemonConfig {
    /// Default configuration:
    ///
    /// - `grace = 10s`
    /// - `bus_capacity = 1024`
    /// - `app_dir = "sway-dispatch"`
    /// - `settings_file = "settings.json"`
    /// - `plugin_dir = "plugins"`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(10),
            bus_capacity: 1024,
            app_dir: "sway-dispatch".to_string(),
            settings_file: "settings.json".to_string(),
            plugin_dir: "plugins".to_string(),
        }
    }
}
