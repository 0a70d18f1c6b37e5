//! The settings document.
//!
//! ```json
//! {
//!   "subscriptions": { "window": { "focus": "handlers:on_focus", "close": null } },
//!   "tasks": ["handlers:heartbeat"]
//! }
//! ```
//!
//! Both keys are required. Parsing is all-or-nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Parsed settings. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// `event → change → reference` (`null` or `""` means no handler).
    pub subscriptions: BTreeMap<String, BTreeMap<String, Option<String>>>,
    /// Background task references, in start order.
    pub tasks: Vec<String>,
}

impl Settings {
    /// Reads and parses the settings file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&bytes, path)
    }

    /// Parses an in-memory document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        Self::parse(bytes, Path::new("<inline>"))
    }

    fn parse(bytes: &[u8], path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_slice(bytes).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(path),
            source,
        })
    }

    /// Distinct references across `subscriptions` and `tasks`, skipping
    /// absent ones.
    pub fn handler_refs(&self) -> BTreeSet<&str> {
        self.subscriptions
            .values()
            .flat_map(|changes| changes.values())
            .filter_map(|reference| present(reference.as_deref()))
            .chain(self.tasks.iter().map(String::as_str))
            .collect()
    }
}

/// `None` for a missing or empty reference.
pub(crate) fn present(reference: Option<&str>) -> Option<&str> {
    reference.filter(|r| !r.is_empty())
}
