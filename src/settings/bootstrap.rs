//! First-run preparation of the config directory.
//!
//! ```text
//! $XDG_CONFIG_HOME/<app_dir>/
//! ├── settings.json    seeded from the bundled default when absent
//! └── plugins/         plugin root
//! ```

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::config::DaemonConfig;
use crate::error::ConfigError;

/// Environment variable naming the user config home.
pub const CONFIG_HOME_VAR: &str = "XDG_CONFIG_HOME";

/// Settings document written on first run.
pub const DEFAULT_SETTINGS: &str = include_str!("../../assets/settings.json");

/// Resolved config directory layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// `$XDG_CONFIG_HOME/<app_dir>`.
    pub root: PathBuf,
    /// Settings document path.
    pub settings: PathBuf,
    /// Plugin root.
    pub plugins: PathBuf,
}

/// Prepares the layout under `$XDG_CONFIG_HOME`.
pub fn prepare(cfg: &DaemonConfig) -> Result<Layout, ConfigError> {
    let home = config_home(std::env::var_os(CONFIG_HOME_VAR))?;
    prepare_in(&home, cfg)
}

/// Validates the value of [`CONFIG_HOME_VAR`]; unset and empty are errors.
pub fn config_home(value: Option<OsString>) -> Result<PathBuf, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or(ConfigError::MissingEnv {
            var: CONFIG_HOME_VAR,
        })
}

/// Prepares the layout under an explicit config home.
///
/// Creates missing directories and seeds the default settings document. An
/// existing settings file is never touched.
pub fn prepare_in(config_home: &Path, cfg: &DaemonConfig) -> Result<Layout, ConfigError> {
    let root = config_home.join(&cfg.app_dir);
    let layout = Layout {
        settings: root.join(&cfg.settings_file),
        plugins: root.join(&cfg.plugin_dir),
        root,
    };

    for dir in [&layout.root, &layout.plugins] {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.clone(),
            source,
        })?;
    }

    if !layout.settings.exists() {
        seed(&layout.settings, DEFAULT_SETTINGS.as_bytes())?;
        info!(path = %layout.settings.display(), "seeded default settings");
    }
    Ok(layout)
}

/// Writes `contents` to `path` atomically (temp file + rename).
///
/// Losing a race against another writer is fine: the existing file wins.
fn seed(path: &Path, contents: &[u8]) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(contents).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(()),
        Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(err) => Err(io_err(err.error)),
    }
}
