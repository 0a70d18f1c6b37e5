//! `path:function` references.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ResolveError;

/// A parsed `path:function` handler reference.
///
/// The path part may be relative (joined under the plugin root) or absolute,
/// and may omit the loader's file extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerRef {
    raw: String,
    split: usize,
}

impl HandlerRef {
    /// Parses a reference, splitting on the first `:`.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let malformed = || ResolveError::MalformedRef {
            reference: raw.to_string(),
        };
        let split = raw.find(':').ok_or_else(malformed)?;
        let (path, function) = (&raw[..split], &raw[split + 1..]);
        if path.is_empty() || function.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            raw: raw.to_string(),
            split,
        })
    }

    /// The path part.
    pub fn path(&self) -> &str {
        &self.raw[..self.split]
    }

    /// The function part.
    pub fn function(&self) -> &str {
        &self.raw[self.split + 1..]
    }

    /// Computes the plugin source path.
    ///
    /// Absolute paths are kept verbatim, relative ones are joined under
    /// `root`. `extension` is appended unless the path already ends with it.
    pub fn locate(&self, root: &Path, extension: &str) -> PathBuf {
        let path = Path::new(self.path());
        let located = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        };
        if extension.is_empty() || located.extension() == Some(OsStr::new(extension)) {
            return located;
        }
        let mut raw = located.into_os_string();
        raw.push(".");
        raw.push(extension);
        PathBuf::from(raw)
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
