//! # Plugin loading seam.
//!
//! A [`Loader`] turns one plugin source file into a [`Module`]; the module
//! then hands out handlers by function name. The [`Resolver`](super::Resolver)
//! calls `load` at most once per source path.
//!
//! Sibling resolution is explicit: [`LoadContext::sibling_dir`] is passed to
//! the loader, which decides how to use it (the exec loader runs plugins with
//! it as working directory). Nothing process-wide is modified, so there is no
//! state to restore when loading fails.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::handler::SharedHandler;
use crate::error::ResolveError;

/// Everything a loader needs to load one source unit.
#[derive(Debug, Clone, Copy)]
pub struct LoadContext<'a> {
    /// Plugin root directory.
    pub root: &'a Path,
    /// Full path of the source unit (exists on disk).
    pub source: &'a Path,
    /// Directory containing the source unit.
    pub sibling_dir: &'a Path,
}

impl<'a> LoadContext<'a> {
    /// Builds a context for `source` under `root`.
    pub fn new(root: &'a Path, source: &'a Path) -> Self {
        Self {
            root,
            source,
            sibling_dir: source.parent().unwrap_or(root),
        }
    }
}

/// A loaded plugin source unit.
pub trait Module: Send + Sync {
    /// Looks up an exported function.
    fn symbol(&self, name: &str) -> Option<SharedHandler>;
}

/// Loads plugin source units.
#[async_trait]
pub trait Loader: Send + Sync {
    /// File extension appended to references that omit it (without the dot).
    fn extension(&self) -> &str;

    /// Loads the unit at `ctx.source`. Any initialisation the unit performs
    /// happens here, once.
    async fn load(&self, ctx: LoadContext<'_>) -> Result<Arc<dyn Module>, ResolveError>;
}
