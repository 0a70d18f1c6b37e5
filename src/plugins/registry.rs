//! # Compiled-in plugin registry.
//!
//! [`Registry`] is a [`Loader`] whose modules are registered in code. A
//! reference still has to point at an existing file so configurations are
//! validated the same way as for external plugins; the file content is
//! ignored. The module key is the source path relative to the plugin root,
//! without extension, using `/` separators (`handlers`, `wm/layout`).
//! Sources outside the root use their full path without extension.
//!
//! ```text
//! settings: "wm/layout:tile"
//!   └─► <root>/wm/layout.plugin exists?   (Resolver)
//!         └─► Registry::load(key = "wm/layout") ─► init hook runs once
//!               └─► module.symbol("tile")
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Component, Path};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::handler::SharedHandler;
use super::loader::{LoadContext, Loader, Module};
use crate::error::ResolveError;

/// File extension of registry-backed plugin files.
pub const REGISTRY_EXTENSION: &str = "plugin";

type InitHook = Arc<dyn Fn() + Send + Sync>;

/// A module description: named handlers plus an optional init hook that runs
/// every time the module is loaded.
#[derive(Clone, Default)]
pub struct RegisteredModule {
    init: Option<InitHook>,
    handlers: HashMap<String, SharedHandler>,
}

impl RegisteredModule {
    /// Creates an empty module.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook executed when the module is loaded.
    pub fn with_init(mut self, init: impl Fn() + Send + Sync + 'static) -> Self {
        self.init = Some(Arc::new(init));
        self
    }

    /// Exports `handler` under `name`.
    pub fn with_handler(mut self, name: impl Into<String>, handler: SharedHandler) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }
}

struct LoadedModule {
    handlers: HashMap<String, SharedHandler>,
}

impl Module for LoadedModule {
    fn symbol(&self, name: &str) -> Option<SharedHandler> {
        self.handlers.get(name).cloned()
    }
}

/// Compiled-in plugin loader.
#[derive(Clone)]
pub struct Registry {
    modules: HashMap<String, RegisteredModule>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty registry using [`REGISTRY_EXTENSION`].
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Registers a module under `key`.
    pub fn register(mut self, key: impl Into<String>, module: RegisteredModule) -> Self {
        self.modules.insert(key.into(), module);
        self
    }

    fn key_for(&self, ctx: &LoadContext<'_>) -> String {
        let relative = ctx.source.strip_prefix(ctx.root).unwrap_or(ctx.source);
        let stem = strip_extension(relative, REGISTRY_EXTENSION);
        stem.components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                Component::RootDir => Some(String::new()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn strip_extension<'a>(path: &'a Path, extension: &str) -> Cow<'a, Path> {
    match path.extension() {
        Some(ext) if !extension.is_empty() && ext == extension => {
            Cow::Owned(path.with_extension(""))
        }
        _ => Cow::Borrowed(path),
    }
}

#[async_trait]
impl Loader for Registry {
    fn extension(&self) -> &str {
        REGISTRY_EXTENSION
    }

    async fn load(&self, ctx: LoadContext<'_>) -> Result<Arc<dyn Module>, ResolveError> {
        let key = self.key_for(&ctx);
        let module = self.modules.get(&key).ok_or_else(|| ResolveError::Load {
            path: ctx.source.to_path_buf(),
            reason: format!("no compiled-in module registered as {key:?}"),
        })?;

        debug!(module = %key, handlers = module.handlers.len(), "loading compiled-in module");
        if let Some(init) = &module.init {
            init();
        }
        Ok(Arc::new(LoadedModule {
            handlers: module.handlers.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn key_is_relative_stem_with_slashes() {
        let reg = Registry::new();
        let root = PathBuf::from("/cfg/plugins");

        let source = root.join("wm/layout.plugin");
        assert_eq!(reg.key_for(&LoadContext::new(&root, &source)), "wm/layout");

        let source = root.join("handlers.plugin");
        assert_eq!(reg.key_for(&LoadContext::new(&root, &source)), "handlers");

        let outside = PathBuf::from("/opt/extra/tools.plugin");
        assert_eq!(
            reg.key_for(&LoadContext::new(&root, &outside)),
            "/opt/extra/tools"
        );
    }

    #[tokio::test]
    async fn unknown_module_is_a_load_error() {
        let reg = Registry::new();
        let root = PathBuf::from("/cfg/plugins");
        let source = root.join("missing.plugin");
        let err = reg.load(LoadContext::new(&root, &source)).await.err();
        assert!(matches!(err, Some(ResolveError::Load { .. })));
    }
}
