//! # Reference resolution.
//!
//! [`Resolver`] turns `path:function` references into [`SharedHandler`]s.
//!
//! ```text
//! "handlers:on_focus"
//!   ├─► HandlerRef::parse            (MalformedRef)
//!   ├─► locate(root, loader ext)     (PluginNotFound if no file)
//!   ├─► module cache ── miss ──► Loader::load(LoadContext)   (once per source)
//!   └─► module.symbol("on_focus")    (PluginSymbol)
//! ```
//!
//! ## Rules
//! - A reference string is resolved at most once per resolver; every later
//!   request returns the same `Arc`.
//! - A source file is loaded at most once per resolver, however many of its
//!   functions are referenced.
//! - [`Resolver::resolve_settings`] collects the distinct references of a
//!   whole document before resolving any of them, then derives both the
//!   subscription table and the task list from the resulting map.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::handler::SharedHandler;
use super::handler_ref::HandlerRef;
use super::loader::{LoadContext, Loader, Module};
use crate::dispatch::SubscriptionTable;
use crate::error::ResolveError;
use crate::settings::Settings;

/// A background task: the reference as written plus its resolved handler.
#[derive(Clone)]
pub struct TaskUnit {
    /// Reference from the `tasks` list, used as the unit name.
    pub reference: String,
    /// Resolved handler, shared with any subscription using the same reference.
    pub handler: SharedHandler,
}

/// Output of [`Resolver::resolve_settings`].
pub struct Resolved {
    /// Distinct reference → handler.
    pub handlers: BTreeMap<String, SharedHandler>,
    /// Routing table derived from `subscriptions`.
    pub table: SubscriptionTable,
    /// One unit per `tasks` entry, in order.
    pub tasks: Vec<TaskUnit>,
}

/// Resolves handler references against a plugin root with a [`Loader`].
pub struct Resolver {
    root: PathBuf,
    loader: Arc<dyn Loader>,
    modules: Mutex<HashMap<PathBuf, Arc<dyn Module>>>,
    handlers: Mutex<HashMap<String, SharedHandler>>,
}

impl Resolver {
    /// Creates a resolver for plugins under `root`.
    pub fn new(root: impl Into<PathBuf>, loader: Arc<dyn Loader>) -> Self {
        Self {
            root: root.into(),
            loader,
            modules: Mutex::new(HashMap::new()),
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves one reference, reusing earlier results.
    pub async fn resolve(&self, reference: &str) -> Result<SharedHandler, ResolveError> {
        let mut handlers = self.handlers.lock().await;
        if let Some(handler) = handlers.get(reference) {
            return Ok(Arc::clone(handler));
        }

        let parsed = HandlerRef::parse(reference)?;
        let source = parsed.locate(&self.root, self.loader.extension());
        let is_file = tokio::fs::metadata(&source)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(ResolveError::PluginNotFound {
                reference: reference.to_string(),
                path: source,
            });
        }

        let module = self.module(&source).await?;
        let handler = module
            .symbol(parsed.function())
            .ok_or_else(|| ResolveError::PluginSymbol {
                reference: reference.to_string(),
                path: source.clone(),
                symbol: parsed.function().to_string(),
            })?;

        debug!(reference, source = %source.display(), handler = handler.name(), "handler resolved");
        handlers.insert(reference.to_string(), Arc::clone(&handler));
        Ok(handler)
    }

    /// Loads `source` unless a module for the same canonical path is cached.
    async fn module(&self, source: &Path) -> Result<Arc<dyn Module>, ResolveError> {
        let key = tokio::fs::canonicalize(source)
            .await
            .unwrap_or_else(|_| source.to_path_buf());
        let mut modules = self.modules.lock().await;
        if let Some(module) = modules.get(&key) {
            return Ok(Arc::clone(module));
        }
        let module = self
            .loader
            .load(LoadContext::new(&self.root, source))
            .await?;
        modules.insert(key, Arc::clone(&module));
        Ok(module)
    }

    /// Resolves every distinct reference of `settings` and derives the
    /// subscription table and the task list.
    ///
    /// The first failure aborts; nothing is partially returned.
    pub async fn resolve_settings(&self, settings: &Settings) -> Result<Resolved, ResolveError> {
        let mut handlers = BTreeMap::new();
        for reference in settings.handler_refs() {
            let handler = self.resolve(reference).await?;
            handlers.insert(reference.to_string(), handler);
        }

        let table = SubscriptionTable::build(&settings.subscriptions, &handlers);
        let tasks = settings
            .tasks
            .iter()
            .filter_map(|reference| {
                handlers.get(reference).map(|handler| TaskUnit {
                    reference: reference.clone(),
                    handler: Arc::clone(handler),
                })
            })
            .collect();

        info!(
            handlers = handlers.len(),
            events = table.len(),
            tasks = settings.tasks.len(),
            "handlers resolved"
        );
        Ok(Resolved {
            handlers,
            table,
            tasks,
        })
    }
}
