mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::rstest;
use serde_json::Value;
use tempfile::TempDir;

use common::touch;
use sway_dispatch::{
    Handler, HandlerContext, HandlerError, HandlerFn, RegisteredModule, Registry, ResolveError,
    Resolver, Settings, SharedHandler,
};

fn noop(name: &'static str) -> SharedHandler {
    HandlerFn::arc(name, |_ctx: HandlerContext, _payload: Value| async {
        Ok::<_, HandlerError>(())
    })
}

struct Fixture {
    root: TempDir,
    loads: Arc<AtomicUsize>,
    resolver: Resolver,
}

fn fixture() -> Fixture {
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), "handlers.plugin");
    touch(root.path(), "nested/extra.plugin");

    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let registry = Registry::new()
        .register(
            "handlers",
            RegisteredModule::new()
                .with_init(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .with_handler("on_focus", noop("on_focus"))
                .with_handler("heartbeat", noop("heartbeat")),
        )
        .register(
            "nested/extra",
            RegisteredModule::new().with_handler("helper", noop("helper")),
        );

    let resolver = Resolver::new(root.path(), Arc::new(registry));
    Fixture {
        root,
        loads,
        resolver,
    }
}

#[tokio::test]
async fn same_reference_resolves_once() {
    let fx = fixture();

    let a = fx.resolver.resolve("handlers:on_focus").await.unwrap();
    let b = fx.resolver.resolve("handlers:on_focus").await.unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(fx.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn one_load_per_source_file() {
    let fx = fixture();

    let focus = fx.resolver.resolve("handlers:on_focus").await.unwrap();
    let beat = fx.resolver.resolve("handlers.plugin:heartbeat").await.unwrap();

    assert_eq!(focus.name(), "on_focus");
    assert_eq!(beat.name(), "heartbeat");
    assert_eq!(fx.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn nested_and_absolute_paths() {
    let fx = fixture();

    let nested = fx.resolver.resolve("nested/extra:helper").await.unwrap();
    assert_eq!(nested.name(), "helper");

    let absolute = format!("{}:on_focus", fx.root.path().join("handlers").display());
    let handler = fx.resolver.resolve(&absolute).await.unwrap();
    assert_eq!(handler.name(), "on_focus");
}

#[rstest]
#[case::no_separator("handlers")]
#[case::empty_path(":on_focus")]
#[case::empty_function("handlers:")]
#[tokio::test]
async fn malformed_reference(#[case] reference: &str) {
    let fx = fixture();
    let err = fx.resolver.resolve(reference).await.err().unwrap();
    assert!(matches!(err, ResolveError::MalformedRef { .. }), "{err}");
}

#[tokio::test]
async fn missing_plugin_file() {
    let fx = fixture();
    let err = fx.resolver.resolve("missing:on_focus").await.err().unwrap();
    match err {
        ResolveError::PluginNotFound { reference, path } => {
            assert_eq!(reference, "missing:on_focus");
            assert_eq!(path, fx.root.path().join("missing.plugin"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fx.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_function() {
    let fx = fixture();
    let err = fx.resolver.resolve("handlers:on_close").await.err().unwrap();
    assert!(
        matches!(&err, ResolveError::PluginSymbol { symbol, .. } if symbol == "on_close"),
        "{err}"
    );
}

#[tokio::test]
async fn file_without_registered_module() {
    let fx = fixture();
    touch(fx.root.path(), "orphan.plugin");
    let err = fx.resolver.resolve("orphan:run").await.err().unwrap();
    assert!(matches!(err, ResolveError::Load { .. }), "{err}");
}

#[tokio::test]
async fn settings_share_handlers_between_routes_and_tasks() {
    let fx = fixture();
    let settings = Settings::from_slice(
        br#"{
            "subscriptions": {
                "window": {
                    "focus": "handlers:on_focus",
                    "close": null,
                    "move": "handlers:on_focus"
                },
                "workspace": {"init": null}
            },
            "tasks": ["handlers:heartbeat", "handlers:on_focus"]
        }"#,
    )
    .unwrap();

    let resolved = fx.resolver.resolve_settings(&settings).await.unwrap();

    assert_eq!(resolved.handlers.len(), 2);
    assert_eq!(resolved.table.events(), vec!["window".to_string()]);
    let focus = resolved.table.route("window", "focus").unwrap();
    let moved = resolved.table.route("window", "move").unwrap();
    assert!(Arc::ptr_eq(focus, moved));
    assert!(resolved.table.route("window", "close").is_none());

    let names: Vec<_> = resolved.tasks.iter().map(|t| t.reference.as_str()).collect();
    assert_eq!(names, ["handlers:heartbeat", "handlers:on_focus"]);
    assert!(Arc::ptr_eq(&resolved.tasks[1].handler, focus));
    assert_eq!(fx.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn settings_fail_on_first_bad_reference() {
    let fx = fixture();
    let settings = Settings::from_slice(
        br#"{"subscriptions": {"window": {"focus": "handlers:on_focus"}}, "tasks": ["gone:run"]}"#,
    )
    .unwrap();

    let err = fx.resolver.resolve_settings(&settings).await.err().unwrap();
    assert!(matches!(err, ResolveError::PluginNotFound { .. }), "{err}");
}

#[tokio::test]
async fn empty_references_are_skipped_like_null() {
    let fx = fixture();
    let settings = Settings::from_slice(
        br#"{"subscriptions": {"window": {"focus": "", "close": null}}, "tasks": []}"#,
    )
    .unwrap();

    let resolved = fx.resolver.resolve_settings(&settings).await.unwrap();

    assert!(resolved.handlers.is_empty());
    assert!(resolved.table.is_empty());
    assert!(resolved.table.route("window", "focus").is_none());
    assert_eq!(fx.loads.load(Ordering::SeqCst), 0);
}
