//! Signals hit the whole test process, so these tests live in their own
//! binary and take turns.
#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::Mutex;

use common::{MockConnector, MockTransport, touch, wait_until};
use sway_dispatch::{
    Connect, Connection, DaemonConfig, EventKind, HandlerContext, HandlerError, HandlerFn,
    RegisteredModule, Registry, Resolver, Settings, SharedHandler, Supervisor, TransportError,
};

static SERIAL: Mutex<()> = Mutex::const_new(());

const SETTINGS: &str = r#"{"subscriptions": {}, "tasks": ["handlers:heartbeat"]}"#;

fn sigterm_self() {
    let status = std::process::Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());
}

fn resolver(beats: Arc<AtomicUsize>) -> (TempDir, Resolver) {
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), "handlers.plugin");
    let heartbeat: SharedHandler =
        HandlerFn::arc("heartbeat", move |ctx: HandlerContext, _payload: Value| {
            let beats = Arc::clone(&beats);
            async move {
                loop {
                    beats.fetch_add(1, Ordering::SeqCst);
                    tokio::select! {
                        _ = ctx.token().cancelled() => return Err(HandlerError::Canceled),
                        _ = tokio::time::sleep(Duration::from_millis(5)) => {}
                    }
                }
            }
        });
    let registry = Registry::new().register(
        "handlers",
        RegisteredModule::new().with_handler("heartbeat", heartbeat),
    );
    let resolver = Resolver::new(root.path(), Arc::new(registry));
    (root, resolver)
}

/// Raises SIGTERM from inside `connect`, before any unit exists.
struct SignallingConnector(MockConnector);

#[async_trait]
impl Connect for SignallingConnector {
    async fn connect(&self) -> Result<Connection, TransportError> {
        sigterm_self();
        self.0.connect().await
    }
}

#[tokio::test]
async fn sigterm_during_run_shuts_down_cooperatively() {
    let _turn = SERIAL.lock().await;
    let beats = Arc::new(AtomicUsize::new(0));
    let (_root, resolver) = resolver(Arc::clone(&beats));
    let (transport, _feed) = MockTransport::new();
    let connector = Arc::new(MockConnector::new(Arc::clone(&transport)));
    let sup = Supervisor::builder(DaemonConfig::default()).build();
    let mut rx = sup.bus().subscribe();

    let settings = Settings::from_slice(SETTINGS.as_bytes()).unwrap();
    let run = {
        let sup = Arc::clone(&sup);
        let connector = Arc::clone(&connector);
        tokio::spawn(async move { sup.run(&settings, &resolver, &*connector).await })
    };
    assert!(wait_until(Duration::from_secs(2), || beats.load(Ordering::SeqCst) >= 1).await);

    sigterm_self();
    tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("supervisor ignored SIGTERM")
        .unwrap()
        .unwrap();

    assert_eq!(transport.closes(), 1);
    let mut reasons = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        if ev.kind == EventKind::ShutdownRequested {
            reasons.push(ev.reason.as_deref().map(String::from));
        }
    }
    assert_eq!(reasons, [Some("SIGTERM".to_string())]);
}

#[tokio::test]
async fn sigterm_while_connecting_still_closes() {
    let _turn = SERIAL.lock().await;
    let (_root, resolver) = resolver(Arc::new(AtomicUsize::new(0)));
    let (transport, _feed) = MockTransport::new();
    let connector = SignallingConnector(MockConnector::new(Arc::clone(&transport)));
    let sup = Supervisor::builder(DaemonConfig::default()).build();

    let settings = Settings::from_slice(SETTINGS.as_bytes()).unwrap();
    tokio::time::timeout(
        Duration::from_secs(5),
        sup.run(&settings, &resolver, &connector),
    )
    .await
    .expect("SIGTERM raised during connect was lost")
    .unwrap();

    assert_eq!(connector.0.connects(), 1);
    assert_eq!(transport.closes(), 1);
}
