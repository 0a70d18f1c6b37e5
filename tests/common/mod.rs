#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc};

use sway_dispatch::{Connect, Connection, IpcEvent, Transport, TransportError};

/// In-memory transport: events are fed through [`MockFeed`], requests are recorded.
pub struct MockTransport {
    events: Mutex<mpsc::UnboundedReceiver<IpcEvent>>,
    subscriptions: StdMutex<Vec<Vec<String>>>,
    commands: StdMutex<Vec<String>>,
    closes: AtomicUsize,
    reject_subscribe: bool,
}

/// Sending side of a [`MockTransport`]'s event stream.
#[derive(Clone)]
pub struct MockFeed {
    tx: mpsc::UnboundedSender<IpcEvent>,
}

impl MockFeed {
    pub fn send(&self, event: &str, change: &str) {
        self.send_with(event, change, json!({}));
    }

    pub fn send_with(&self, event: &str, change: &str, payload: Value) {
        let _ = self.tx.send(IpcEvent::new(event, change, payload));
    }
}

impl MockTransport {
    pub fn new() -> (Arc<Self>, MockFeed) {
        Self::build(false)
    }

    pub fn rejecting_subscribe() -> (Arc<Self>, MockFeed) {
        Self::build(true)
    }

    fn build(reject_subscribe: bool) -> (Arc<Self>, MockFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            events: Mutex::new(rx),
            subscriptions: StdMutex::new(Vec::new()),
            commands: StdMutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
            reject_subscribe,
        });
        (transport, MockFeed { tx })
    }

    pub fn subscriptions(&self) -> Vec<Vec<String>> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn subscribe(&self, events: &[String]) -> Result<(), TransportError> {
        if self.reject_subscribe {
            return Err(TransportError::Rejected {
                reason: "subscription refused".into(),
            });
        }
        self.subscriptions.lock().unwrap().push(events.to_vec());
        Ok(())
    }

    async fn listen(&self) -> Result<IpcEvent, TransportError> {
        self.events
            .lock()
            .await
            .recv()
            .await
            .ok_or(TransportError::Closed)
    }

    async fn command(&self, command: &str) -> Result<Value, TransportError> {
        self.commands.lock().unwrap().push(command.to_string());
        Ok(json!({ "success": true }))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out the same [`MockTransport`] on every connect and counts calls.
pub struct MockConnector {
    transport: Arc<MockTransport>,
    connects: AtomicUsize,
}

impl MockConnector {
    pub fn new(transport: Arc<MockTransport>) -> Self {
        Self {
            transport,
            connects: AtomicUsize::new(0),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connect for MockConnector {
    async fn connect(&self) -> Result<Connection, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.transport.clone())
    }
}

/// Polls `cond` until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

/// Creates an empty plugin source file under `root`.
pub fn touch(root: &std::path::Path, relative: &str) -> std::path::PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, "").unwrap();
    path
}
