//! # JSON-lines transport.
//!
//! A [`Transport`] over any async byte stream pair. Each inbound line is one
//! event, each outbound line is one request:
//!
//! ```text
//! inbound : {"event":"window","change":"focus","payload":{...}}
//! outbound: {"subscribe":["window","workspace"]}
//!           {"command":"workspace 2"}
//! ```
//!
//! Inbound events whose name was not subscribed are skipped. Commands are
//! fire-and-forget: the stream carries no replies, so `command` returns
//! `{"success": true}` once the line is flushed.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::{Mutex, RwLock};
use tracing::trace;

use super::{Connect, Connection, IpcEvent, Transport};
use crate::error::TransportError;

const TRANSPORT_TARGET: &str = "sway_dispatch::transport";

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Outbound<'a> {
    Subscribe(&'a [String]),
    Command(&'a str),
}

/// JSON-lines connection over a reader/writer pair.
pub struct LinesTransport<R, W> {
    reader: Mutex<Lines<BufReader<R>>>,
    writer: Mutex<W>,
    subscribed: RwLock<HashSet<String>>,
    closed: AtomicBool,
}

impl<R, W> LinesTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Wraps a reader (events) and a writer (requests).
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(BufReader::new(reader).lines()),
            writer: Mutex::new(writer),
            subscribed: RwLock::new(HashSet::new()),
            closed: AtomicBool::new(false),
        }
    }

    async fn send(&self, message: &Outbound<'_>) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<R, W> Transport for LinesTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn subscribe(&self, events: &[String]) -> Result<(), TransportError> {
        self.send(&Outbound::Subscribe(events)).await?;
        self.subscribed
            .write()
            .await
            .extend(events.iter().cloned());
        Ok(())
    }

    async fn listen(&self) -> Result<IpcEvent, TransportError> {
        let mut lines = self.reader.lock().await;
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(TransportError::Closed);
            }
            let Some(line) = lines.next_line().await? else {
                return Err(TransportError::Closed);
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let event: IpcEvent = serde_json::from_str(line)?;
            if self.subscribed.read().await.contains(&event.event) {
                return Ok(event);
            }
            trace!(target: TRANSPORT_TARGET, event = %event.event, "skipping unsubscribed event");
        }
    }

    async fn command(&self, command: &str) -> Result<Value, TransportError> {
        self.send(&Outbound::Command(command)).await?;
        Ok(json!({ "success": true }))
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.writer.lock().await.shutdown().await?;
        Ok(())
    }
}

/// Connects a [`LinesTransport`] to the process's stdin and stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioConnector;

#[async_trait]
impl Connect for StdioConnector {
    async fn connect(&self) -> Result<Connection, TransportError> {
        Ok(Arc::new(LinesTransport::new(
            tokio::io::stdin(),
            tokio::io::stdout(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};

    #[tokio::test]
    async fn subscribe_writes_request_and_filters_events() {
        let (mut peer_events, events) = duplex(1024);
        let (requests, peer_requests) = duplex(1024);
        let transport = LinesTransport::new(events, requests);

        transport.subscribe(&["window".to_string()]).await.unwrap();
        let mut peer = BufReader::new(peer_requests).lines();
        assert_eq!(
            peer.next_line().await.unwrap().as_deref(),
            Some(r#"{"subscribe":["window"]}"#)
        );

        peer_events
            .write_all(b"{\"event\":\"workspace\",\"change\":\"init\"}\n\n")
            .await
            .unwrap();
        peer_events
            .write_all(b"{\"event\":\"window\",\"change\":\"focus\",\"payload\":{\"id\":7}}\n")
            .await
            .unwrap();

        let ev = transport.listen().await.unwrap();
        assert_eq!(ev, IpcEvent::new("window", "focus", json!({ "id": 7 })));
    }

    #[tokio::test]
    async fn hangup_and_close_end_the_stream() {
        let (peer_events, events) = duplex(64);
        let (requests, _peer_requests) = duplex(64);
        let transport = LinesTransport::new(events, requests);

        drop(peer_events);
        assert!(matches!(transport.listen().await, Err(TransportError::Closed)));

        transport.close().await.unwrap();
        transport.close().await.unwrap();
        assert!(matches!(
            transport.command("nop").await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn garbage_line_is_a_decode_error() {
        let (mut peer_events, events) = duplex(64);
        let (requests, _peer_requests) = duplex(64);
        let transport = LinesTransport::new(events, requests);

        peer_events.write_all(b"not json\n").await.unwrap();
        assert!(matches!(
            transport.listen().await,
            Err(TransportError::Decode(_))
        ));
    }
}
