//! Live event stream over WebSocket
//!
//! [`StreamClient::connect`] spawns a task that owns the socket and forwards
//! decoded [`Event`]s through a bounded channel. The task never writes to the
//! socket apart from the closing handshake.
//!
//! Frames that fail to decode are dropped with a `debug` log and the
//! connection stays open. By default a lost connection ends delivery; with
//! `reconnect` enabled the task retries with exponential backoff.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::{Error, Result};
use crate::types::Event;

/// Path of the push endpoint relative to the server base URL
pub const EVENTS_PATH: &str = "/ws/events";

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Where and how to connect the live stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    pub url: Url,
    /// Reconnect with backoff after the connection drops
    pub reconnect: bool,
    /// Events buffered between the socket reader and the consumer
    pub channel_capacity: usize,
}

impl StreamConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            reconnect: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Derive the push endpoint from a REST base URL.
    ///
    /// `http` becomes `ws` and `https` becomes `wss`; any base path is kept
    /// and `/ws/events` appended. Query and fragment are dropped.
    pub fn url_for_server(base_url: &str) -> Result<Url> {
        let mut url = Url::parse(base_url.trim())?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(Error::Config(format!(
                    "cannot derive a stream URL from scheme {}",
                    other
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| Error::Config(format!("cannot use scheme {} for {}", scheme, base_url)))?;

        let path = format!("{}{}", url.path().trim_end_matches('/'), EVENTS_PATH);
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }
}

/// Decode one text frame into an [`Event`].
///
/// Returns `None` (and logs at `debug`) for anything that is not a JSON event
/// with at least `ts` and `type`. Snapshot pages keep such rows; live frames
/// without them are dropped.
pub fn decode_frame(text: &str) -> Option<Event> {
    match serde_json::from_str::<Event>(text) {
        Ok(event) if event.is_complete() => Some(event),
        Ok(_) => {
            tracing::debug!(len = text.len(), "Dropping frame without ts or type");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, len = text.len(), "Dropping undecodable frame");
            None
        }
    }
}

fn decode_binary(bytes: &[u8]) -> Option<Event> {
    match std::str::from_utf8(bytes) {
        Ok(text) => decode_frame(text),
        Err(e) => {
            tracing::debug!(error = %e, "Dropping non-UTF-8 binary frame");
            None
        }
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

/// Client for the `/ws/events` push endpoint
#[derive(Debug, Clone)]
pub struct StreamClient {
    config: StreamConfig,
}

impl StreamClient {
    pub fn new(config: StreamConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Open the connection on a background task.
    ///
    /// Returns immediately; connection errors surface as the handle's
    /// [`StreamHandle::recv`] returning `None`. Must be called from within a
    /// tokio runtime.
    pub fn connect(&self) -> StreamHandle {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_stream(self.config.clone(), tx, shutdown_rx));

        StreamHandle {
            events: rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Receiving end of a live stream connection.
///
/// Dropping the handle also stops the connection task.
#[derive(Debug)]
pub struct StreamHandle {
    events: mpsc::Receiver<Event>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl StreamHandle {
    /// Next event in transport order.
    ///
    /// `None` once the connection has ended and every delivered event has
    /// been drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Close the connection and wait for the task to finish.
    ///
    /// Consumes the handle, so the connection is closed exactly once and no
    /// event can be received afterwards.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.events.close();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Stream task ended abnormally");
            }
        }
        tracing::debug!("Stream closed");
    }
}

enum Outcome {
    /// Close requested by the handle (or the handle was dropped)
    Shutdown,
    /// Consumer stopped receiving
    ConsumerGone,
    /// Server closed the socket or the transport failed
    Disconnected,
}

async fn run_stream(
    config: StreamConfig,
    tx: mpsc::Sender<Event>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut backoff = INITIAL_BACKOFF;

    loop {
        let connect = tokio::select! {
            _ = &mut shutdown => return,
            result = connect_async(config.url.as_str()) => result,
        };

        match connect {
            Ok((ws, _)) => {
                tracing::info!(url = %config.url, "Live stream connected");
                backoff = INITIAL_BACKOFF;
                match pump(ws, &tx, &mut shutdown).await {
                    Outcome::Shutdown | Outcome::ConsumerGone => return,
                    Outcome::Disconnected => {
                        tracing::info!(url = %config.url, "Live stream disconnected");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(url = %config.url, error = %e, "Live stream connect failed");
            }
        }

        if !config.reconnect {
            return;
        }

        tracing::debug!(delay_ms = backoff.as_millis() as u64, "Reconnecting live stream");
        tokio::select! {
            _ = &mut shutdown => return,
            _ = tokio::time::sleep(backoff) => {}
        }
        backoff = next_backoff(backoff);
    }
}

async fn pump(
    mut ws: WsStream,
    tx: &mpsc::Sender<Event>,
    shutdown: &mut oneshot::Receiver<()>,
) -> Outcome {
    loop {
        let frame = tokio::select! {
            _ = &mut *shutdown => {
                let _ = ws.close(None).await;
                return Outcome::Shutdown;
            }
            frame = ws.next() => frame,
        };

        let event = match frame {
            Some(Ok(Message::Text(text))) => decode_frame(&text),
            Some(Ok(Message::Binary(bytes))) => decode_binary(&bytes),
            Some(Ok(Message::Close(_))) | None => return Outcome::Disconnected,
            // ping/pong are answered by the transport
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Live stream read failed");
                return Outcome::Disconnected;
            }
        };

        let Some(event) = event else {
            continue;
        };

        tokio::select! {
            _ = &mut *shutdown => {
                let _ = ws.close(None).await;
                return Outcome::Shutdown;
            }
            sent = tx.send(event) => {
                if sent.is_err() {
                    let _ = ws.close(None).await;
                    return Outcome::ConsumerGone;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_server_swaps_scheme() {
        let url = StreamConfig::url_for_server("http://127.0.0.1:8000").unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:8000/ws/events");

        let url = StreamConfig::url_for_server("https://dash.example.com/").unwrap();
        assert_eq!(url.as_str(), "wss://dash.example.com/ws/events");
    }

    #[test]
    fn test_url_for_server_keeps_base_path() {
        let url = StreamConfig::url_for_server("http://host:8000/codexdash/?x=1#top").unwrap();
        assert_eq!(url.as_str(), "ws://host:8000/codexdash/ws/events");
    }

    #[test]
    fn test_url_for_server_rejects_other_schemes() {
        assert!(StreamConfig::url_for_server("ftp://host").is_err());
        assert!(StreamConfig::url_for_server("not a url").is_err());
    }

    #[test]
    fn test_decode_frame() {
        assert!(decode_frame("{not json").is_none());
        assert!(decode_frame(r#"{"type": "pane_output"}"#).is_none());
        assert!(decode_frame(r#"{"ts": null, "type": "pane_output"}"#).is_none());
        assert!(decode_frame(r#"{"ts": 7, "type": ""}"#).is_none());
        assert!(decode_frame("[]").is_none());

        let event = decode_frame(r#"{"ts": 42, "type": "dispatch", "agent": "alpha"}"#).unwrap();
        assert_eq!(event.ts, Some(42));
        assert_eq!(event.agent.as_deref(), Some("alpha"));
    }

    #[test]
    fn test_decode_binary() {
        assert!(decode_binary(&[0xff, 0xfe]).is_none());
        assert!(decode_binary(br#"{"ts": 1, "type": "tick"}"#).is_some());
    }

    #[test]
    fn test_backoff_doubles_to_cap() {
        let mut delay = INITIAL_BACKOFF;
        let mut seen = vec![delay.as_secs()];
        for _ in 0..6 {
            delay = next_backoff(delay);
            seen.push(delay.as_secs());
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 16, 30, 30]);
    }

    #[tokio::test]
    async fn test_connect_failure_ends_delivery() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("ws://127.0.0.1:{}/ws/events", port)).unwrap();
        let mut handle = StreamClient::new(StreamConfig::new(url)).connect();
        assert!(handle.recv().await.is_none());
        handle.close().await;
    }
}
