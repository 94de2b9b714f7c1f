//! Feed connection lifecycle.
//!
//! One [`FeedClient`] manages one persistent WebSocket connection per
//! authenticated session. A spawned management task owns the socket: it
//! registers the topic subscriptions, requests a history replay, pumps
//! inbound frames into the single consumer, and reconnects on a fixed delay
//! for as long as the client lives. Commands are fire-and-forget: they
//! resolve once handed to the transport, never on server confirmation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::client::IntoClientRequest,
    tungstenite::handshake::client::Request,
    tungstenite::http::HeaderValue,
    tungstenite::http::header::AUTHORIZATION,
    tungstenite::protocol::Message,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{FeedError, Result};
use crate::event::FeedEvent;
use crate::frame::{ClientFrame, DeliveryKind, ServerFrame, Topic};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Settings for a feed connection.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// WebSocket endpoint (`ws://` or `wss://`)
    pub url: String,
    /// Delay between reconnection attempts. Constant, no backoff, no cap.
    pub reconnect_delay: Duration,
    /// Capacity of the consumer event channel
    pub event_buffer: usize,
    /// Capacity of the outbound command channel
    pub command_buffer: usize,
}

impl FeedConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            reconnect_delay: Duration::from_secs(5),
            event_buffer: 256,
            command_buffer: 32,
        }
    }
}

/// Single-consumer stream of [`FeedEvent`]s.
///
/// Handed out exactly once by [`FeedClient::new`]; ownership enforces the
/// one-consumer contract instead of a mutable callback slot.
pub struct FeedEvents {
    rx: mpsc::Receiver<FeedEvent>,
}

impl FeedEvents {
    /// Receive the next event. Returns `None` once the client is gone.
    pub async fn recv(&mut self) -> Option<FeedEvent> {
        self.rx.recv().await
    }
}

struct ConnectionTask {
    command_tx: mpsc::Sender<ClientFrame>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Client for the live notification feed.
pub struct FeedClient {
    config: FeedConfig,
    inner: parking_lot::Mutex<Option<ConnectionTask>>,
    is_connected: Arc<AtomicBool>,
    event_tx: mpsc::Sender<FeedEvent>,
}

impl FeedClient {
    /// Create a client and the event stream for its single consumer.
    pub fn new(config: FeedConfig) -> (Self, FeedEvents) {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer.max(1));

        let client = Self {
            config,
            inner: parking_lot::Mutex::new(None),
            is_connected: Arc::new(AtomicBool::new(false)),
            event_tx,
        };

        (client, FeedEvents { rx: event_rx })
    }

    /// Open the connection, authenticated with `token`.
    ///
    /// Idempotent: when a connection task is already running this resolves
    /// immediately without reconnecting. Otherwise it resolves once the
    /// topic subscriptions are registered (not once the server answers), and
    /// fails if the first attempt reports a transport error. Even after a
    /// failed first attempt the task keeps retrying on the configured fixed
    /// delay; callers never retry manually.
    pub async fn connect(&self, token: &str) -> Result<()> {
        let endpoint = Url::parse(&self.config.url)?;
        if !matches!(endpoint.scheme(), "ws" | "wss") {
            return Err(FeedError::protocol(format!(
                "Unsupported feed scheme: {}",
                endpoint.scheme()
            )));
        }

        let ready_rx = {
            let mut guard = self.inner.lock();
            if let Some(task) = guard.as_ref() {
                if !task.handle.is_finished() {
                    debug!("Feed already connected, reusing connection");
                    return Ok(());
                }
            }

            let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer.max(1));
            let (ready_tx, ready_rx) = oneshot::channel();
            let cancel = CancellationToken::new();

            let handle = tokio::spawn(run_connection(ConnectionParams {
                connection_id: Uuid::new_v4(),
                url: endpoint.to_string(),
                token: token.to_string(),
                reconnect_delay: self.config.reconnect_delay,
                command_rx,
                event_tx: self.event_tx.clone(),
                is_connected: Arc::clone(&self.is_connected),
                cancel: cancel.clone(),
                ready_tx,
            }));

            *guard = Some(ConnectionTask {
                command_tx,
                cancel,
                handle,
            });
            ready_rx
        };

        match ready_rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(FeedError::connection(
                "Connection task exited before the handshake",
            )),
        }
    }

    /// Unsubscribe from all topics, then deactivate the connection.
    ///
    /// Safe to call when not connected (no-op).
    pub async fn disconnect(&self) {
        let Some(task) = self.inner.lock().take() else {
            return;
        };

        // The management task sends the unsubscribe frames and closes the
        // socket when it observes the cancellation.
        task.cancel.cancel();
        let _ = task.handle.await;
        self.is_connected.store(false, Ordering::SeqCst);
    }

    /// Whether the channel is currently connected.
    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    /// Publish a mark-as-read command for one notification.
    pub async fn mark_read(&self, id: &str) -> Result<()> {
        self.send_command(ClientFrame::MarkRead {
            notification_id: id.to_string(),
        })
        .await
    }

    /// Publish a mark-all-as-read command.
    pub async fn mark_all_read(&self) -> Result<()> {
        self.send_command(ClientFrame::MarkAllRead).await
    }

    /// Hand a command frame to the transport.
    ///
    /// Resolves once the frame is queued for the socket writer, not when the
    /// server confirms. Connectivity is the only precondition, checked
    /// synchronously before the send.
    async fn send_command(&self, frame: ClientFrame) -> Result<()> {
        if !self.is_connected() {
            return Err(FeedError::NotConnected);
        }

        let command_tx = {
            let guard = self.inner.lock();
            let task = guard.as_ref().ok_or(FeedError::NotConnected)?;
            task.command_tx.clone()
        };

        command_tx
            .send(frame)
            .await
            .map_err(|_| FeedError::NotConnected)
    }
}

impl Drop for FeedClient {
    fn drop(&mut self) {
        if let Some(task) = self.inner.lock().take() {
            task.cancel.cancel();
        }
    }
}

struct ConnectionParams {
    connection_id: Uuid,
    url: String,
    token: String,
    reconnect_delay: Duration,
    command_rx: mpsc::Receiver<ClientFrame>,
    event_tx: mpsc::Sender<FeedEvent>,
    is_connected: Arc<AtomicBool>,
    cancel: CancellationToken,
    ready_tx: oneshot::Sender<Result<()>>,
}

enum PumpExit {
    /// Cancellation observed; unsubscribed and closed.
    Shutdown,
    /// Transport failed or the server closed the stream.
    ConnectionLost,
}

/// Management task: connect, subscribe, replay, pump, reconnect.
async fn run_connection(params: ConnectionParams) {
    let ConnectionParams {
        connection_id,
        url,
        token,
        reconnect_delay,
        mut command_rx,
        event_tx,
        is_connected,
        cancel,
        ready_tx,
    } = params;

    let mut ready = Some(ready_tx);

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let request = match build_request(&url, &token) {
            Ok(request) => request,
            Err(e) => {
                error!(%connection_id, error = %e, "Invalid feed endpoint");
                if let Some(tx) = ready.take() {
                    let _ = tx.send(Err(e));
                }
                return;
            }
        };

        match connect_async(request).await {
            Ok((mut stream, _)) => {
                info!(%connection_id, url = %url, "Feed connected");

                // Register subscriptions, then ask for the history replay.
                let mut handshake_ok = true;
                for frame in handshake_frames() {
                    if let Err(e) = send_frame(&mut stream, &frame).await {
                        warn!(%connection_id, error = %e, "Feed handshake failed");
                        handshake_ok = false;
                        break;
                    }
                }

                if handshake_ok {
                    is_connected.store(true, Ordering::SeqCst);
                    if let Some(tx) = ready.take() {
                        let _ = tx.send(Ok(()));
                    }
                    let _ = event_tx.send(FeedEvent::Connected).await;

                    let exit = pump(&mut stream, &mut command_rx, &event_tx, &cancel).await;

                    is_connected.store(false, Ordering::SeqCst);
                    let _ = event_tx.send(FeedEvent::Disconnected).await;

                    if matches!(exit, PumpExit::Shutdown) {
                        break;
                    }
                    warn!(%connection_id, "Feed connection lost, scheduling reconnect");
                } else if let Some(tx) = ready.take() {
                    let _ = tx.send(Err(FeedError::connection(
                        "Failed to register subscriptions",
                    )));
                }
            }
            Err(e) => {
                warn!(%connection_id, error = %e, "Feed connection failed");
                if let Some(tx) = ready.take() {
                    let _ = tx.send(Err(FeedError::connection(e.to_string())));
                }
            }
        }

        // Constant delay, retried indefinitely. The feed carries
        // eventually-consistent data and the HTTP baseline stays the
        // fallback source of truth, so there is no backoff or attempt cap.
        tokio::select! {
            _ = tokio::time::sleep(reconnect_delay) => {}
            _ = cancel.cancelled() => break,
        }
    }

    debug!(%connection_id, "Feed connection task stopped");
}

/// Pump one established connection until it fails or is shut down.
async fn pump(
    stream: &mut WsStream,
    command_rx: &mut mpsc::Receiver<ClientFrame>,
    event_tx: &mpsc::Sender<FeedEvent>,
    cancel: &CancellationToken,
) -> PumpExit {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                for topic in Topic::ALL {
                    let _ = send_frame(stream, &ClientFrame::Unsubscribe { topic }).await;
                }
                let _ = stream.close(None).await;
                return PumpExit::Shutdown;
            }

            Some(frame) = command_rx.recv() => {
                if let Err(e) = send_frame(stream, &frame).await {
                    warn!(error = %e, "Failed to send command frame");
                    return PumpExit::ConnectionLost;
                }
            }

            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerFrame>(&text) {
                        Ok(frame) => {
                            if let Some(event) = frame_event(frame) {
                                if event_tx.send(event).await.is_err() {
                                    // Consumer gone; nothing left to deliver to.
                                    let _ = stream.close(None).await;
                                    return PumpExit::Shutdown;
                                }
                            }
                        }
                        Err(e) => warn!(error = %e, "Undecodable feed frame"),
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    warn!("Feed stream closed by server");
                    return PumpExit::ConnectionLost;
                }
                Some(Ok(_)) => {} // ping/pong/binary: nothing to do
                Some(Err(e)) => {
                    error!(error = %e, "Feed stream error");
                    return PumpExit::ConnectionLost;
                }
            }
        }
    }
}

/// Map a decoded server frame onto a consumer event.
fn frame_event(frame: ServerFrame) -> Option<FeedEvent> {
    match frame {
        ServerFrame::Notifications { kind, items } => Some(FeedEvent::Delivery { kind, items }),
        ServerFrame::Broadcast { item } => Some(FeedEvent::Delivery {
            kind: DeliveryKind::Delta,
            items: vec![item],
        }),
        ServerFrame::UnreadCount { count: Some(count) } => Some(FeedEvent::UnreadCount(count)),
        ServerFrame::UnreadCount { count: None } => {
            debug!("Dropping unread-count frame without a count");
            None
        }
        ServerFrame::Responses { body } => {
            debug!(%body, "Command acknowledged");
            None
        }
    }
}

/// Subscriptions for every topic, then the history replay request.
fn handshake_frames() -> Vec<ClientFrame> {
    let mut frames: Vec<ClientFrame> = Topic::ALL
        .into_iter()
        .map(|topic| ClientFrame::Subscribe { topic })
        .collect();
    frames.push(ClientFrame::Replay);
    frames
}

async fn send_frame(stream: &mut WsStream, frame: &ClientFrame) -> Result<()> {
    let text = serde_json::to_string(frame)?;
    stream
        .send(Message::Text(text))
        .await
        .map_err(|e| FeedError::connection(e.to_string()))
}

/// WebSocket upgrade request carrying the bearer token.
fn build_request(url: &str, token: &str) -> Result<Request> {
    let mut request = url
        .into_client_request()
        .map_err(|e| FeedError::protocol(e.to_string()))?;

    let value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| FeedError::protocol("Token is not a valid header value"))?;
    request.headers_mut().insert(AUTHORIZATION, value);

    Ok(request)
}
