//! WebSocket sync client for one building-model project.
//!
//! Owns the connect/retry state machine, the bounded outbound queue and
//! its single-flight processor, the inbound dispatcher and the message
//! history. External code interacts only through `connect`, `disconnect`,
//! `enqueue` and the read-only observables; the socket and queue are never
//! reachable directly.
//!
//! One supervising task runs per `connect` call. It dials, runs the read
//! loop until close, and sleeps out the backoff between attempts, so
//! `disconnect` cancels a pending retry simply by aborting the task.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::config::SyncConfig;
use crate::consumer::Consumers;
use crate::error::SyncError;
use crate::protocol::{Envelope, MessageType};
use crate::queue::{MessageHistory, OutboundQueue};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Connection lifecycle.
///
/// `Failed` is terminal until a fresh `connect`; every other transition is
/// driven by open/close events or by `disconnect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Retrying,
    Failed,
}

/// Exponential backoff step: double, capped.
fn next_retry_delay(current: Duration, cap: Duration) -> Duration {
    (current * 2).min(cap)
}

/// State shared between the client handle and its background tasks.
///
/// Mutations happen through short lock scopes; no lock is held across a
/// suspension point except the sink lock around one bounded send.
struct Shared {
    config: SyncConfig,
    consumers: Consumers,
    state: RwLock<ConnectionState>,
    /// Fast-path flag mirroring `state == Connected`.
    connected: AtomicBool,
    last_error: RwLock<Option<String>>,
    retry_count: AtomicU32,
    retry_delay: Mutex<Duration>,
    queue: Mutex<OutboundQueue>,
    history: Mutex<MessageHistory>,
    sink: Mutex<Option<WsSink>>,
    /// Single-flight guard for the queue processor.
    queue_processing: AtomicBool,
}

impl Shared {
    async fn set_state(&self, state: ConnectionState) {
        *self.state.write().await = state;
        self.connected
            .store(state == ConnectionState::Connected, Ordering::SeqCst);
    }

    async fn set_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }

    /// Start the queue processor unless one is already running.
    fn trigger_queue_processor(shared: &Arc<Self>) {
        if !shared.queue_processing.load(Ordering::SeqCst) {
            tokio::spawn(Self::process_queue(Arc::clone(shared)));
        }
    }

    /// Supervising connection task: dial, pump, back off, repeat.
    async fn connection_task(self: Arc<Self>, project_id: String) {
        let url = self.config.project_url(&project_id);
        loop {
            self.set_state(ConnectionState::Connecting).await;

            match tokio_tungstenite::connect_async(&url).await {
                Ok((ws, _)) => {
                    let (sink, stream) = ws.split();
                    *self.sink.lock().await = Some(sink);

                    *self.last_error.write().await = None;
                    self.retry_count.store(0, Ordering::SeqCst);
                    *self.retry_delay.lock().await = self.config.initial_retry_delay;
                    self.set_state(ConnectionState::Connected).await;
                    log::info!("connected to {url}");

                    Self::trigger_queue_processor(&self);

                    let clean = self.read_loop(stream).await;
                    self.connected.store(false, Ordering::SeqCst);
                    *self.sink.lock().await = None;

                    if clean {
                        self.set_state(ConnectionState::Disconnected).await;
                        log::info!("connection to {url} closed cleanly");
                        return;
                    }
                    log::warn!("connection to {url} closed uncleanly");
                }
                Err(e) => {
                    log::error!("failed to establish connection to {url}: {e}");
                    self.set_error("Failed to establish connection. Please try again.")
                        .await;
                }
            }

            let attempts = self.retry_count.load(Ordering::SeqCst);
            if attempts >= self.config.max_retries {
                self.set_state(ConnectionState::Failed).await;
                self.set_error(
                    "Failed to connect after maximum retry attempts. \
                     Please check your connection and try again.",
                )
                .await;
                log::error!(
                    "{} ({url})",
                    SyncError::RetriesExhausted(self.config.max_retries)
                );
                return;
            }

            let delay = {
                let mut retry_delay = self.retry_delay.lock().await;
                *retry_delay = next_retry_delay(*retry_delay, self.config.max_retry_delay);
                *retry_delay
            };
            self.retry_count.store(attempts + 1, Ordering::SeqCst);
            self.set_state(ConnectionState::Retrying).await;
            self.set_error(format!(
                "Connection lost. Retrying in {}... (attempt {}/{})",
                humantime::format_duration(delay),
                attempts + 1,
                self.config.max_retries
            ))
            .await;
            log::warn!(
                "retrying {url} in {} (attempt {}/{})",
                humantime::format_duration(delay),
                attempts + 1,
                self.config.max_retries
            );

            tokio::time::sleep(delay).await;
        }
    }

    /// Pump inbound frames until the connection ends.
    ///
    /// Returns true for a clean close (close handshake observed), false for
    /// an unclean one (transport error or abrupt end of stream).
    async fn read_loop(&self, mut stream: SplitStream<WsStream>) -> bool {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => self.dispatch(text.as_str()).await,
                Ok(Message::Close(_)) => return true,
                Ok(_) => {}
                Err(e) => {
                    log::error!("websocket error: {e}");
                    self.set_error(
                        "Connection error occurred. Please check your network connection.",
                    )
                    .await;
                    return false;
                }
            }
        }
        false
    }

    /// Decode one frame, record it, and fan it out to the domain consumers.
    ///
    /// Malformed frames and unknown tags are skipped without touching the
    /// connection; handlers only mutate local state, in arrival order.
    async fn dispatch(&self, text: &str) {
        let envelope = match Envelope::decode(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::error!("failed to parse server frame: {e}");
                self.set_error("Failed to process server message.").await;
                return;
            }
        };

        self.history.lock().await.push(envelope.clone());

        let applied = match envelope.message_type() {
            Some(MessageType::ElementUpdate) => envelope
                .element()
                .map(|element| self.consumers.elements.apply_update(element)),
            Some(MessageType::ElementDelete) => {
                self.consumers.elements.apply_delete(&envelope.payload.id);
                Ok(())
            }
            Some(MessageType::RelationshipUpdate) => envelope
                .relationship()
                .map(|relationship| self.consumers.relationships.apply_update(relationship)),
            Some(MessageType::RelationshipDelete) => {
                self.consumers
                    .relationships
                    .apply_delete(&envelope.payload.id);
                Ok(())
            }
            Some(MessageType::ViewUpdate) => envelope.view_update_payload().map(|(view_type, state)| {
                self.consumers.views.apply_view_update(&view_type, state)
            }),
            None => {
                log::warn!("unknown message type: {}", envelope.kind);
                Ok(())
            }
        };

        if let Err(e) = applied {
            log::error!("failed to apply server message: {e}");
            self.set_error("Failed to process server message.").await;
        }
    }

    /// Drain the outbound queue over the live connection.
    ///
    /// Single-flight: concurrent triggers return immediately. Sends are
    /// strictly FIFO, one in flight, bounded by the per-message timeout
    /// and paced by the queue interval. A failed or timed-out send stops
    /// the pass and leaves the message at the head for the next one.
    async fn process_queue(self: Arc<Self>) {
        if self.queue_processing.swap(true, Ordering::SeqCst) {
            return;
        }

        while self.connected.load(Ordering::SeqCst) {
            let envelope = match self.queue.lock().await.front().cloned() {
                Some(envelope) => envelope,
                None => break,
            };

            let text = match envelope.encode() {
                Ok(text) => text,
                Err(e) => {
                    // Unencodable messages would wedge the head forever.
                    log::error!("dropping unencodable message: {e}");
                    self.queue.lock().await.pop_front();
                    continue;
                }
            };

            let result: Result<(), SyncError> = {
                let mut sink = self.sink.lock().await;
                match sink.as_mut() {
                    None => Err(SyncError::Closed),
                    Some(sink) => {
                        match timeout(self.config.send_timeout, sink.send(Message::text(text)))
                            .await
                        {
                            Ok(Ok(())) => Ok(()),
                            Ok(Err(e)) => Err(SyncError::Send(e.to_string())),
                            Err(_) => Err(SyncError::Timeout),
                        }
                    }
                }
            };

            match result {
                Ok(()) => {
                    self.queue.lock().await.pop_front();
                }
                // The connection went away between checks; resume later.
                Err(SyncError::Closed) => break,
                Err(e) => {
                    log::error!("{e}");
                    self.set_error("Failed to send message.").await;
                    break;
                }
            }

            tokio::time::sleep(self.config.queue_interval).await;
        }

        self.queue_processing.store(false, Ordering::SeqCst);
    }
}

/// Handle to the sync core for one client process.
///
/// Explicitly constructed and injectable; drop it (after `disconnect`) to
/// tear everything down. At most one live connection at a time, scoped to
/// the project passed to the most recent `connect`.
pub struct SyncClient {
    shared: Arc<Shared>,
    conn_task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncClient {
    pub fn new(config: SyncConfig, consumers: Consumers) -> Self {
        let shared = Shared {
            queue: Mutex::new(OutboundQueue::new(config.max_queue_size)),
            history: Mutex::new(MessageHistory::new(config.max_history)),
            retry_delay: Mutex::new(config.initial_retry_delay),
            config,
            consumers,
            state: RwLock::new(ConnectionState::Disconnected),
            connected: AtomicBool::new(false),
            last_error: RwLock::new(None),
            retry_count: AtomicU32::new(0),
            sink: Mutex::new(None),
            queue_processing: AtomicBool::new(false),
        };
        Self {
            shared: Arc::new(shared),
            conn_task: Mutex::new(None),
        }
    }

    /// Open (or reopen) the connection for a project.
    ///
    /// Idempotent re-entry: any live connection is closed first. Retry
    /// state is re-armed, so a `Failed` client can be revived here.
    pub async fn connect(&self, project_id: &str) {
        self.teardown().await;

        self.shared.retry_count.store(0, Ordering::SeqCst);
        *self.shared.retry_delay.lock().await = self.shared.config.initial_retry_delay;
        self.shared.set_state(ConnectionState::Connecting).await;

        let handle = tokio::spawn(Shared::connection_task(
            Arc::clone(&self.shared),
            project_id.to_string(),
        ));
        *self.conn_task.lock().await = Some(handle);
    }

    /// Force a clean close from any state.
    ///
    /// Cancels a pending retry, closes the socket with a normal-closure
    /// frame, and resets the retry state. The queue processor halts on its
    /// next connection check; queued messages are kept for the next
    /// `connect`.
    pub async fn disconnect(&self) {
        self.teardown().await;
        self.shared.set_state(ConnectionState::Disconnected).await;
        self.shared.retry_count.store(0, Ordering::SeqCst);
        *self.shared.retry_delay.lock().await = self.shared.config.initial_retry_delay;
        log::info!("disconnected");
    }

    async fn teardown(&self) {
        if let Some(handle) = self.conn_task.lock().await.take() {
            handle.abort();
        }
        self.shared.connected.store(false, Ordering::SeqCst);
        if let Some(mut sink) = self.shared.sink.lock().await.take() {
            let frame = CloseFrame {
                code: CloseCode::Normal,
                reason: "Normal closure".into(),
            };
            let _ = sink.send(Message::Close(Some(frame))).await;
        }
    }

    /// Queue an envelope for transmission.
    ///
    /// Drop-oldest backpressure at capacity; the eviction is a warning,
    /// never an error to the caller. Starts the processor when connected
    /// and idle.
    pub async fn enqueue(&self, envelope: Envelope) {
        let evicted = self.shared.queue.lock().await.push(envelope);
        if let Some(dropped) = evicted {
            log::warn!(
                "message queue full, dropping oldest message ({} for {})",
                dropped.kind,
                dropped.payload.id
            );
        }

        if self.shared.connected.load(Ordering::SeqCst) {
            Shared::trigger_queue_processor(&self.shared);
        }
    }

    pub async fn connection_state(&self) -> ConnectionState {
        *self.shared.state.read().await
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    pub async fn last_error(&self) -> Option<String> {
        self.shared.last_error.read().await.clone()
    }

    pub async fn reset_error(&self) {
        *self.shared.last_error.write().await = None;
    }

    pub fn retry_count(&self) -> u32 {
        self.shared.retry_count.load(Ordering::SeqCst)
    }

    pub async fn retry_delay(&self) -> Duration {
        *self.shared.retry_delay.lock().await
    }

    pub async fn queue_len(&self) -> usize {
        self.shared.queue.lock().await.len()
    }

    /// Recent inbound envelopes, oldest first.
    pub async fn history(&self) -> Vec<Envelope> {
        self.shared.history.lock().await.recent()
    }

    pub async fn clear_history(&self) {
        self.shared.history.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_model::{ElementStore, RelationshipStore, ViewStore};

    fn test_client(config: SyncConfig) -> SyncClient {
        let consumers = Consumers::from_stores(
            Arc::new(ElementStore::new()),
            Arc::new(RelationshipStore::new()),
            Arc::new(ViewStore::new()),
        );
        SyncClient::new(config, consumers)
    }

    fn envelope(id: usize) -> Envelope {
        Envelope::element_delete("proj-1", &format!("e-{id}"), "user-1")
    }

    #[tokio::test]
    async fn test_initial_state() {
        let client = test_client(SyncConfig::default());

        assert_eq!(
            client.connection_state().await,
            ConnectionState::Disconnected
        );
        assert!(!client.is_connected());
        assert_eq!(client.retry_count(), 0);
        assert_eq!(client.retry_delay().await, Duration::from_secs(1));
        assert_eq!(client.queue_len().await, 0);
        assert!(client.history().await.is_empty());
        assert!(client.last_error().await.is_none());
    }

    #[tokio::test]
    async fn test_enqueue_while_disconnected_buffers() {
        let client = test_client(SyncConfig::default());
        for i in 0..5 {
            client.enqueue(envelope(i)).await;
        }
        assert_eq!(client.queue_len().await, 5);
        // Nothing transmits without a connection.
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_enqueue_overflow_keeps_most_recent() {
        let config = SyncConfig {
            max_queue_size: 3,
            ..SyncConfig::default()
        };
        let client = test_client(config);
        for i in 0..5 {
            client.enqueue(envelope(i)).await;
        }

        assert_eq!(client.queue_len().await, 3);
        let head = client.shared.queue.lock().await.front().cloned().unwrap();
        assert_eq!(head.payload.id, "e-2");
    }

    #[tokio::test]
    async fn test_disconnect_from_idle_resets_state() {
        let client = test_client(SyncConfig::default());
        client.disconnect().await;

        assert_eq!(
            client.connection_state().await,
            ConnectionState::Disconnected
        );
        assert_eq!(client.retry_count(), 0);
        assert_eq!(client.retry_delay().await, Duration::from_secs(1));
    }

    #[test]
    fn test_next_retry_delay_doubles_and_caps() {
        let cap = Duration::from_secs(30);
        let mut delay = Duration::from_secs(1);
        let mut observed = Vec::new();
        for _ in 0..6 {
            delay = next_retry_delay(delay, cap);
            observed.push(delay.as_secs());
        }
        assert_eq!(observed, vec![2, 4, 8, 16, 30, 30]);
    }

    #[tokio::test]
    async fn test_reset_error() {
        let client = test_client(SyncConfig::default());
        client.shared.set_error("boom").await;
        assert_eq!(client.last_error().await.as_deref(), Some("boom"));

        client.reset_error().await;
        assert!(client.last_error().await.is_none());
    }
}
