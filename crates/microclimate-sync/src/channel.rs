//! Reconnecting live channel.
//!
//! A receive-only WebSocket connection that decodes tagged update
//! messages and retries forever on a fixed delay. The run loop is an
//! owned task with its own cancellation token; `disconnect` cancels it
//! and suppresses the pending reconnect.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::types::ChannelMessage;

/// Connection lifecycle: Disconnected -> Connecting -> Connected -> ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ChannelState {
    /// True if the channel is live and receiving.
    pub fn is_connected(self) -> bool {
        matches!(self, ChannelState::Connected)
    }
}

/// Cheap cloneable probe of the channel state, for health checks that
/// outlive a borrow of the channel itself.
#[derive(Clone)]
pub struct ChannelStateHandle(Arc<Mutex<ChannelState>>);

impl ChannelStateHandle {
    pub fn get(&self) -> ChannelState {
        *self.0.lock()
    }
}

/// Channel settings.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// WebSocket URL of the live endpoint.
    pub url: String,
    /// Fixed delay before each reconnect attempt.
    pub retry_delay: Duration,
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            retry_delay: Duration::from_secs(5),
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

struct RunHandle {
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

/// A reconnecting receive-only message channel.
///
/// Decoded messages are emitted on the sender supplied at
/// construction; the engine applies them to its owned state.
pub struct SyncChannel {
    config: ChannelConfig,
    state: Arc<Mutex<ChannelState>>,
    messages: mpsc::UnboundedSender<ChannelMessage>,
    run: Mutex<Option<RunHandle>>,
}

impl SyncChannel {
    pub fn new(config: ChannelConfig, messages: mpsc::UnboundedSender<ChannelMessage>) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(ChannelState::Disconnected)),
            messages,
            run: Mutex::new(None),
        }
    }

    /// Open the channel. No-op while a run loop is already live, so at
    /// most one channel exists at a time.
    pub fn connect(&self) {
        let mut run = self.run.lock();
        if let Some(handle) = run.as_ref() {
            if !handle.task.is_finished() {
                debug!("channel already connecting or connected");
                return;
            }
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_loop(
            self.config.clone(),
            self.state.clone(),
            self.messages.clone(),
            cancel.clone(),
        ));
        *run = Some(RunHandle { task, cancel });
    }

    /// Close the channel and suppress any pending reconnect. Idempotent.
    pub async fn disconnect(&self) {
        let handle = self.run.lock().take();
        if let Some(RunHandle { task, cancel }) = handle {
            cancel.cancel();
            let _ = task.await;
        }
        *self.state.lock() = ChannelState::Disconnected;
    }

    pub fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    pub fn state_handle(&self) -> ChannelStateHandle {
        ChannelStateHandle(self.state.clone())
    }
}

async fn run_loop(
    config: ChannelConfig,
    state: Arc<Mutex<ChannelState>>,
    messages: mpsc::UnboundedSender<ChannelMessage>,
    cancel: CancellationToken,
) {
    loop {
        *state.lock() = ChannelState::Connecting;

        let connecting = tokio_tungstenite::connect_async(config.url.as_str());
        tokio::select! {
            _ = cancel.cancelled() => {
                *state.lock() = ChannelState::Disconnected;
                return;
            }
            result = connecting => match result {
                Ok((stream, _)) => {
                    *state.lock() = ChannelState::Connected;
                    info!(url = %config.url, "live channel connected");
                    read_messages(stream, &messages, &cancel).await;
                }
                Err(e) => {
                    warn!(url = %config.url, "live channel connect failed: {}", e);
                }
            }
        }

        *state.lock() = ChannelState::Disconnected;

        if cancel.is_cancelled() {
            return;
        }

        debug!("reconnecting live channel in {:?}", config.retry_delay);
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.retry_delay) => {}
        }
    }
}

/// Receive frames until the remote closes, the transport fails, or the
/// channel is cancelled. Malformed frames are dropped, never fatal.
async fn read_messages(
    mut stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    messages: &mpsc::UnboundedSender<ChannelMessage>,
    cancel: &CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = stream.close(None).await;
                return;
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ChannelMessage>(&text) {
                        Ok(msg) => {
                            if messages.send(msg).is_err() {
                                // Receiver gone; the engine is shutting down.
                                return;
                            }
                        }
                        Err(e) => debug!("dropping malformed channel message: {}", e),
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if stream.send(Message::Pong(data)).await.is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("live channel closed by remote");
                    return;
                }
                Some(Ok(_)) => {
                    // Binary and pong frames carry nothing for us.
                }
                Some(Err(e)) => {
                    warn!("live channel transport error: {}", e);
                    return;
                }
            }
        }
    }
}
