//! OVOS messagebus client
//!
//! A background task owns the websocket. It forwards inbound text frames to
//! subscribers and writes queued outbound messages. When the connection drops
//! it reconnects on a fixed interval; messages emitted in the meantime wait in
//! the outbound queue.

use super::{BusError, MessageBus};
use crate::types::Message;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message as Frame};

/// Outbound queue size; `emit` waits when it is full
const OUTBOUND_CAPACITY: usize = 1024;
/// Inbound broadcast buffer
const INBOUND_CAPACITY: usize = 1024;

/// Websocket connection to an OVOS messagebus with automatic reconnection
pub struct WebsocketBus {
    url: String,
    inbound: broadcast::Sender<Message>,
    outbound: mpsc::Sender<Message>,
    connected: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl WebsocketBus {
    /// Start the connection task and wait until the first connection succeeds
    ///
    /// Failed attempts are retried every `reconnect_interval`, so this only
    /// returns an error if the connection task itself goes away.
    pub async fn connect(url: impl Into<String>, reconnect_interval: Duration) -> Result<Self, BusError> {
        let bus = Self::spawn(url, reconnect_interval);
        let mut connected = bus.connected.clone();
        connected
            .wait_for(|up| *up)
            .await
            .map_err(|_| BusError::Connect {
                url: bus.url.clone(),
                reason: "connection task stopped".to_string(),
            })?;
        Ok(bus)
    }

    /// Start the connection task without waiting for it to connect
    pub fn spawn(url: impl Into<String>, reconnect_interval: Duration) -> Self {
        let url = url.into();
        let (inbound, _) = broadcast::channel(INBOUND_CAPACITY);
        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (connected_tx, connected) = watch::channel(false);

        let task = tokio::spawn(run_connection(
            url.clone(),
            reconnect_interval,
            inbound.clone(),
            outbound_rx,
            connected_tx,
        ));

        Self {
            url,
            inbound,
            outbound,
            connected,
            task,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }
}

impl Drop for WebsocketBus {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[async_trait]
impl MessageBus for WebsocketBus {
    async fn emit(&self, message: Message) -> Result<(), BusError> {
        self.outbound.send(message).await.map_err(|_| BusError::Closed)
    }

    fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.inbound.subscribe()
    }
}

/// Why a single connection ended
enum Disconnect {
    /// Remote closed or the socket failed; reconnect
    Lost,
    /// The bus handle was dropped; stop for good
    Shutdown,
}

async fn run_connection(
    url: String,
    reconnect_interval: Duration,
    inbound: broadcast::Sender<Message>,
    mut outbound: mpsc::Receiver<Message>,
    connected: watch::Sender<bool>,
) {
    // A message whose write failed is retried first on the next connection.
    let mut unsent: Option<Message> = None;

    loop {
        match connect_async(url.as_str()).await {
            Ok((socket, _response)) => {
                tracing::info!("Connected to messagebus at {}", url);
                connected.send_replace(true);

                let (mut write, mut read) = socket.split();
                let outcome = 'conn: {
                    if let Some(message) = unsent.take() {
                        if let Err(message) = write_message(&mut write, message).await {
                            unsent = Some(message);
                            break 'conn Disconnect::Lost;
                        }
                    }

                    loop {
                        tokio::select! {
                            frame = read.next() => match frame {
                                Some(Ok(Frame::Text(text))) => match text.parse::<Message>() {
                                    Ok(message) => {
                                        let _ = inbound.send(message);
                                    }
                                    Err(e) => tracing::debug!("Skipping malformed bus frame: {}", e),
                                },
                                Some(Ok(Frame::Close(_))) | None => break 'conn Disconnect::Lost,
                                Some(Ok(_)) => {}
                                Some(Err(e)) => {
                                    tracing::warn!("Messagebus read error: {}", e);
                                    break 'conn Disconnect::Lost;
                                }
                            },
                            outgoing = outbound.recv() => match outgoing {
                                Some(message) => {
                                    if let Err(message) = write_message(&mut write, message).await {
                                        unsent = Some(message);
                                        break 'conn Disconnect::Lost;
                                    }
                                }
                                None => {
                                    let _ = write.close().await;
                                    break 'conn Disconnect::Shutdown;
                                }
                            },
                        }
                    }
                };

                connected.send_replace(false);
                match outcome {
                    Disconnect::Shutdown => return,
                    Disconnect::Lost => tracing::warn!("Lost messagebus connection, reconnecting"),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to connect to messagebus at {}: {}", url, e);
            }
        }

        tokio::time::sleep(reconnect_interval).await;
    }
}

/// Write one message; hands it back on failure so it can be retried
async fn write_message<S>(write: &mut S, message: Message) -> Result<(), Message>
where
    S: futures_util::Sink<Frame> + Unpin,
    S::Error: std::fmt::Display,
{
    let text = match message.to_json() {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Dropping unencodable message {}: {}", message, e);
            return Ok(());
        }
    };
    tracing::debug!("bus <- {}", message);
    match write.send(Frame::Text(text)).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::warn!("Messagebus write error: {}", e);
            Err(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_starts_disconnected() {
        // Port 9 (discard) on loopback is not a websocket server.
        let bus = WebsocketBus::spawn("ws://127.0.0.1:9/core", Duration::from_millis(50));
        assert_eq!(bus.url(), "ws://127.0.0.1:9/core");
        assert!(!bus.is_connected());
    }

    #[tokio::test]
    async fn test_emit_queues_while_disconnected() {
        let bus = WebsocketBus::spawn("ws://127.0.0.1:9/core", Duration::from_millis(50));
        let result = tokio::time::timeout(
            Duration::from_millis(200),
            bus.emit(Message::new("ovos.PHAL.dashboard.get.status")),
        )
        .await;
        assert!(matches!(result, Ok(Ok(()))));
    }
}
