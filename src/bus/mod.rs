//! Messagebus transports
//!
//! The plexus only needs two things from a bus: a way to emit a message and a
//! way to receive everything that is published. [`LocalBus`] does this in
//! process, [`WebsocketBus`] speaks to an OVOS messagebus server.

mod local;
mod websocket;

pub use local::LocalBus;
pub use websocket::WebsocketBus;

use crate::types::Message;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

/// Error type for bus operations
#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus is closed")]
    Closed,

    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A publish/subscribe message bus
#[async_trait]
pub trait MessageBus: Send + Sync + 'static {
    /// Publish a message to every listener on the bus
    async fn emit(&self, message: Message) -> Result<(), BusError>;

    /// Receive every message published after this call
    fn subscribe(&self) -> broadcast::Receiver<Message>;
}
