use super::{BusError, MessageBus};
use crate::types::Message;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Default size of the broadcast buffer. Slow subscribers lag past this.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process bus backed by a tokio broadcast channel
#[derive(Clone)]
pub struct LocalBus {
    tx: broadcast::Sender<Message>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for LocalBus {
    async fn emit(&self, message: Message) -> Result<(), BusError> {
        // No subscribers is not an error, nobody was listening for it.
        let _ = self.tx.send(message);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.tx.subscribe()
    }
}
