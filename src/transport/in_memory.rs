use tokio::sync::mpsc;

use crate::protocol::Message;
use crate::transport::{MessageSink, MessageStream, Transport};

/// In-process message channel for tests: two paired transports wired
/// crosswise over unbounded queues.
pub struct InMemoryTransport {
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl InMemoryTransport {
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            Self { tx: a_tx, rx: b_rx },
            Self { tx: b_tx, rx: a_rx },
        )
    }
}

impl Transport for InMemoryTransport {
    fn into_split(self: Box<Self>) -> (Box<dyn MessageSink>, Box<dyn MessageStream>) {
        (
            Box::new(InMemorySink { tx: self.tx }),
            Box::new(InMemoryStream { rx: self.rx }),
        )
    }
}

pub struct InMemorySink {
    tx: mpsc::UnboundedSender<Message>,
}

pub struct InMemoryStream {
    rx: mpsc::UnboundedReceiver<Message>,
}

#[async_trait::async_trait]
impl MessageSink for InMemorySink {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        self.tx
            .send(msg)
            .map_err(|_| anyhow::anyhow!("Channel closed"))
    }
}

#[async_trait::async_trait]
impl MessageStream for InMemoryStream {
    async fn recv(&mut self) -> anyhow::Result<Message> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Channel closed"))
    }
}
