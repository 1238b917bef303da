use crate::protocol::Message;

/// Outbound half of a message channel.
#[async_trait::async_trait]
pub trait MessageSink: Send {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()>;
}

/// Inbound half of a message channel. `recv` errors when the peer is lost.
#[async_trait::async_trait]
pub trait MessageStream: Send {
    async fn recv(&mut self) -> anyhow::Result<Message>;
}

/// A bidirectional message channel to one peer. The server splits each
/// connection so a writer task can push notifications while the connection
/// worker blocks on the next inbound message.
pub trait Transport: Send {
    fn into_split(self: Box<Self>) -> (Box<dyn MessageSink>, Box<dyn MessageStream>);
}

pub mod in_memory;
pub mod tcp;
