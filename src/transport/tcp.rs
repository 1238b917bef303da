use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::protocol::Message;
use crate::transport::{MessageSink, MessageStream, Transport};

/// Maximum frame size (1 MB) to prevent excessive memory allocation.
const MAX_MESSAGE_SIZE: u32 = 1_000_000;

/// TCP message channel carrying length-prefixed bincode frames.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }
}

impl Transport for TcpTransport {
    fn into_split(self: Box<Self>) -> (Box<dyn MessageSink>, Box<dyn MessageStream>) {
        let (read, write) = self.stream.into_split();
        (Box::new(TcpSink { write }), Box::new(TcpStreamHalf { read }))
    }
}

pub struct TcpSink {
    write: OwnedWriteHalf,
}

pub struct TcpStreamHalf {
    read: OwnedReadHalf,
}

#[async_trait::async_trait]
impl MessageSink for TcpSink {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        let data =
            bincode::serialize(&msg).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;
        if data.len() as u32 > MAX_MESSAGE_SIZE {
            return Err(anyhow::anyhow!(
                "Message too large: {} bytes (max: {})",
                data.len(),
                MAX_MESSAGE_SIZE
            ));
        }
        let len = (data.len() as u32).to_be_bytes();
        self.write.write_all(&len).await.map_err(write_error)?;
        self.write.write_all(&data).await.map_err(write_error)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl MessageStream for TcpStreamHalf {
    async fn recv(&mut self) -> anyhow::Result<Message> {
        let mut len_buf = [0u8; 4];
        self.read.read_exact(&mut len_buf).await.map_err(read_error)?;
        let len = u32::from_be_bytes(len_buf);

        // Bounded read length check to prevent excessive memory allocation.
        if len > MAX_MESSAGE_SIZE {
            return Err(anyhow::anyhow!(
                "Message too large: {} bytes (max: {})",
                len,
                MAX_MESSAGE_SIZE
            ));
        }
        if len == 0 {
            return Err(anyhow::anyhow!("Invalid message length: 0"));
        }

        let mut buf = vec![0u8; len as usize];
        self.read.read_exact(&mut buf).await.map_err(read_error)?;
        bincode::deserialize(&buf).map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))
    }
}

fn write_error(e: std::io::Error) -> anyhow::Error {
    if e.kind() == std::io::ErrorKind::BrokenPipe
        || e.kind() == std::io::ErrorKind::ConnectionReset
    {
        anyhow::anyhow!("Connection closed by peer")
    } else {
        anyhow::anyhow!("Write error: {}", e)
    }
}

fn read_error(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof => anyhow::anyhow!("Connection closed by peer"),
        std::io::ErrorKind::ConnectionReset => anyhow::anyhow!("Connection reset by peer"),
        _ => anyhow::anyhow!("Read error: {}", e),
    }
}
