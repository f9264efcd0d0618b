use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time;
use tokio_util::codec::Framed;
use uuid::Uuid;

use crate::codec::{FrameCodec, Payload};
use crate::frame::Frame;
use crate::Error;

/// How long a request waits for its reply before the peer is considered unresponsive.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(3);

/// A TCP stream speaking frames in both directions. Used for accepted clients as well as for the
/// outbound connections a node keeps to its peers.
pub struct Connection {
    pub id: Uuid,
    pub address: SocketAddr,
    framed: Framed<TcpStream, FrameCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream, address: SocketAddr) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            address,
            framed: Framed::new(stream, FrameCodec::new()),
        }
    }

    pub async fn connect(address: &str) -> Result<Connection, Error> {
        let stream = TcpStream::connect(address).await?;
        let address = stream.peer_addr()?;
        Ok(Connection::new(stream, address))
    }

    /// Next decoded payload, or `None` once the peer closed the connection.
    pub async fn read_payload(&mut self) -> Result<Option<Payload>, Error> {
        Ok(self.framed.next().await.transpose()?)
    }

    pub async fn write_frame(&mut self, frame: Frame) -> Result<(), Error> {
        self.framed.send(frame).await?;
        Ok(())
    }

    /// Sends `frame` and waits at most `timeout` for the single reply that answers it.
    pub async fn request(&mut self, frame: Frame, timeout: Duration) -> Result<Frame, Error> {
        self.write_frame(frame).await?;
        self.read_reply_with_timeout(timeout).await
    }

    pub async fn read_reply_with_timeout(&mut self, timeout: Duration) -> Result<Frame, Error> {
        match time::timeout(timeout, self.framed.next()).await? {
            Some(Ok(Ok(frame))) => Ok(frame),
            Some(Ok(Err(err))) => Err(err.into()),
            Some(Err(err)) => Err(err.into()),
            None => Err("connection closed".into()),
        }
    }
}
