use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time;
use tracing::{debug, info, warn};

use crate::connection::{Connection, REPLY_TIMEOUT};
use crate::frame::Frame;
use crate::Error;

/// Reply relayed to the client when a peer does not answer.
pub const TIMEOUT_REPLY: &[u8] = b"timeout";

#[derive(Default)]
struct Peer {
    connection: Option<Connection>,
    alive: bool,
}

/// One cached outbound connection per peer, dialed lazily and dropped on the first failure.
///
/// Each peer sits behind its own async mutex, so a forward and a heartbeat to the same peer take
/// turns while different peers proceed independently.
pub struct Peers {
    peers: HashMap<String, Arc<Mutex<Peer>>>,
}

impl Peers {
    pub fn new<I, S>(addresses: I) -> Peers
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let peers = addresses
            .into_iter()
            .map(|address| (address.into(), Arc::new(Mutex::new(Peer::default()))))
            .collect();

        Peers { peers }
    }

    /// Sends `frame` to `node` and returns its reply verbatim. Any failure, including no answer
    /// within [`REPLY_TIMEOUT`], yields the bulk `timeout`.
    pub async fn forward(&self, node: &str, frame: Frame) -> Frame {
        let Some(peer) = self.peers.get(node) else {
            warn!(node, "no connection slot for node");
            return Frame::Bulk(Bytes::from_static(TIMEOUT_REPLY));
        };

        let mut peer = peer.lock().await;
        match round_trip(&mut peer.connection, node, frame).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(node, "forward failed: {}", e);
                Frame::Bulk(Bytes::from_static(TIMEOUT_REPLY))
            }
        }
    }

    /// Pings every peer once, dialing the ones without a connection.
    pub async fn heartbeat(&self) {
        for (address, peer) in &self.peers {
            let mut peer = peer.lock().await;
            let ping = Frame::command(["ping"]);

            match round_trip(&mut peer.connection, address, ping).await {
                Ok(reply) => {
                    if !peer.alive {
                        info!(peer = %address, "peer is alive");
                    }
                    debug!(peer = %address, %reply, "heartbeat");
                    peer.alive = true;
                }
                Err(e) => {
                    if peer.alive {
                        warn!(peer = %address, "peer is dead: {}", e);
                    } else {
                        debug!(peer = %address, "peer is still unreachable: {}", e);
                    }
                    peer.alive = false;
                }
            }
        }
    }

    /// Drops every cached connection.
    pub async fn close(&self) {
        for peer in self.peers.values() {
            peer.lock().await.connection = None;
        }
    }

    #[cfg(test)]
    async fn is_alive(&self, address: &str) -> bool {
        match self.peers.get(address) {
            Some(peer) => peer.lock().await.alive,
            None => false,
        }
    }
}

/// Sends `frame` over the cached connection, dialing first when there is none. The connection is
/// put back only after a complete reply, so a failed exchange leaves the slot empty.
async fn round_trip(
    slot: &mut Option<Connection>,
    address: &str,
    frame: Frame,
) -> Result<Frame, Error> {
    let mut connection = match slot.take() {
        Some(connection) => connection,
        None => {
            let connection = time::timeout(REPLY_TIMEOUT, Connection::connect(address)).await??;
            debug!(peer = address, "dialed");
            connection
        }
    };

    let reply = connection.request(frame, REPLY_TIMEOUT).await?;
    *slot = Some(connection);
    Ok(reply)
}
