//! Cluster mode: every node knows the full node set, hashes each command's key onto a
//! consistent-hash ring and forwards commands owned by another node over a cached connection.
//! There is no rebalancing: while a node is down, its keys answer `timeout`.

pub mod peers;
pub mod ring;

use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::frame::Frame;
use peers::Peers;
use ring::HashRing;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(3);

pub struct Cluster {
    id: String,
    ring: HashRing,
    peers: Peers,
}

impl Cluster {
    /// `id` is this node's own address, `peers` the addresses of every other node.
    pub fn new(id: String, peers: Vec<String>) -> Cluster {
        let mut ring = HashRing::new();
        ring.add_node(&id);
        ring.add_nodes(&peers);

        Cluster {
            id,
            ring,
            peers: Peers::new(peers),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The node that owns `key`, or `None` when it is this node.
    pub fn owner(&self, key: &str) -> Option<&str> {
        match self.ring.pick_node(key) {
            Some(node) if node != self.id => Some(node),
            _ => None,
        }
    }

    pub async fn forward(&self, node: &str, frame: Frame) -> Frame {
        debug!(node, %frame, "forwarding");
        self.peers.forward(node, frame).await
    }

    /// Pings every peer each [`HEARTBEAT_INTERVAL`] until `shutdown` is cancelled.
    pub async fn heartbeat(&self, shutdown: CancellationToken) {
        let mut interval = time::interval(HEARTBEAT_INTERVAL);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => self.peers.heartbeat().await,
            }
        }

        info!("heartbeat stopped");
    }

    pub async fn close(&self) {
        self.peers.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_none_for_local_keys() {
        let cluster = Cluster::new(
            "127.0.0.1:7001".to_string(),
            vec!["127.0.0.1:7002".to_string(), "127.0.0.1:7003".to_string()],
        );

        let mut local = 0;
        let mut remote = 0;
        for i in 0..300 {
            match cluster.owner(&format!("key:{}", i)) {
                None => local += 1,
                Some(node) => {
                    assert_ne!(node, cluster.id());
                    remote += 1;
                }
            }
        }

        assert!(local > 0);
        assert!(remote > 0);
    }

    #[test]
    fn lone_node_owns_everything() {
        let cluster = Cluster::new("127.0.0.1:7001".to_string(), vec![]);

        assert_eq!(cluster.owner("a"), None);
        assert_eq!(cluster.owner("{tag}b"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_stops_on_shutdown() {
        let cluster = Cluster::new("127.0.0.1:7001".to_string(), vec![]);
        let shutdown = CancellationToken::new();

        shutdown.cancel();
        cluster.heartbeat(shutdown).await;
    }
}
