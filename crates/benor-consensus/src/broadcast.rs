//! Peer broadcast.
//!
//! A [`Broadcaster`] fans one vote out to every other node. Delivery is best
//! effort: a failure to reach one peer is swallowed, never retried, and never
//! stops delivery to the rest. An unreachable peer is therefore
//! indistinguishable from a faulty one, which the `N - F` quorum tolerates.
//!
//! [`LocalNetwork`] is an in-process implementation that delivers straight
//! into peer engines. It can cut individual nodes off to model message loss.

use crate::engine::ConsensusEngine;
use crate::message::VoteMessage;
use crate::value::NodeId;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

/// Best-effort fan-out of votes to all other peers.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Attempts delivery of `vote` to every peer except `vote.sender`,
    /// exactly once each.
    async fn broadcast(&self, vote: VoteMessage);
}

/// In-process network connecting engines by node id.
#[derive(Default)]
pub struct LocalNetwork {
    peers: RwLock<HashMap<NodeId, Weak<ConsensusEngine>>>,
    partitioned: RwLock<HashSet<NodeId>>,
}

impl LocalNetwork {
    /// Creates an empty network.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns a broadcaster that sends through this network.
    pub fn broadcaster(self: &Arc<Self>) -> Arc<dyn Broadcaster> {
        Arc::new(LocalBroadcaster {
            network: self.clone(),
        })
    }

    /// Attaches an engine under its node id.
    pub fn register(&self, engine: &Arc<ConsensusEngine>) {
        self.peers
            .write()
            .insert(engine.node_id(), Arc::downgrade(engine));
    }

    /// Drops every message to or from `node` until [`LocalNetwork::heal`].
    pub fn partition(&self, node: NodeId) {
        self.partitioned.write().insert(node);
    }

    /// Reconnects a partitioned node.
    pub fn heal(&self, node: NodeId) {
        self.partitioned.write().remove(&node);
    }

    fn is_partitioned(&self, node: NodeId) -> bool {
        self.partitioned.read().contains(&node)
    }

    fn deliver(&self, vote: VoteMessage) {
        if self.is_partitioned(vote.sender) {
            return;
        }

        let targets: Vec<_> = self
            .peers
            .read()
            .iter()
            .filter(|(id, _)| **id != vote.sender)
            .map(|(id, peer)| (*id, peer.clone()))
            .collect();

        for (id, peer) in targets {
            if self.is_partitioned(id) {
                continue;
            }
            match peer.upgrade() {
                Some(engine) => {
                    engine.receive(vote);
                }
                None => tracing::debug!(peer = id, "peer gone, dropping vote"),
            }
        }
    }
}

struct LocalBroadcaster {
    network: Arc<LocalNetwork>,
}

#[async_trait]
impl Broadcaster for LocalBroadcaster {
    async fn broadcast(&self, vote: VoteMessage) {
        self.network.deliver(vote);
        // Give intake on other engines a chance to run between phases.
        tokio::task::yield_now().await;
    }
}
