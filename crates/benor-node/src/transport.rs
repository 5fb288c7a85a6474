//! HTTP vote broadcast.
//!
//! Each vote is POSTed to `/message` on every other node concurrently.
//! Failed deliveries are logged and forgotten.

use crate::config::NodeConfig;
use crate::error::Result;
use async_trait::async_trait;
use benor_consensus::{Broadcaster, NodeId, VoteMessage};
use futures::future::join_all;
use reqwest::Client;

/// Broadcaster that delivers votes over HTTP.
pub struct HttpBroadcaster {
    client: Client,
    peers: Vec<(NodeId, String)>,
}

impl HttpBroadcaster {
    /// Creates a broadcaster for node `node_id` targeting every other node
    /// of `config`.
    pub fn new(config: &NodeConfig, node_id: NodeId) -> Result<Self> {
        let client = Client::builder()
            .user_agent("benor-node")
            .timeout(config.request_timeout())
            .build()?;

        let peers = (0..config.n)
            .filter(|peer| *peer != node_id)
            .map(|peer| (peer, format!("{}/message", config.url_for(peer))))
            .collect();

        Ok(Self { client, peers })
    }

    /// Node ids this broadcaster delivers to.
    pub fn peers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.peers.iter().map(|(peer, _)| *peer)
    }

    async fn send(&self, url: &str, vote: &VoteMessage) -> reqwest::Result<()> {
        self.client
            .post(url)
            .json(vote)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Broadcaster for HttpBroadcaster {
    async fn broadcast(&self, vote: VoteMessage) {
        let deliveries = self
            .peers
            .iter()
            .filter(|(peer, _)| *peer != vote.sender)
            .map(|(peer, url)| {
                let vote = &vote;
                async move {
                    if let Err(e) = self.send(url, vote).await {
                        tracing::debug!(
                            peer = *peer,
                            round = vote.round,
                            phase = %vote.phase,
                            error = %e,
                            "vote delivery failed"
                        );
                    }
                }
            });

        join_all(deliveries).await;
    }
}
