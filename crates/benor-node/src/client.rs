//! Client for driving nodes over their HTTP API.

use crate::config::NodeConfig;
use crate::error::Result;
use benor_consensus::{NodeId, NodeState, NodeStatus};
use reqwest::{Client, StatusCode};

/// HTTP client addressing the nodes of one network by id.
#[derive(Clone)]
pub struct NodeClient {
    client: Client,
    config: NodeConfig,
}

impl NodeClient {
    /// Creates a client for the nodes described by `config`.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent("benor-node")
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self { client, config })
    }

    async fn get(&self, node_id: NodeId, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{path}", self.config.url_for(node_id));
        Ok(self.client.get(&url).send().await?)
    }

    /// Queries `/status`.
    pub async fn status(&self, node_id: NodeId) -> Result<NodeStatus> {
        let response = self.get(node_id, "/status").await?;
        if response.status() == StatusCode::INTERNAL_SERVER_ERROR {
            return Ok(NodeStatus::Faulty);
        }
        response.error_for_status()?;
        Ok(NodeStatus::Live)
    }

    /// Queries `/getState`.
    pub async fn state(&self, node_id: NodeId) -> Result<NodeState> {
        let response = self.get(node_id, "/getState").await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Sends `/start`.
    pub async fn start(&self, node_id: NodeId) -> Result<()> {
        self.get(node_id, "/start").await?.error_for_status()?;
        Ok(())
    }

    /// Sends `/stop`.
    pub async fn stop(&self, node_id: NodeId) -> Result<()> {
        self.get(node_id, "/stop").await?.error_for_status()?;
        Ok(())
    }

    /// Starts every node.
    pub async fn start_all(&self) -> Result<()> {
        for node_id in 0..self.config.n {
            self.start(node_id).await?;
        }
        Ok(())
    }

    /// Stops every node.
    pub async fn stop_all(&self) -> Result<()> {
        for node_id in 0..self.config.n {
            self.stop(node_id).await?;
        }
        Ok(())
    }

    /// Queries the state of every node, in id order.
    pub async fn states(&self) -> Result<Vec<NodeState>> {
        let mut states = Vec::with_capacity(self.config.n);
        for node_id in 0..self.config.n {
            states.push(self.state(node_id).await?);
        }
        Ok(states)
    }
}
