//! Node configuration types.
//!
//! Every node of a network shares one [`NodeConfig`]. Node `i` listens on
//! `host:(base_port + i)`.

use crate::error::{NodeError, Result};
use benor_consensus::{Coin, EngineConfig, NodeId, RandomCoin};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Port of node 0 unless configured otherwise.
pub const BASE_NODE_PORT: u16 = 3000;

/// Configuration shared by the nodes of one network.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Host every node binds to and is reached at.
    pub host: String,
    /// Port of node 0.
    pub base_port: u16,
    /// Number of nodes.
    pub n: usize,
    /// Number of faulty nodes tolerated.
    pub f: usize,
    /// Fallback re-check interval while waiting for votes.
    pub poll_interval_ms: u64,
    /// Timeout for a single peer request.
    pub request_timeout_ms: u64,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (pretty or json).
    pub log_format: String,
    /// Seed for the coin; node `i` uses `seed + i`. Entropy when unset.
    pub seed: Option<u64>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            base_port: BASE_NODE_PORT,
            n: 4,
            f: 1,
            poll_interval_ms: 5,
            request_timeout_ms: 1000,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            seed: None,
        }
    }
}

impl NodeConfig {
    /// Creates a configuration for `n` nodes tolerating `f` faults.
    pub fn new(n: usize, f: usize) -> Self {
        Self {
            n,
            f,
            ..Default::default()
        }
    }

    /// Sets the base port.
    pub fn with_base_port(mut self, base_port: u16) -> Self {
        self.base_port = base_port;
        self
    }

    /// Sets the coin seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Loads a configuration from a YAML file.
    pub fn load_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| NodeError::Config(format!("failed to read file: {}", e)))?;

        let config: NodeConfig =
            serde_yaml::from_str(&content).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.n == 0 {
            return Err(NodeError::Config("n must be at least 1".into()));
        }
        if self.f >= self.n {
            return Err(NodeError::Config(format!(
                "f ({}) must be smaller than n ({})",
                self.f, self.n
            )));
        }
        if self.base_port as usize + self.n - 1 > u16::MAX as usize {
            return Err(NodeError::Config(format!(
                "ports {}..{} exceed the port range",
                self.base_port,
                self.base_port as usize + self.n
            )));
        }
        if self.host.is_empty() {
            return Err(NodeError::Config("host is empty".into()));
        }
        Ok(())
    }

    /// Port of node `node_id`.
    pub fn port_for(&self, node_id: NodeId) -> u16 {
        self.base_port.saturating_add(node_id as u16)
    }

    /// `host:port` of node `node_id`.
    pub fn addr_for(&self, node_id: NodeId) -> String {
        format!("{}:{}", self.host, self.port_for(node_id))
    }

    /// Base URL of node `node_id`.
    pub fn url_for(&self, node_id: NodeId) -> String {
        format!("http://{}", self.addr_for(node_id))
    }

    /// Timeout for one peer request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Engine configuration for node `node_id`.
    pub fn engine_config(&self, node_id: NodeId) -> EngineConfig {
        EngineConfig::new(node_id, self.n, self.f)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
    }

    /// Coin for node `node_id`.
    pub fn coin_for(&self, node_id: NodeId) -> Arc<dyn Coin> {
        match self.seed {
            Some(seed) => Arc::new(RandomCoin::from_seed(seed.wrapping_add(node_id as u64))),
            None => Arc::new(RandomCoin::from_entropy()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.addr_for(2), "127.0.0.1:3002");
        assert_eq!(config.url_for(0), "http://127.0.0.1:3000");
    }

    #[test]
    fn test_validation_errors() {
        assert!(NodeConfig::new(0, 0).validate().is_err());
        assert!(NodeConfig::new(3, 3).validate().is_err());
        assert!(NodeConfig::new(4, 1)
            .with_base_port(u16::MAX - 1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_engine_config() {
        let config = NodeConfig::new(5, 2);
        let engine = config.engine_config(3);

        assert_eq!(engine.node_id, 3);
        assert_eq!(engine.quorum(), 3);
        assert_eq!(engine.poll_interval, Duration::from_millis(5));
    }

    #[test]
    fn test_load_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "n: 7\nf: 2\nbase_port: 4100\nseed: 9").unwrap();

        let config = NodeConfig::load_yaml(file.path()).unwrap();
        assert_eq!(config.n, 7);
        assert_eq!(config.f, 2);
        assert_eq!(config.base_port, 4100);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_load_yaml_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "n: 2\nf: 2").unwrap();

        assert!(matches!(
            NodeConfig::load_yaml(file.path()),
            Err(NodeError::Config(msg)) if msg.contains("smaller than n")
        ));
    }
}
