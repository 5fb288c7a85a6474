//! Node error types.

use benor_consensus::ConsensusError;
use thiserror::Error;

/// Errors raised around the engine: configuration, sockets and HTTP.
///
/// None of these originate in the consensus core, which never fails on
/// peer input.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Engine rejected its parameters.
    #[error("consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    /// The node endpoint could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address we tried to bind.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// Other socket or file error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request to a node failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Nodes did not reach the expected state in time.
    #[error("timed out: {0}")]
    Timeout(String),
}

/// A specialized Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;
