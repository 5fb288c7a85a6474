//! Consensus error types.

use thiserror::Error;

/// Errors that can occur while configuring the engine or decoding votes.
///
/// The round driver itself never fails: late, duplicate or malformed input is
/// either ignored or advanced past. These errors only surface at the edges.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// Engine parameters violate `F < N` or `node_id < N`.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Inbound vote could not be decoded into the strict vote shape.
    #[error("invalid vote: {0}")]
    InvalidVote(String),

    /// Payload was not valid JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized Result type for consensus operations.
pub type Result<T> = std::result::Result<T, ConsensusError>;
