//! Vote messages exchanged between nodes.
//!
//! Every inbound payload is decoded into the strict [`VoteMessage`] shape
//! before it reaches the ledger. Payloads that fail decoding are dropped by
//! the caller; they never produce an error for the sender.

use crate::error::Result;
use crate::value::{NodeId, Phase, Value};
use serde::{Deserialize, Serialize};

/// A single vote: `sender` votes `value` in `phase` of `round`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteMessage {
    /// Round number, starting at 1.
    pub round: u64,

    /// Phase within the round.
    pub phase: Phase,

    /// Index of the voting node.
    pub sender: NodeId,

    /// The vote itself.
    pub value: Value,
}

impl VoteMessage {
    /// Creates a new vote message.
    pub fn new(round: u64, phase: Phase, sender: NodeId, value: Value) -> Self {
        Self {
            round,
            phase,
            sender,
            value,
        }
    }

    /// Encodes the message to JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a message from JSON bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
