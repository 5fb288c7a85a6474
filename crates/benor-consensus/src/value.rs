//! Vote values and phases.
//!
//! On the wire a [`Value`] is the JSON number `0`, the number `1`, or the
//! string `"?"`. A [`Phase`] is the number `1` or `2`. Anything else fails to
//! decode.

use crate::error::ConsensusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node in `[0, N)`.
pub type NodeId = usize;

/// A binary consensus value, or the "no majority" marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    /// The value `0`.
    Zero,
    /// The value `1`.
    One,
    /// No majority was observed in phase 1. Distinct from a missing vote.
    Undecided,
}

impl Value {
    /// All three values, in tally order.
    pub const ALL: [Value; 3] = [Value::Zero, Value::One, Value::Undecided];

    /// Returns true for `Zero` and `One`.
    pub fn is_binary(self) -> bool {
        !matches!(self, Value::Undecided)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Zero => write!(f, "0"),
            Value::One => write!(f, "1"),
            Value::Undecided => write!(f, "?"),
        }
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = ConsensusError;

    fn try_from(raw: serde_json::Value) -> Result<Self, Self::Error> {
        match &raw {
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(Value::Zero),
                Some(1) => Ok(Value::One),
                _ => Err(ConsensusError::InvalidVote(format!("unknown value {raw}"))),
            },
            serde_json::Value::String(s) if s == "?" => Ok(Value::Undecided),
            _ => Err(ConsensusError::InvalidVote(format!("unknown value {raw}"))),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Zero => serde_json::Value::from(0),
            Value::One => serde_json::Value::from(1),
            Value::Undecided => serde_json::Value::from("?"),
        }
    }
}

impl std::str::FromStr for Value {
    type Err = ConsensusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Value::Zero),
            "1" => Ok(Value::One),
            "?" => Ok(Value::Undecided),
            other => Err(ConsensusError::InvalidVote(format!("unknown value {other:?}"))),
        }
    }
}

/// Sub-step of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Phase {
    /// Establishes a tentative majority value.
    One,
    /// Tries to turn the tentative value into a decision.
    Two,
}

impl TryFrom<u8> for Phase {
    type Error = ConsensusError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(Phase::One),
            2 => Ok(Phase::Two),
            other => Err(ConsensusError::InvalidVote(format!("unknown phase {other}"))),
        }
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::One => 1,
            Phase::Two => 2,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_wire_format() {
        assert_eq!(serde_json::to_value(Value::Zero).unwrap(), json!(0));
        assert_eq!(serde_json::to_value(Value::One).unwrap(), json!(1));
        assert_eq!(serde_json::to_value(Value::Undecided).unwrap(), json!("?"));
    }

    #[test]
    fn test_value_rejects_unknown() {
        assert!(serde_json::from_value::<Value>(json!(2)).is_err());
        assert!(serde_json::from_value::<Value>(json!("0")).is_err());
        assert!(serde_json::from_value::<Value>(json!(null)).is_err());
        assert!(serde_json::from_value::<Value>(json!(-1)).is_err());
        assert!(serde_json::from_value::<Value>(json!(0.5)).is_err());
    }

    #[test]
    fn test_value_from_str() {
        assert_eq!("0".parse::<Value>().unwrap(), Value::Zero);
        assert_eq!(" 1 ".parse::<Value>().unwrap(), Value::One);
        assert_eq!("?".parse::<Value>().unwrap(), Value::Undecided);
        assert!("yes".parse::<Value>().is_err());
    }

    #[test]
    fn test_phase_decoding() {
        assert_eq!(serde_json::from_value::<Phase>(json!(1)).unwrap(), Phase::One);
        assert_eq!(serde_json::from_value::<Phase>(json!(2)).unwrap(), Phase::Two);
        assert!(serde_json::from_value::<Phase>(json!(3)).is_err());
        assert!(serde_json::from_value::<Phase>(json!(0)).is_err());
    }
}
