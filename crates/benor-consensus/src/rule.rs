//! Decision rules applied at the end of each phase.
//!
//! Both folds are pure functions of a [`Tally`] and the network parameters.
//! Thresholds are strict: phase 1 needs more than `N/2` matching votes, phase
//! 2 needs more than `F`.

use crate::tally::Tally;
use crate::value::Value;

/// Result of folding the phase-2 votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase2Outcome {
    /// More than `F` votes for this value: decide it.
    Decide(Value),
    /// No decision, but binary votes were seen: adopt this value next round.
    Adopt(Value),
    /// Only `?` votes: the next estimate comes from the coin.
    NoSignal,
}

/// Computes the working value `b` broadcast in phase 2.
pub fn fold_phase1(tally: &Tally, n: usize) -> Value {
    // count > N/2 without integer truncation
    if tally.zero * 2 > n {
        Value::Zero
    } else if tally.one * 2 > n {
        Value::One
    } else {
        Value::Undecided
    }
}

/// Folds the phase-2 votes into a decision or the next estimate.
///
/// When no value passes `F`, the next estimate is the majority of the binary
/// votes with ties going to `Zero`.
pub fn fold_phase2(tally: &Tally, f: usize) -> Phase2Outcome {
    if tally.zero > f {
        return Phase2Outcome::Decide(Value::Zero);
    }
    if tally.one > f {
        return Phase2Outcome::Decide(Value::One);
    }

    if tally.zero + tally.one > 0 {
        if tally.zero >= tally.one {
            Phase2Outcome::Adopt(Value::Zero)
        } else {
            Phase2Outcome::Adopt(Value::One)
        }
    } else {
        Phase2Outcome::NoSignal
    }
}
