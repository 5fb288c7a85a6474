//! Vote aggregation over ledger snapshots.

use crate::ledger::Snapshot;
use crate::value::Value;

/// Counts of each value among a set of votes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Votes for `0`.
    pub zero: usize,
    /// Votes for `1`.
    pub one: usize,
    /// Votes for `?`.
    pub undecided: usize,
}

impl Tally {
    /// Counts the given votes.
    pub fn from_votes<'a, I>(votes: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        votes.into_iter().fold(Self::default(), |mut tally, value| {
            match value {
                Value::Zero => tally.zero += 1,
                Value::One => tally.one += 1,
                Value::Undecided => tally.undecided += 1,
            }
            tally
        })
    }

    /// Returns the count for `value`.
    pub fn count(&self, value: Value) -> usize {
        match value {
            Value::Zero => self.zero,
            Value::One => self.one,
            Value::Undecided => self.undecided,
        }
    }

    /// Total number of votes counted.
    pub fn total(&self) -> usize {
        self.zero + self.one + self.undecided
    }
}

/// Tallies a ledger snapshot.
pub fn tally(snapshot: &Snapshot) -> Tally {
    Tally::from_votes(snapshot.values())
}

/// Minimum number of distinct votes before a phase can be folded.
pub fn quorum_size(n: usize, f: usize) -> usize {
    n.saturating_sub(f)
}

/// Returns true if the snapshot holds at least `quorum` distinct senders.
pub fn has_quorum(snapshot: &Snapshot, quorum: usize) -> bool {
    snapshot.len() >= quorum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(values: &[Value]) -> Snapshot {
        values.iter().copied().enumerate().collect()
    }

    #[test]
    fn test_tally_counts_each_value() {
        let votes = snapshot(&[Value::Zero, Value::One, Value::Zero, Value::Undecided]);
        let counts = tally(&votes);

        assert_eq!(counts.zero, 2);
        assert_eq!(counts.one, 1);
        assert_eq!(counts.undecided, 1);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.count(Value::Zero), 2);
    }

    #[test]
    fn test_quorum() {
        assert_eq!(quorum_size(4, 1), 3);
        assert_eq!(quorum_size(10, 0), 10);

        let votes = snapshot(&[Value::Zero, Value::One]);
        assert!(!has_quorum(&votes, 3));
        assert!(has_quorum(&votes, 2));
        assert!(has_quorum(&Snapshot::new(), 0));
    }
}
