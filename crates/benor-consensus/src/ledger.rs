//! Vote ledger.
//!
//! The ledger stores at most one vote per sender for every (round, phase).
//! Round records are created lazily, either by the local driver or by a vote
//! that arrives before the node reaches that round, and are retained for the
//! lifetime of the ledger.
//!
//! Each phase map sits behind its own lock, so writes to different rounds or
//! phases never contend. Locks are never held across an await point.

use crate::tally::has_quorum;
use crate::value::{NodeId, Phase, Value};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Sender to value mapping for one (round, phase).
pub type Snapshot = HashMap<NodeId, Value>;

/// Votes collected for a single round.
#[derive(Debug, Default)]
pub struct RoundRecord {
    phase1: RwLock<Snapshot>,
    phase2: RwLock<Snapshot>,
}

impl RoundRecord {
    fn votes(&self, phase: Phase) -> &RwLock<Snapshot> {
        match phase {
            Phase::One => &self.phase1,
            Phase::Two => &self.phase2,
        }
    }

    /// Inserts or overwrites the vote of `sender`.
    pub fn record(&self, phase: Phase, sender: NodeId, value: Value) -> Option<Value> {
        self.votes(phase).write().insert(sender, value)
    }

    /// Returns a copy of the votes for `phase`.
    pub fn snapshot(&self, phase: Phase) -> Snapshot {
        self.votes(phase).read().clone()
    }

    /// Returns the number of distinct senders for `phase`.
    pub fn len(&self, phase: Phase) -> usize {
        self.votes(phase).read().len()
    }
}

/// Per-round, per-phase vote store shared by the round driver and intake.
#[derive(Debug, Default)]
pub struct VoteLedger {
    rounds: RwLock<HashMap<u64, Arc<RoundRecord>>>,
    changed: Notify,
}

impl VoteLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `round`, creating it if needed.
    pub fn round(&self, round: u64) -> Arc<RoundRecord> {
        if let Some(record) = self.rounds.read().get(&round) {
            return record.clone();
        }

        self.rounds.write().entry(round).or_default().clone()
    }

    /// Returns true if a record exists for `round`.
    pub fn contains_round(&self, round: u64) -> bool {
        self.rounds.read().contains_key(&round)
    }

    /// Returns the number of round records held.
    pub fn round_count(&self) -> usize {
        self.rounds.read().len()
    }

    /// Records one vote, overwriting any earlier vote from the same sender,
    /// and wakes every task waiting on the ledger.
    pub fn record(&self, round: u64, phase: Phase, sender: NodeId, value: Value) {
        let previous = self.round(round).record(phase, sender, value);

        if let Some(previous) = previous {
            tracing::trace!(round, %phase, sender, %previous, %value, "vote overwritten");
        }

        self.changed.notify_waiters();
    }

    /// Returns the current votes for (round, phase).
    pub fn snapshot(&self, round: u64, phase: Phase) -> Snapshot {
        self.round(round).snapshot(phase)
    }

    /// Returns the number of distinct senders for (round, phase).
    pub fn vote_count(&self, round: u64, phase: Phase) -> usize {
        self.round(round).len(phase)
    }

    /// Wakes every task blocked in [`VoteLedger::wait_for_quorum`] so it
    /// re-checks its cancellation predicate.
    pub fn wake(&self) {
        self.changed.notify_waiters();
    }

    /// Waits until (round, phase) holds at least `quorum` votes and returns
    /// that snapshot, or returns `None` as soon as `cancelled` reports true.
    ///
    /// The wait is driven by insert notifications, with `poll_interval` as a
    /// fallback re-check.
    pub async fn wait_for_quorum<F>(
        &self,
        round: u64,
        phase: Phase,
        quorum: usize,
        poll_interval: Duration,
        cancelled: F,
    ) -> Option<Snapshot>
    where
        F: Fn() -> bool,
    {
        let record = self.round(round);

        loop {
            // Register interest before checking so an insert racing with the
            // check still wakes us.
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if cancelled() {
                return None;
            }

            let snapshot = record.snapshot(phase);
            if has_quorum(&snapshot, quorum) {
                return Some(snapshot);
            }

            let _ = tokio::time::timeout(poll_interval, notified).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_record_and_snapshot() {
        let ledger = VoteLedger::new();

        ledger.record(1, Phase::One, 0, Value::Zero);
        ledger.record(1, Phase::One, 1, Value::One);
        ledger.record(1, Phase::Two, 0, Value::Undecided);

        let phase1 = ledger.snapshot(1, Phase::One);
        assert_eq!(phase1.len(), 2);
        assert_eq!(phase1[&0], Value::Zero);
        assert_eq!(phase1[&1], Value::One);

        assert_eq!(ledger.vote_count(1, Phase::Two), 1);
    }

    #[test]
    fn test_same_sender_overwrites() {
        let ledger = VoteLedger::new();

        ledger.record(2, Phase::One, 3, Value::Zero);
        ledger.record(2, Phase::One, 3, Value::One);

        let snapshot = ledger.snapshot(2, Phase::One);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[&3], Value::One);
    }

    #[test]
    fn test_future_round_created_lazily() {
        let ledger = VoteLedger::new();
        assert!(!ledger.contains_round(7));

        ledger.record(7, Phase::One, 2, Value::One);

        assert!(ledger.contains_round(7));
        assert!(!ledger.contains_round(3));
        assert_eq!(ledger.snapshot(7, Phase::One)[&2], Value::One);
    }

    #[test]
    fn test_snapshot_of_unknown_round_is_empty() {
        let ledger = VoteLedger::new();

        assert!(ledger.snapshot(42, Phase::Two).is_empty());
        assert!(ledger.contains_round(42));
        assert_eq!(ledger.round_count(), 1);
    }

    #[tokio::test]
    async fn test_wait_returns_once_quorum_reached() {
        let ledger = Arc::new(VoteLedger::new());
        ledger.record(1, Phase::One, 0, Value::Zero);

        let writer = ledger.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.record(1, Phase::One, 1, Value::Zero);
            writer.record(1, Phase::One, 2, Value::One);
        });

        let snapshot = ledger
            .wait_for_quorum(1, Phase::One, 3, Duration::from_secs(5), || false)
            .await
            .unwrap();

        assert_eq!(snapshot.len(), 3);
    }

    #[tokio::test]
    async fn test_wait_does_not_unblock_below_quorum() {
        let ledger = VoteLedger::new();
        ledger.record(1, Phase::Two, 0, Value::One);
        ledger.record(1, Phase::Two, 1, Value::One);

        let result = tokio::time::timeout(
            Duration::from_millis(100),
            ledger.wait_for_quorum(1, Phase::Two, 3, Duration::from_millis(5), || false),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_wait_cancelled_by_wake() {
        let ledger = Arc::new(VoteLedger::new());
        let stop = Arc::new(AtomicBool::new(false));

        let waiter = {
            let ledger = ledger.clone();
            let stop = stop.clone();
            tokio::spawn(async move {
                ledger
                    .wait_for_quorum(1, Phase::One, 3, Duration::from_secs(60), || {
                        stop.load(Ordering::SeqCst)
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        stop.store(true, Ordering::SeqCst);
        ledger.wake();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_none());
    }
}
