//! The round driver.
//!
//! One [`ConsensusEngine`] runs per node. Its driver task executes rounds of
//!
//! ```text
//! PROPOSE1 -> AWAIT1 -> FOLD1 -> PROPOSE2 -> AWAIT2 -> FOLD2 -> DECIDED
//!    ^                                                    |
//!    +----------------------- next round ----------------+
//! ```
//!
//! until it decides or is stopped, while [`ConsensusEngine::receive`] feeds
//! inbound votes into the shared [`VoteLedger`] concurrently. Stop is
//! observed at every suspension point; the in-flight round is abandoned
//! without committing anything.

use crate::broadcast::Broadcaster;
use crate::coin::Coin;
use crate::error::{ConsensusError, Result};
use crate::ledger::{Snapshot, VoteLedger};
use crate::message::VoteMessage;
use crate::rule::{fold_phase1, fold_phase2, Phase2Outcome};
use crate::tally::{quorum_size, tally};
use crate::value::{NodeId, Phase, Value};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Configuration for one node's engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// This node's index in `[0, n)`.
    pub node_id: NodeId,

    /// Total number of nodes.
    pub n: usize,

    /// Maximum number of faulty nodes tolerated.
    pub f: usize,

    /// Fallback re-check interval while waiting for a quorum.
    pub poll_interval: Duration,
}

impl EngineConfig {
    /// Creates a configuration with the default poll interval.
    pub fn new(node_id: NodeId, n: usize, f: usize) -> Self {
        Self {
            node_id,
            n,
            f,
            poll_interval: Duration::from_millis(5),
        }
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Number of distinct votes needed to fold a phase.
    pub fn quorum(&self) -> usize {
        quorum_size(self.n, self.f)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.n == 0 {
            return Err(ConsensusError::InvalidParameters("n must be at least 1".into()));
        }
        if self.f >= self.n {
            return Err(ConsensusError::InvalidParameters(format!(
                "f ({}) must be smaller than n ({})",
                self.f, self.n
            )));
        }
        if self.node_id >= self.n {
            return Err(ConsensusError::InvalidParameters(format!(
                "node id {} out of range for n = {}",
                self.node_id, self.n
            )));
        }
        Ok(())
    }
}

/// Externally visible consensus state of a node.
///
/// Serialized with the short field names `x` (estimate) and `k` (round).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    /// Set once the node has been stopped.
    pub killed: bool,

    /// Current proposal, or the decision once `decided` is true.
    #[serde(rename = "x")]
    pub estimate: Option<Value>,

    /// Whether the node has decided.
    pub decided: Option<bool>,

    /// Current round; 0 before the first round starts.
    #[serde(rename = "k")]
    pub round: Option<u64>,
}

impl NodeState {
    fn live(initial: Value) -> Self {
        Self {
            killed: false,
            estimate: Some(initial),
            decided: Some(false),
            round: Some(0),
        }
    }

    /// The inert state every faulty node reports.
    pub fn faulty() -> Self {
        Self {
            killed: false,
            estimate: None,
            decided: None,
            round: None,
        }
    }

    /// Returns true once the node has decided.
    pub fn is_decided(&self) -> bool {
        self.decided == Some(true)
    }

    fn is_halted(&self) -> bool {
        self.killed || self.is_decided()
    }
}

/// Liveness as reported by the status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// The node participates in consensus.
    Live,
    /// The node is faulty and never participates.
    Faulty,
}

/// Events emitted by the round driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusEvent {
    /// A new round began with this proposal.
    RoundStarted { round: u64, proposal: Value },
    /// A phase reached quorum and was folded.
    PhaseFolded {
        round: u64,
        phase: Phase,
        votes: usize,
        value: Value,
    },
    /// The node decided.
    Decided { round: u64, value: Value },
    /// The driver exited because the node was stopped.
    Stopped { round: u64 },
}

enum RoundOutcome {
    Decided(Value),
    Continue,
    Interrupted,
}

/// Per-node consensus engine: state, ledger and round driver.
pub struct ConsensusEngine {
    config: EngineConfig,
    faulty: bool,
    state: RwLock<NodeState>,
    ledger: Arc<VoteLedger>,
    broadcaster: Arc<dyn Broadcaster>,
    coin: Arc<dyn Coin>,
    running: AtomicBool,
    events: broadcast::Sender<ConsensusEvent>,
}

impl ConsensusEngine {
    /// Creates an engine. A faulty engine never runs the driver and ignores
    /// every vote.
    pub fn new(
        config: EngineConfig,
        initial: Value,
        faulty: bool,
        broadcaster: Arc<dyn Broadcaster>,
        coin: Arc<dyn Coin>,
    ) -> Result<Self> {
        config.validate()?;

        let state = if faulty {
            NodeState::faulty()
        } else {
            NodeState::live(initial)
        };
        let (events, _) = broadcast::channel(1024);

        Ok(Self {
            config,
            faulty,
            state: RwLock::new(state),
            ledger: Arc::new(VoteLedger::new()),
            broadcaster,
            coin,
            running: AtomicBool::new(false),
            events,
        })
    }

    /// Returns this node's id.
    pub fn node_id(&self) -> NodeId {
        self.config.node_id
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the shared vote ledger.
    pub fn ledger(&self) -> &Arc<VoteLedger> {
        &self.ledger
    }

    /// Returns whether the node is faulty.
    pub fn is_faulty(&self) -> bool {
        self.faulty
    }

    /// Returns the status reported to peers and harnesses.
    pub fn status(&self) -> NodeStatus {
        if self.faulty {
            NodeStatus::Faulty
        } else {
            NodeStatus::Live
        }
    }

    /// Returns a consistent copy of the node state.
    pub fn state(&self) -> NodeState {
        if self.faulty {
            return NodeState::faulty();
        }
        *self.state.read()
    }

    /// Returns true while a driver task is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Subscribes to driver events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConsensusEvent> {
        self.events.subscribe()
    }

    /// Records an inbound vote.
    ///
    /// Returns false, without touching the ledger, when the node is faulty,
    /// stopped or decided, or when the sender id is out of range.
    pub fn receive(&self, vote: VoteMessage) -> bool {
        if self.faulty {
            return false;
        }
        if vote.sender >= self.config.n {
            tracing::debug!(
                node_id = self.config.node_id,
                sender = vote.sender,
                "dropping vote from unknown sender"
            );
            return false;
        }
        if self.state.read().is_halted() {
            return false;
        }

        self.ledger
            .record(vote.round, vote.phase, vote.sender, vote.value);
        true
    }

    /// Spawns the round driver unless it is already running or the node is
    /// faulty. Returns the task handle only when a new driver was spawned.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.faulty {
            return None;
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(node_id = self.config.node_id, "driver already running");
            return None;
        }

        let engine = self.clone();
        Some(tokio::spawn(async move {
            engine.run().await;
            engine.running.store(false, Ordering::SeqCst);
        }))
    }

    /// Marks the node as killed and wakes the driver. Returns immediately.
    pub fn stop(&self) {
        if self.faulty {
            return;
        }

        let was_killed = std::mem::replace(&mut self.state.write().killed, true);
        if !was_killed {
            tracing::info!(node_id = self.config.node_id, "node stopped");
        }
        self.ledger.wake();
    }

    /// Runs rounds until the node decides or is stopped. Only spawned by
    /// [`ConsensusEngine::start`], which holds the `running` guard.
    async fn run(&self) {
        if self.faulty {
            return;
        }

        tracing::info!(
            node_id = self.config.node_id,
            n = self.config.n,
            f = self.config.f,
            "round driver started"
        );

        while let Some(round) = self.begin_round() {
            match self.run_round(round).await {
                RoundOutcome::Decided(value) => {
                    tracing::info!(node_id = self.config.node_id, round, %value, "decided");
                    let _ = self.events.send(ConsensusEvent::Decided { round, value });
                    return;
                }
                RoundOutcome::Continue => {}
                RoundOutcome::Interrupted => break,
            }
        }

        let state = self.state();
        if state.killed {
            let round = state.round.unwrap_or_default();
            tracing::info!(node_id = self.config.node_id, round, "round driver stopped");
            let _ = self.events.send(ConsensusEvent::Stopped { round });
        }
    }

    /// Advances the round counter, or returns `None` if the node is halted.
    fn begin_round(&self) -> Option<u64> {
        let round = {
            let mut state = self.state.write();
            if state.is_halted() {
                return None;
            }
            let round = state.round.unwrap_or_default() + 1;
            state.round = Some(round);
            round
        };

        self.ledger.round(round);
        Some(round)
    }

    async fn run_round(&self, round: u64) -> RoundOutcome {
        let n = self.config.n;
        let f = self.config.f;

        let estimate = self.state.read().estimate;
        let proposal = estimate.unwrap_or_else(|| self.coin.flip());
        let _ = self.events.send(ConsensusEvent::RoundStarted { round, proposal });
        tracing::debug!(node_id = self.config.node_id, round, %proposal, "round started");

        self.propose(round, Phase::One, proposal).await;
        let Some(votes) = self.await_quorum(round, Phase::One).await else {
            return RoundOutcome::Interrupted;
        };
        let b = fold_phase1(&tally(&votes), n);
        self.folded(round, Phase::One, &votes, b);

        self.propose(round, Phase::Two, b).await;
        let Some(votes) = self.await_quorum(round, Phase::Two).await else {
            return RoundOutcome::Interrupted;
        };
        let counts = tally(&votes);

        match fold_phase2(&counts, f) {
            Phase2Outcome::Decide(value) => {
                self.folded(round, Phase::Two, &votes, value);
                if self.commit(value, true) {
                    RoundOutcome::Decided(value)
                } else {
                    RoundOutcome::Interrupted
                }
            }
            outcome => {
                let next = match outcome {
                    Phase2Outcome::Adopt(value) => value,
                    _ => self.coin.flip(),
                };
                self.folded(round, Phase::Two, &votes, next);
                tracing::debug!(
                    node_id = self.config.node_id,
                    round,
                    zero = counts.zero,
                    one = counts.one,
                    undecided = counts.undecided,
                    next = %next,
                    "no decision, moving to next round"
                );
                if self.commit(next, false) {
                    RoundOutcome::Continue
                } else {
                    RoundOutcome::Interrupted
                }
            }
        }
    }

    /// Records our own vote, then broadcasts it.
    async fn propose(&self, round: u64, phase: Phase, value: Value) {
        let sender = self.config.node_id;
        self.ledger.record(round, phase, sender, value);
        self.broadcaster
            .broadcast(VoteMessage::new(round, phase, sender, value))
            .await;
    }

    async fn await_quorum(&self, round: u64, phase: Phase) -> Option<Snapshot> {
        self.ledger
            .wait_for_quorum(
                round,
                phase,
                self.config.quorum(),
                self.config.poll_interval,
                || self.state.read().is_halted(),
            )
            .await
    }

    fn folded(&self, round: u64, phase: Phase, votes: &Snapshot, value: Value) {
        let _ = self.events.send(ConsensusEvent::PhaseFolded {
            round,
            phase,
            votes: votes.len(),
            value,
        });
    }

    /// Writes the new estimate (and the decision flag) unless the node was
    /// halted in the meantime.
    fn commit(&self, value: Value, decide: bool) -> bool {
        let mut state = self.state.write();
        if state.is_halted() {
            return false;
        }
        state.estimate = Some(value);
        if decide {
            state.decided = Some(true);
        }
        true
    }
}
