//! Ben-Or Binary Consensus Engine
//!
//! This crate provides the per-node consensus engine for a randomized
//! asynchronous binary agreement protocol. `N` nodes each start with a value
//! in `{0, 1}` and, tolerating up to `F` nodes that never participate, agree
//! on one of them.
//!
//! # Components
//!
//! - [`VoteLedger`]: one vote per sender per (round, phase), created lazily
//! - [`Tally`] / [`has_quorum`]: aggregation over ledger snapshots
//! - [`fold_phase1`] / [`fold_phase2`]: pure decision rules
//! - [`ConsensusEngine`]: node state and the round driver
//! - [`Broadcaster`]: best-effort fan-out of votes, with [`LocalNetwork`] as
//!   an in-process implementation
//! - [`Coin`]: injectable randomness
//!
//! # Round Flow
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Propose x   │────▶│  Wait N - F  │────▶│ b = majority │
//! │  (phase 1)   │     │    votes     │     │  > N/2 or ?  │
//! └──────────────┘     └──────────────┘     └──────┬───────┘
//!        ▲                                          │
//!        │                                          ▼
//! ┌──────┴───────┐     ┌──────────────┐     ┌──────────────┐
//! │ x = majority │◀────│  Wait N - F  │◀────│  Propose b   │
//! │  or coin     │ no  │    votes     │     │  (phase 2)   │
//! └──────────────┘     └──────┬───────┘     └──────────────┘
//!                             │ > F votes for v
//!                             ▼
//!                      ┌──────────────┐
//!                      │  Decide v    │
//!                      └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use benor_consensus::{ConsensusEngine, EngineConfig, LocalNetwork, RandomCoin, Value};
//! use std::sync::Arc;
//!
//! # async fn run() -> benor_consensus::Result<()> {
//! let network = LocalNetwork::new();
//! let mut engines = Vec::new();
//! for id in 0..4 {
//!     let engine = Arc::new(ConsensusEngine::new(
//!         EngineConfig::new(id, 4, 1),
//!         Value::Zero,
//!         false,
//!         network.broadcaster(),
//!         Arc::new(RandomCoin::from_seed(id as u64)),
//!     )?);
//!     network.register(&engine);
//!     engines.push(engine);
//! }
//! for engine in &engines {
//!     engine.start();
//! }
//! # Ok(())
//! # }
//! ```

mod broadcast;
mod coin;
mod engine;
mod error;
mod ledger;
mod message;
mod rule;
mod tally;
mod value;

pub use broadcast::{Broadcaster, LocalNetwork};
pub use coin::{Coin, FixedCoin, RandomCoin};
pub use engine::{ConsensusEngine, ConsensusEvent, EngineConfig, NodeState, NodeStatus};
pub use error::{ConsensusError, Result};
pub use ledger::{RoundRecord, Snapshot, VoteLedger};
pub use message::VoteMessage;
pub use rule::{fold_phase1, fold_phase2, Phase2Outcome};
pub use tally::{has_quorum, quorum_size, tally, Tally};
pub use value::{NodeId, Phase, Value};
