//! Readiness tracking.
//!
//! Each node marks itself ready once its endpoint is bound. Harnesses wait on
//! [`ReadinessTracker::all_ready`] before starting consensus.

use benor_consensus::NodeId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Tracks which of `n` nodes are listening.
pub struct ReadinessTracker {
    nodes: Vec<AtomicBool>,
}

impl ReadinessTracker {
    /// Creates a tracker with every node not ready.
    pub fn new(n: usize) -> Self {
        Self {
            nodes: (0..n).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Marks `node_id` ready. Out-of-range ids are ignored.
    pub fn set_node_ready(&self, node_id: NodeId) {
        if let Some(ready) = self.nodes.get(node_id) {
            ready.store(true, Ordering::SeqCst);
        }
    }

    /// Returns whether `node_id` is ready.
    pub fn is_node_ready(&self, node_id: NodeId) -> bool {
        self.nodes
            .get(node_id)
            .is_some_and(|ready| ready.load(Ordering::SeqCst))
    }

    /// Number of ready nodes.
    pub fn ready_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|ready| ready.load(Ordering::SeqCst))
            .count()
    }

    /// Returns true once every node is ready.
    pub fn all_ready(&self) -> bool {
        self.ready_count() == self.nodes.len()
    }

    /// Waits until every node is ready, checking every `interval`.
    /// Returns false if `timeout` elapses first.
    pub async fn wait_all_ready(&self, interval: Duration, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            while !self.all_ready() {
                tokio::time::sleep(interval).await;
            }
        })
        .await
        .is_ok()
    }
}
