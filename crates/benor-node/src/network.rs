//! Node and network launcher.
//!
//! [`launch_node`] binds `base_port + id`, serves the API and signals
//! readiness. [`launch_network`] does this for all `N` nodes of a config in
//! one process, which is what the CLI `network` command and the end-to-end
//! tests use.

use crate::api::{create_router, AppState};
use crate::client::NodeClient;
use crate::config::NodeConfig;
use crate::error::{NodeError, Result};
use crate::readiness::ReadinessTracker;
use crate::transport::HttpBroadcaster;
use benor_consensus::{ConsensusEngine, NodeId, NodeState, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A running node.
pub struct NodeHandle {
    /// Node id.
    pub node_id: NodeId,
    /// The node's engine.
    pub engine: Arc<ConsensusEngine>,
    /// Bound address.
    pub addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

impl NodeHandle {
    /// Stops the engine and shuts the server down.
    pub async fn shutdown(self) {
        self.engine.stop();
        let _ = self.shutdown.send(());
        if let Err(e) = self.server.await {
            tracing::warn!(node_id = self.node_id, error = %e, "server task failed");
        }
    }
}

/// Launches one node: binds its endpoint, serves the API and marks it ready.
pub async fn launch_node(
    config: &NodeConfig,
    node_id: NodeId,
    initial: Value,
    faulty: bool,
    readiness: Arc<ReadinessTracker>,
) -> Result<NodeHandle> {
    let broadcaster = Arc::new(HttpBroadcaster::new(config, node_id)?);
    let engine = Arc::new(ConsensusEngine::new(
        config.engine_config(node_id),
        initial,
        faulty,
        broadcaster,
        config.coin_for(node_id),
    )?);

    let addr = config.addr_for(node_id);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| NodeError::Bind {
            addr: addr.clone(),
            source,
        })?;
    let local_addr = listener.local_addr()?;

    let router = create_router(AppState {
        engine: engine.clone(),
    });
    let (shutdown, signal) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = signal.await;
            })
            .await;
        if let Err(e) = result {
            tracing::error!(node_id, error = %e, "server error");
        }
    });

    tracing::info!(node_id, addr = %local_addr, faulty, %initial, "node listening");
    readiness.set_node_ready(node_id);

    Ok(NodeHandle {
        node_id,
        engine,
        addr: local_addr,
        shutdown,
        server,
    })
}

/// All nodes of a network running in this process.
pub struct Network {
    /// Running nodes, indexed by id.
    pub nodes: Vec<NodeHandle>,
    /// Readiness of the nodes.
    pub readiness: Arc<ReadinessTracker>,
    client: NodeClient,
}

/// Launches `config.n` nodes with the given initial values and faulty flags.
pub async fn launch_network(
    config: &NodeConfig,
    initial_values: &[Value],
    faulty: &[bool],
) -> Result<Network> {
    config.validate()?;
    if initial_values.len() != config.n || faulty.len() != config.n {
        return Err(NodeError::Config(format!(
            "expected {} initial values and faulty flags, got {} and {}",
            config.n,
            initial_values.len(),
            faulty.len()
        )));
    }
    let faulty_count = faulty.iter().filter(|f| **f).count();
    if faulty_count > config.f {
        tracing::warn!(
            faulty = faulty_count,
            f = config.f,
            "more faulty nodes than tolerated, consensus may not terminate"
        );
    }

    let readiness = Arc::new(ReadinessTracker::new(config.n));
    let mut nodes = Vec::with_capacity(config.n);
    for node_id in 0..config.n {
        let node = launch_node(
            config,
            node_id,
            initial_values[node_id],
            faulty[node_id],
            readiness.clone(),
        )
        .await?;
        nodes.push(node);
    }

    Ok(Network {
        nodes,
        readiness,
        client: NodeClient::new(config.clone())?,
    })
}

impl Network {
    /// HTTP client for the nodes.
    pub fn client(&self) -> &NodeClient {
        &self.client
    }

    /// Waits for readiness, then sends `/start` to every node.
    pub async fn start_consensus(&self) -> Result<()> {
        if !self
            .readiness
            .wait_all_ready(Duration::from_millis(10), Duration::from_secs(10))
            .await
        {
            return Err(NodeError::Timeout("nodes not ready".into()));
        }
        self.client.start_all().await
    }

    /// Sends `/stop` to every node.
    pub async fn stop_consensus(&self) -> Result<()> {
        self.client.stop_all().await
    }

    /// Polls `/getState` until every live node has decided, or `timeout`.
    /// Failed polls are retried until the deadline.
    pub async fn wait_for_decisions(&self, timeout: Duration) -> Result<Vec<NodeState>> {
        let faulty: Vec<bool> = self.nodes.iter().map(|n| n.engine.is_faulty()).collect();

        let polled = tokio::time::timeout(timeout, async {
            loop {
                match self.client.states().await {
                    Ok(states) => {
                        let done = states
                            .iter()
                            .zip(&faulty)
                            .all(|(state, faulty)| *faulty || state.is_decided());
                        if done {
                            return states;
                        }
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "state poll failed, retrying");
                    }
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;

        match polled {
            Ok(states) => Ok(states),
            Err(_) => Err(NodeError::Timeout(format!(
                "nodes did not decide within {:?}",
                timeout
            ))),
        }
    }

    /// Stops every engine and shuts down every server.
    pub async fn shutdown(self) {
        for node in self.nodes {
            node.shutdown().await;
        }
    }
}
