//! Ben-Or Node - binary consensus over HTTP.
//!
//! `benor-node node` runs a single node; `benor-node network` runs a whole
//! local network in one process, starts consensus and prints the outcome.

use anyhow::Context;
use benor_consensus::Value;
use benor_node::config::NodeConfig;
use benor_node::network::{launch_network, launch_node};
use benor_node::observability::{init_logging, LogFormat};
use benor_node::readiness::ReadinessTracker;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Ben-Or Node - randomized binary consensus
#[derive(Parser, Debug)]
#[command(name = "benor-node")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    network: NetworkArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every node; override the config file when given.
#[derive(Args, Debug)]
struct NetworkArgs {
    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Number of nodes
    #[arg(long, global = true)]
    n: Option<usize>,

    /// Number of faulty nodes tolerated
    #[arg(long, global = true)]
    f: Option<usize>,

    /// Host to bind and reach nodes on
    #[arg(long, global = true)]
    host: Option<String>,

    /// Port of node 0; node i listens on base_port + i
    #[arg(long, global = true)]
    base_port: Option<u16>,

    /// Coin seed (node i uses seed + i)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single node
    Node {
        /// Node id in [0, n)
        #[arg(long)]
        id: usize,

        /// Initial value (0, 1 or ?)
        #[arg(long, default_value = "0")]
        value: Value,

        /// Run as a faulty node
        #[arg(long)]
        faulty: bool,
    },

    /// Run a full local network and report the decisions
    Network {
        /// Initial values, comma separated (e.g. 0,0,0,1)
        #[arg(long, value_delimiter = ',', required = true)]
        values: Vec<Value>,

        /// Ids of faulty nodes, comma separated
        #[arg(long, value_delimiter = ',')]
        faulty: Vec<usize>,

        /// Seconds to wait for every live node to decide
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

impl NetworkArgs {
    fn resolve(&self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::load_yaml(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => NodeConfig::default(),
        };

        if let Some(n) = self.n {
            config.n = n;
        }
        if let Some(f) = self.f {
            config.f = f;
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(base_port) = self.base_port {
            config.base_port = base_port;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

/// Expands `--faulty` ids into one flag per node.
fn faulty_flags(n: usize, ids: &[usize]) -> anyhow::Result<Vec<bool>> {
    for id in ids {
        anyhow::ensure!(*id < n, "faulty node id {} out of range for n = {}", id, n);
    }
    Ok((0..n).map(|id| ids.contains(&id)).collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = cli.network.resolve()?;

    init_logging(&config.log_level, LogFormat::parse(&config.log_format));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Ben-Or node");

    match cli.command {
        Commands::Node { id, value, faulty } => {
            anyhow::ensure!(id < config.n, "node id {} out of range for n = {}", id, config.n);

            let readiness = Arc::new(ReadinessTracker::new(config.n));
            let node = launch_node(&config, id, value, faulty, readiness).await?;

            tracing::info!(node_id = id, "Node is ready. Press Ctrl+C to stop.");
            tokio::signal::ctrl_c().await?;
            node.shutdown().await;
        }
        Commands::Network {
            values,
            faulty,
            timeout_secs,
        } => {
            if cli.network.n.is_none() {
                config.n = values.len();
                config.validate()?;
            }
            let flags = faulty_flags(config.n, &faulty)?;

            let network = launch_network(&config, &values, &flags).await?;
            network.start_consensus().await?;

            let outcome = network
                .wait_for_decisions(Duration::from_secs(timeout_secs))
                .await;
            let states = network.client().states().await?;

            for (id, state) in states.iter().enumerate() {
                println!("node {id}: {}", serde_json::to_string(state)?);
            }

            network.stop_consensus().await?;
            network.shutdown().await;
            outcome?;
        }
    }

    Ok(())
}
