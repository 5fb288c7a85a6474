//! # Ben-Or Node
//!
//! HTTP node wrapping the [`benor_consensus`] engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Node i                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │            HTTP API (base_port + i)                   │  │
//! │  │  • /status /getState        • /start /stop            │  │
//! │  │  • /message  ──▶ vote intake                          │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! │                              │                              │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │                 Consensus Engine                      │  │
//! │  │  • Vote ledger          • Round driver                │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! │                              │                              │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │          HTTP Broadcaster ──▶ other nodes             │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cargo run --bin benor-node -- network --n 4 --f 1 --values 0,0,0,1
//! ```
//!
//! ## Modules
//!
//! - [`api`] - HTTP endpoints
//! - [`client`] - HTTP client for driving nodes
//! - [`config`] - Node configuration
//! - [`network`] - Node and network launcher
//! - [`observability`] - Structured logging
//! - [`readiness`] - Readiness tracking
//! - [`transport`] - HTTP vote broadcast

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod network;
pub mod observability;
pub mod readiness;
pub mod transport;

pub use error::{NodeError, Result};
