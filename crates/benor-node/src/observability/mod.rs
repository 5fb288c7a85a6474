//! # Observability Module
//!
//! Structured logging for the node. Engine events are logged through
//! `tracing` with `node_id`, `round` and `phase` fields; HTTP requests are
//! traced by `tower_http`'s `TraceLayer`.

mod logging;

pub use logging::{default_directive, init_logging, LogFormat};
