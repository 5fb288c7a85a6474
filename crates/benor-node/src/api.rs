//! HTTP API for a consensus node.
//!
//! ## Endpoint Overview
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/status` | `live`, or `faulty` with status 500 |
//! | GET | `/getState` | `{killed, x, decided, k}` |
//! | POST | `/message` | Deliver a vote `{round, phase, sender, value}` |
//! | GET | `/start` | Start the round driver |
//! | GET | `/stop` | Stop the node |
//!
//! Every endpoint acknowledges. Votes that fail to decode, and votes sent to
//! a faulty, stopped or decided node, are accepted and dropped.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use benor_consensus::{ConsensusEngine, NodeState, NodeStatus, VoteMessage};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The node's consensus engine.
    pub engine: Arc<ConsensusEngine>,
}

/// Creates the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/getState", get(get_state))
        .route("/message", post(receive_message))
        .route("/start", get(start))
        .route("/stop", get(stop))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.status() {
        NodeStatus::Faulty => (StatusCode::INTERNAL_SERVER_ERROR, "faulty"),
        NodeStatus::Live => (StatusCode::OK, "live"),
    }
}

async fn get_state(State(state): State<AppState>) -> Json<NodeState> {
    Json(state.engine.state())
}

/// Vote intake. The body is decoded by hand so malformed payloads are
/// dropped with a 200 instead of an extractor rejection.
async fn receive_message(State(state): State<AppState>, body: Bytes) -> StatusCode {
    match VoteMessage::decode(&body) {
        Ok(vote) => {
            let recorded = state.engine.receive(vote);
            tracing::trace!(
                node_id = state.engine.node_id(),
                round = vote.round,
                phase = %vote.phase,
                sender = vote.sender,
                value = %vote.value,
                recorded,
                "vote received"
            );
        }
        Err(e) => {
            tracing::debug!(
                node_id = state.engine.node_id(),
                error = %e,
                "dropping malformed vote"
            );
        }
    }

    StatusCode::OK
}

async fn start(State(state): State<AppState>) -> &'static str {
    if state.engine.start().is_some() {
        tracing::info!(node_id = state.engine.node_id(), "consensus started");
    }
    "OK"
}

async fn stop(State(state): State<AppState>) -> &'static str {
    state.engine.stop();
    "OK"
}
