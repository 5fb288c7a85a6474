//! HTTP API tests.
//!
//! These tests drive the router directly with `tower::ServiceExt::oneshot`
//! and verify:
//! - Status and state queries for live and faulty nodes
//! - Vote intake, including malformed and late votes
//! - Start and stop semantics

use axum::{body::Body, http::Request, Router};
use benor_consensus::{
    ConsensusEngine, EngineConfig, FixedCoin, LocalNetwork, Phase, Value, VoteMessage,
};
use benor_node::api::{create_router, AppState};
use serde_json::{json, Value as Json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Helper to extract the body of a response as text.
async fn text_body(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Helper to extract JSON body from response
async fn json_body(response: axum::response::Response) -> Json {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Creates a node 0 of a 4-node network with no reachable peers.
fn create_test_node(initial: Value, faulty: bool) -> (Router, Arc<ConsensusEngine>) {
    let engine = Arc::new(
        ConsensusEngine::new(
            EngineConfig::new(0, 4, 1),
            initial,
            faulty,
            LocalNetwork::new().broadcaster(),
            Arc::new(FixedCoin::zero()),
        )
        .unwrap(),
    );
    let router = create_router(AppState {
        engine: engine.clone(),
    });
    (router, engine)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_message(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/message")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn vote_body(round: u64, phase: u8, sender: usize, value: Json) -> String {
    json!({ "round": round, "phase": phase, "sender": sender, "value": value }).to_string()
}

#[tokio::test]
async fn test_status_live() {
    let (router, _) = create_test_node(Value::Zero, false);

    let response = router.oneshot(get("/status")).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(text_body(response).await, "live");
}

#[tokio::test]
async fn test_status_faulty() {
    let (router, _) = create_test_node(Value::Zero, true);

    let response = router.oneshot(get("/status")).await.unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(text_body(response).await, "faulty");
}

#[tokio::test]
async fn test_get_state_live() {
    let (router, _) = create_test_node(Value::One, false);

    let response = router.oneshot(get("/getState")).await.unwrap();
    assert_eq!(response.status(), 200);

    let json = json_body(response).await;
    assert_eq!(
        json,
        json!({ "killed": false, "x": 1, "decided": false, "k": 0 })
    );
}

#[tokio::test]
async fn test_faulty_state_is_frozen() {
    let (router, engine) = create_test_node(Value::One, true);

    for request in [
        post_message(vote_body(1, 1, 2, json!(0))),
        get("/start"),
        get("/stop"),
    ] {
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    let response = router.oneshot(get("/getState")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(
        json,
        json!({ "killed": false, "x": null, "decided": null, "k": null })
    );
    assert_eq!(engine.ledger().round_count(), 0);
}

#[tokio::test]
async fn test_message_recorded() {
    let (router, engine) = create_test_node(Value::Zero, false);

    let response = router
        .oneshot(post_message(vote_body(1, 2, 3, json!("?"))))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        engine.ledger().snapshot(1, Phase::Two).get(&3),
        Some(&Value::Undecided)
    );
}

#[tokio::test]
async fn test_malformed_messages_acknowledged_and_dropped() {
    let (router, engine) = create_test_node(Value::Zero, false);

    let bodies = [
        vote_body(1, 1, 1, json!(5)),
        vote_body(1, 1, 1, json!("yes")),
        vote_body(1, 3, 1, json!(0)),
        vote_body(1, 1, 17, json!(0)),
        "{\"round\": 1}".to_string(),
        "garbage".to_string(),
    ];

    for body in bodies {
        let response = router.clone().oneshot(post_message(body)).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    assert_eq!(engine.ledger().vote_count(1, Phase::One), 0);
}

#[tokio::test]
async fn test_future_round_vote_counted() {
    let (router, engine) = create_test_node(Value::Zero, false);

    let response = router
        .oneshot(post_message(vote_body(7, 1, 2, json!(1))))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    assert!(engine.ledger().contains_round(7));
    let votes = engine.ledger().snapshot(7, Phase::One);
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[&2], Value::One);
}

#[tokio::test]
async fn test_start_and_stop() {
    let (router, engine) = create_test_node(Value::One, false);

    let response = router.clone().oneshot(get("/start")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(text_body(response).await, "OK");

    // Second start is a no-op
    let response = router.clone().oneshot(get("/start")).await.unwrap();
    assert_eq!(response.status(), 200);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(engine.is_running());
    assert_eq!(engine.state().round, Some(1));

    let response = router.clone().oneshot(get("/stop")).await.unwrap();
    assert_eq!(text_body(response).await, "OK");

    tokio::time::timeout(Duration::from_secs(2), async {
        while engine.is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let response = router.clone().oneshot(get("/getState")).await.unwrap();
    let json = json_body(response).await;
    assert_eq!(
        json,
        json!({ "killed": true, "x": 1, "decided": false, "k": 1 })
    );

    // Votes after stop are ignored
    router
        .oneshot(post_message(vote_body(2, 1, 1, json!(0))))
        .await
        .unwrap();
    assert_eq!(engine.ledger().vote_count(2, Phase::One), 0);
}

#[tokio::test]
async fn test_quorum_delivered_over_http_decides() {
    let (router, engine) = create_test_node(Value::Zero, false);
    router.clone().oneshot(get("/start")).await.unwrap();

    // Peers 1 and 2 vote 0 in both phases of round 1.
    for phase in [1u8, 2] {
        for sender in [1, 2] {
            let response = router
                .clone()
                .oneshot(post_message(vote_body(1, phase, sender, json!(0))))
                .await
                .unwrap();
            assert_eq!(response.status(), 200);
        }
    }

    tokio::time::timeout(Duration::from_secs(2), async {
        while !engine.state().is_decided() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let state = engine.state();
    assert_eq!(state.estimate, Some(Value::Zero));
    assert_eq!(state.round, Some(1));

    // Decided nodes ignore further votes
    let late = VoteMessage::new(1, Phase::Two, 3, Value::One);
    router
        .oneshot(post_message(serde_json::to_string(&late).unwrap()))
        .await
        .unwrap();
    assert_eq!(engine.ledger().snapshot(1, Phase::Two).get(&3), None);
}
