//! End-to-end tests for the HTTP surface: auth gating, turn ingestion,
//! session introspection and manual finalization, all against an
//! in-memory store and a stub delivery.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use parking_lot::Mutex;
use tower::ServiceExt;

use bait_dispatch::{CaseDelivery, DeliveryOutcome};
use bait_domain::config::Config;
use bait_domain::CaseSummary;
use bait_engine::{EventHandler, ReplyGenerator};
use bait_gateway::api;
use bait_gateway::keys::ApiKeySet;
use bait_gateway::state::AppState;
use bait_sessions::SessionStore;

struct RecordingDelivery {
    sent: Mutex<Vec<CaseSummary>>,
    outcome: DeliveryOutcome,
}

#[async_trait]
impl CaseDelivery for RecordingDelivery {
    async fn deliver(&self, case: &CaseSummary) -> DeliveryOutcome {
        self.sent.lock().push(case.clone());
        self.outcome.clone()
    }
}

fn app(keys_env: &str, delivery: Arc<RecordingDelivery>) -> (axum::Router, Arc<SessionStore>) {
    let config = Arc::new(Config::default());
    let store = Arc::new(SessionStore::in_memory());
    let handler = Arc::new(EventHandler::new(
        store.clone(),
        ReplyGenerator::rule_based(config.generation.clone()),
    ));
    let state = AppState {
        config,
        store: store.clone(),
        handler,
        delivery,
        keys: Arc::new(ApiKeySet::from_env(keys_env)),
    };
    (api::router(state.clone()).with_state(state), store)
}

fn ok_delivery() -> Arc<RecordingDelivery> {
    Arc::new(RecordingDelivery {
        sent: Mutex::new(Vec::new()),
        outcome: DeliveryOutcome::Sent { status: 200 },
    })
}

fn post_json(uri: &str, api_key: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    std::env::set_var("BAIT_API_TEST_HEALTH", "secret");
    let (app, _) = app("BAIT_API_TEST_HEALTH", ok_delivery());

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storeDegraded"], false);
}

#[tokio::test]
async fn protected_routes_reject_missing_and_wrong_keys() {
    std::env::set_var("BAIT_API_TEST_AUTH", "secret");
    let (app, _) = app("BAIT_API_TEST_AUTH", ok_delivery());

    let resp = app
        .clone()
        .oneshot(Request::get("/v1/sessions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(
            Request::get("/v1/sessions")
                .header("x-api-key", "wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn no_configured_keys_allows_access() {
    std::env::remove_var("BAIT_API_TEST_OPEN");
    let (app, _) = app("BAIT_API_TEST_OPEN", ok_delivery());

    let resp = app
        .oneshot(Request::get("/v1/sessions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn event_ingestion_runs_the_pipeline() {
    std::env::set_var("BAIT_API_TEST_EVENTS", "secret");
    let (app, store) = app("BAIT_API_TEST_EVENTS", ok_delivery());

    let resp = app
        .oneshot(post_json(
            "/v1/events",
            Some("secret"),
            serde_json::json!({
                "sessionId": "s1",
                "message": {
                    "sender": "scammer",
                    "text": "urgent: verify your account at pay@upi",
                },
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["scamDetected"], true);
    assert_eq!(body["extractedIntelligence"]["upiIds"][0], "pay@upi");
    assert!(body["agentReply"].is_object());

    // Scammer message plus agent reply were persisted.
    assert_eq!(store.total_messages("s1").await, 2);
}

#[tokio::test]
async fn session_detail_reflects_stored_state() {
    std::env::remove_var("BAIT_API_TEST_DETAIL");
    let (app, _) = app("BAIT_API_TEST_DETAIL", ok_delivery());

    let resp = app
        .clone()
        .oneshot(post_json(
            "/v1/events",
            None,
            serde_json::json!({
                "sessionId": "s2",
                "message": { "sender": "scammer", "text": "call 9876543210 urgent" },
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(Request::get("/v1/sessions/s2").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["sessionId"], "s2");
    assert_eq!(body["finalized"], false);
    assert_eq!(
        body["extractedIntelligence"]["phoneNumbers"][0],
        "9876543210"
    );
    assert!(body["history"].as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn finalize_requires_scam_detected() {
    std::env::remove_var("BAIT_API_TEST_FIN_REJECT");
    let delivery = ok_delivery();
    let (app, _) = app("BAIT_API_TEST_FIN_REJECT", delivery.clone());

    let resp = app
        .oneshot(post_json(
            "/v1/sessions/s3/finalize",
            None,
            serde_json::json!({ "scamDetected": false }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_json(resp).await;
    assert_eq!(body["error"], "scamDetected must be true to finalize");
    assert!(delivery.sent.lock().is_empty());
}

#[tokio::test]
async fn finalize_delivers_and_marks_session() {
    std::env::remove_var("BAIT_API_TEST_FIN_OK");
    let delivery = ok_delivery();
    let (app, store) = app("BAIT_API_TEST_FIN_OK", delivery.clone());

    let resp = app
        .clone()
        .oneshot(post_json(
            "/v1/events",
            None,
            serde_json::json!({
                "sessionId": "s4",
                "message": { "sender": "scammer", "text": "urgent: send otp now" },
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(post_json(
            "/v1/sessions/s4/finalize",
            None,
            serde_json::json!({ "scamDetected": true }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["status"], "callback_attempted");
    assert_eq!(body["result"]["sent"], true);
    assert!(store.is_finalized("s4").await);

    let sent = delivery.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].session_id, "s4");
    assert_eq!(sent[0].agent_notes, "Manually finalized");
    assert!(sent[0].total_messages_exchanged >= 2);
}

#[tokio::test]
async fn failed_delivery_leaves_session_open() {
    std::env::remove_var("BAIT_API_TEST_FIN_FAIL");
    let delivery = Arc::new(RecordingDelivery {
        sent: Mutex::new(Vec::new()),
        outcome: DeliveryOutcome::Failed {
            error: "endpoint down".into(),
        },
    });
    let (app, store) = app("BAIT_API_TEST_FIN_FAIL", delivery);

    let resp = app
        .oneshot(post_json(
            "/v1/sessions/s5/finalize",
            None,
            serde_json::json!({ "scamDetected": true }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["result"]["sent"], false);
    assert!(!store.is_finalized("s5").await);
}
