mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bidserve_engine::{CandidateBatch, RawCandidate};
use bidserve_gateway::readiness::ReadinessGate;
use common::*;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

const VALID_BODY: &str = r#"{"hand":"6.AKJT82.762.K63","auction":["1D","3S"],"seat":2,"dealer":0}"#;

fn three_candidates() -> CandidateBatch {
    CandidateBatch {
        candidates: vec![
            RawCandidate::new("PASS", 0.12),
            RawCandidate::new("4S", 0.81).with_expected_score("not a number"),
            RawCandidate::new("3N", "0.05")
                .with_expected_score(410.2)
                .with_explanation("stoppers everywhere"),
        ],
        passout: false,
    }
}

fn calls(body: &Value) -> Vec<String> {
    body["candidates"]
        .as_array()
        .expect("candidates array")
        .iter()
        .map(|c| c["call"].as_str().expect("call").to_string())
        .collect()
}

#[tokio::test]
async fn suggest_is_unavailable_while_loading_whatever_the_body() {
    let gate = Arc::new(ReadinessGate::new());
    gate.begin_loading().unwrap();
    let app = app_with_gate(gate, None);

    for body in [VALID_BODY, "garbage", r#"{"seat":9}"#] {
        let request = Request::builder()
            .method("POST")
            .uri("/suggest")
            .body(Body::from(body))
            .unwrap();
        let response = tower::ServiceExt::oneshot(app.clone(), request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers().get("retry-after").unwrap(), "30");
    }

    let (status, body) = post_json(&app, "/suggest-simple", VALID_BODY).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "NOT_READY");
    assert!(body.get("candidates").is_none());
}

#[tokio::test]
async fn health_answers_during_loading() {
    let gate = Arc::new(ReadinessGate::new());
    gate.begin_loading().unwrap();
    let app = app_with_gate(gate, None);

    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "loading");
    assert_eq!(body["models_loaded"], false);
    assert_eq!(body["ready_for_requests"], false);
    assert_eq!(body["error"], Value::Null);

    let (status, body) = get_json(&app, "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "state": "loading" }));
}

#[tokio::test]
async fn failed_load_is_reported_and_blocks_serving() {
    let gate = Arc::new(ReadinessGate::new());
    gate.begin_loading().unwrap();
    gate.mark_failed("engine configuration not found").unwrap();
    let app = app_with_gate(gate, None);

    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["error"], "engine configuration not found");

    let (status, body) = get_json(&app, "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["state"], "failed");
    assert_eq!(body["reason"], "engine configuration not found");

    let (status, body) = post_json(&app, "/suggest", VALID_BODY).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("engine configuration not found")
    );

    let (status, body) = get_json(&app, "/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], false);
}

#[tokio::test]
async fn out_of_range_seat_never_reaches_engine() {
    let engine = ScriptedEngine::new(three_candidates());
    let app = ready_app(engine.clone());

    let (status, body) = post_json(
        &app,
        "/suggest",
        r#"{"hand":"6.AKJT82.762.K63","seat":4,"dealer":0}"#,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");

    let (status, _) = post_json(&app, "/suggest", r#"{"hand":"","seat":1,"dealer":0}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post_raw(&app, "/suggest", "{not json").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(engine.session_count(), 0);
}

#[tokio::test]
async fn omitted_auction_matches_empty_auction() {
    let engine = ScriptedEngine::new(three_candidates());
    let app = ready_app(engine.clone());

    let (status, omitted) =
        post_json(&app, "/suggest", r#"{"hand":"AKQ.xx","seat":0,"dealer":3}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(engine.last_auction.lock().clone(), Some(vec![]));

    let (_, explicit) = post_json(
        &app,
        "/suggest",
        r#"{"hand":"AKQ.xx","auction":[],"seat":0,"dealer":3}"#,
    )
    .await;
    assert_eq!(omitted, explicit);
    assert_eq!(omitted["auction"], json!([]));
}

#[tokio::test]
async fn candidates_keep_engine_order_and_optional_fields() {
    let engine = ScriptedEngine::new(three_candidates());
    let app = ready_app(engine.clone());

    let (status, body) = post_json(&app, "/suggest", VALID_BODY).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calls(&body), ["PASS", "4S", "3N"]);
    assert_eq!(body["passout"], false);
    assert_eq!(body["hand"], "6.AKJT82.762.K63");
    assert_eq!(body["auction"], json!(["1D", "3S"]));

    let candidates = body["candidates"].as_array().unwrap();
    assert!(candidates[0].get("expected_score").is_none());
    assert!(candidates[1].get("expected_score").is_none());
    assert_eq!(candidates[2]["expected_score"], 410.2);
    assert_eq!(candidates[2]["insta_score"], 0.05);
    assert_eq!(candidates[2]["explanation"], "stoppers everywhere");
    assert!(candidates[0].get("explanation").is_none());

    let params = engine.last_params.lock().clone().unwrap();
    assert!(!params.aux_integration);
    assert!(params.disabled_features.iter().any(|f| f == "consult_bba"));
    assert_eq!((params.seat, params.dealer), (2, 0));
}

#[tokio::test]
async fn simple_variant_returns_same_shape() {
    let engine = ScriptedEngine::new(three_candidates());
    let app = ready_app(engine);

    let (_, strict) = post_json(&app, "/suggest", VALID_BODY).await;
    let (status, loose) = post_json(&app, "/suggest-simple", VALID_BODY).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(strict, loose);
}

#[tokio::test]
async fn repeated_requests_are_byte_identical() {
    let engine = ScriptedEngine::new(three_candidates());
    let app = ready_app(engine.clone());

    let (_, first) = post_raw(&app, "/suggest", VALID_BODY).await;
    let (_, second) = post_raw(&app, "/suggest", VALID_BODY).await;
    assert_eq!(first, second);
    assert_eq!(engine.session_count(), 2);
}

#[tokio::test]
async fn non_numeric_insta_score_fails_the_request() {
    let engine = ScriptedEngine::new(CandidateBatch {
        candidates: vec![
            RawCandidate::new("1S", 0.7),
            RawCandidate::new("2S", json!({ "odd": true })),
        ],
        passout: false,
    });
    let app = ready_app(engine);

    let (status, body) = post_json(&app, "/suggest", VALID_BODY).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "ENGINE_ERROR");
    assert!(body.get("candidates").is_none());
}

#[tokio::test]
async fn engine_failures_are_isolated_per_request() {
    let engine = ScriptedEngine::new(three_candidates());
    let app = ready_app(engine.clone());

    let (status, body) = post_json(&app, "/suggest", r#"{"hand":"fail","seat":0,"dealer":0}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("error processing bid")
    );

    let (status, _) = post_json(&app, "/suggest", r#"{"hand":"panic","seat":0,"dealer":0}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, body) = post_json(&app, "/suggest", VALID_BODY).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calls(&body).len(), 3);

    let (_, health) = get_json(&app, "/health").await;
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn slow_engine_hits_request_timeout() {
    let engine = ScriptedEngine::new(three_candidates());
    let app = ready_app_with_timeout(engine, Some(Duration::from_millis(50)));

    let (status, body) = post_json(&app, "/suggest", r#"{"hand":"slow","seat":0,"dealer":0}"#).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["code"], "ENGINE_TIMEOUT");
}

#[tokio::test]
async fn root_and_health_describe_a_ready_service() {
    let app = ready_app(ScriptedEngine::new(three_candidates()));

    let (status, body) = get_json(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "bidserve");
    assert_eq!(body["ready"], true);
    assert_eq!(body["endpoints"]["suggest_simple"], "/suggest-simple");

    let (_, health) = get_json(&app, "/health").await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["models_loaded"], true);
    assert_eq!(health["sampler_loaded"], true);
    assert_eq!(health["engine"], "scripted");
    assert_eq!(health["engine_path"], "/srv/engine");
    assert_eq!(health["load_ms"], 42);

    let (status, ready) = get_json(&app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ready["state"], "ready");

    let (_, smoke) = get_json(&app, "/test").await;
    assert_eq!(smoke["status"], "ok");
    assert_eq!(smoke["test_result"], "Opening bid suggestion: PASS");
}
