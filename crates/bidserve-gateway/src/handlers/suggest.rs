//! Bid suggestion endpoints
//!
//! POST /suggest         - validated request, typed response
//! POST /suggest-simple  - same request, untyped response
//! GET  /test            - fixed-hand smoke test, always 200
//!
//! Readiness is checked before the body is even decoded, so a request that
//! arrives early gets 503 whatever it contains.

use axum::{Json, body::Bytes, extract::State, response::IntoResponse};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapter::SuggestionResult;
use crate::error::{ServiceError, ServiceResult};
use crate::loader::LoadedResources;
use crate::readiness::{ReadinessGate, ServiceReadiness};
use crate::shaper::{SuggestResponse, shape, shape_loose};
use crate::state::AppState;
use crate::translator::{ValidatedRequest, parse_body, translate};
use bidserve_engine::Vulnerability;

const SMOKE_HAND: &str = "KQJ97.AT2.987.AK";

/// Loaded resources, or the 503 a caller should see instead.
fn ready_resources(gate: &ReadinessGate) -> ServiceResult<Arc<LoadedResources>> {
    if let Some(resources) = gate.resources() {
        return Ok(resources);
    }
    let message = match gate.state() {
        ServiceReadiness::Failed { reason } => format!("engine failed to load: {reason}"),
        other => format!("engine is {other}, retry shortly"),
    };
    Err(ServiceError::NotReady(message))
}

async fn run_suggestion(
    state: &AppState,
    body: &[u8],
    endpoint: &'static str,
) -> ServiceResult<(ValidatedRequest, SuggestionResult)> {
    let request_id = Uuid::new_v4();
    let resources = ready_resources(&state.gate).inspect_err(|e| {
        debug!(request_id = %request_id, endpoint, error = %e, "rejected, not ready");
    })?;

    let request = parse_body(body).and_then(translate).inspect_err(|e| {
        warn!(request_id = %request_id, endpoint, stage = "validate", error = %e, "invalid request");
    })?;

    info!(
        request_id = %request_id,
        endpoint,
        seat = request.seat,
        dealer = request.dealer,
        hand_len = request.hand.len(),
        auction_len = request.auction.len(),
        "suggestion requested"
    );
    debug!(request_id = %request_id, hand = %request.hand, auction = ?request.auction, "request payload");

    let started = Instant::now();
    let result = state
        .adapter
        .get_candidates(resources, &request)
        .await
        .inspect_err(|e| {
            warn!(request_id = %request_id, endpoint, stage = "engine", code = e.code(), "engine call failed");
            debug!(request_id = %request_id, error = %e, "engine failure detail");
        })?;

    info!(
        request_id = %request_id,
        endpoint,
        passout = result.passout,
        candidates = result.candidates.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "suggestion served"
    );
    Ok((request, result))
}

/// POST /suggest
pub async fn suggest(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ServiceResult<Json<SuggestResponse>> {
    let (request, result) = run_suggestion(&state, &body, "suggest").await?;
    let response = shape(result, &request.hand, &request.auction).inspect_err(|e| {
        warn!(stage = "shape", code = e.code(), "engine output rejected");
        debug!(error = %e, "engine output detail");
    })?;
    Ok(Json(response))
}

/// POST /suggest-simple
pub async fn suggest_simple(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ServiceResult<Json<Value>> {
    let (request, result) = run_suggestion(&state, &body, "suggest_simple").await?;
    let response = shape_loose(result, &request.hand, &request.auction).inspect_err(|e| {
        warn!(stage = "shape", code = e.code(), "engine output rejected");
        debug!(error = %e, "engine output detail");
    })?;
    Ok(Json(response))
}

/// GET /test - run a fixed opening hand through the engine
pub async fn smoke_test(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resources = match ready_resources(&state.gate) {
        Ok(resources) => resources,
        Err(e) => {
            return Json(json!({
                "status": "not_ready",
                "error": e.to_string(),
                "ready": false,
            }));
        }
    };

    let request = ValidatedRequest {
        hand: SMOKE_HAND.to_string(),
        auction: Vec::new(),
        seat: 2,
        dealer: 0,
        vulnerability: Vulnerability::default(),
        verbose: false,
    };

    match state.adapter.get_candidates(resources, &request).await {
        Ok(result) => {
            let top = result
                .candidates
                .first()
                .map_or("PASS", |c| c.call.as_str());
            Json(json!({
                "status": "ok",
                "test_result": format!("Opening bid suggestion: {top}"),
                "ready": true,
            }))
        }
        Err(e) => {
            warn!(error = %e, "smoke test failed");
            Json(json!({
                "status": "error",
                "error": e.to_string(),
                "ready": false,
            }))
        }
    }
}

/// Build the suggestion router sub-tree
pub fn suggest_router() -> axum::Router<Arc<AppState>> {
    use axum::routing::{get, post};
    axum::Router::new()
        .route("/suggest", post(suggest))
        .route("/suggest-simple", post(suggest_simple))
        .route("/test", get(smoke_test))
}
