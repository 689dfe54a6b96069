//! Identity, liveness and readiness endpoints
//!
//! GET /        - service identity and endpoint map
//! GET /health  - liveness probe, never gated
//! GET /ready   - readiness probe (200 ready, 503 otherwise)
//!
//! None of these consult the gate before answering; they report on it.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use std::sync::Arc;

use crate::readiness::ServiceReadiness;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "bidserve";

/// GET / - service identity
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "online",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "state": state.gate.state().as_str(),
        "ready": state.gate.is_ready(),
        "endpoints": {
            "health": "/health",
            "ready": "/ready",
            "suggest": "/suggest",
            "suggest_simple": "/suggest-simple",
            "test": "/test",
        }
    }))
}

/// GET /health - liveness probe
///
/// Always 200 while the process is alive, whatever the load state.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.gate.state();
    let resources = state.gate.resources();

    let (status, error) = match &readiness {
        ServiceReadiness::Ready => ("healthy", None),
        ServiceReadiness::Failed { reason } => ("failed", Some(reason.clone())),
        ServiceReadiness::NotStarted | ServiceReadiness::Loading => ("loading", None),
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": status,
            "models_loaded": resources.is_some(),
            "sampler_loaded": resources.as_ref().is_some_and(|r| r.sampler_loaded()),
            "engine": resources.as_ref().map(|r| r.engine_name().to_string()),
            "engine_path": resources.as_ref().map(|r| r.root.display().to_string()),
            "load_ms": resources.as_ref().map(|r| r.load_time.as_millis() as u64),
            "ready_for_requests": readiness == ServiceReadiness::Ready,
            "error": error,
        })),
    )
}

/// GET /ready - readiness probe
pub async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let detail = state.gate.status_detail();
    let status = if state.gate.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(detail))
}

/// Build the health router sub-tree
pub fn health_router() -> axum::Router<Arc<AppState>> {
    use axum::routing::get;
    axum::Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready))
}
