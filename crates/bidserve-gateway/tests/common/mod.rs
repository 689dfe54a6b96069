#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use bidserve_engine::{
    CandidateBatch, DecisionEngine, DecisionSession, EngineError, EngineResult, EngineSettings,
    SessionParams,
};
use bidserve_gateway::adapter::EngineAdapter;
use bidserve_gateway::build_router;
use bidserve_gateway::loader::LoadedResources;
use bidserve_gateway::readiness::ReadinessGate;
use bidserve_gateway::state::AppState;
use parking_lot::Mutex;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower::ServiceExt;

/// Hand that makes [`ScriptedEngine`] panic inside the session.
pub const PANIC_HAND: &str = "panic";
/// Hand that makes [`ScriptedEngine`] return an engine error.
pub const FAIL_HAND: &str = "fail";
/// Hand that makes [`ScriptedEngine`] stall for half a second.
pub const SLOW_HAND: &str = "slow";

/// Engine that replays a fixed batch and records how it was called.
#[derive(Default)]
pub struct ScriptedEngine {
    pub batch: CandidateBatch,
    pub sessions: AtomicUsize,
    pub last_params: Mutex<Option<SessionParams>>,
    pub last_auction: Mutex<Option<Vec<String>>>,
}

impl ScriptedEngine {
    pub fn new(batch: CandidateBatch) -> Arc<Self> {
        Arc::new(Self {
            batch,
            ..Default::default()
        })
    }

    pub fn session_count(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

struct ScriptedSession<'a> {
    engine: &'a ScriptedEngine,
    hand: String,
}

impl DecisionSession for ScriptedSession<'_> {
    fn bid_candidates(&mut self, auction: &[String]) -> EngineResult<CandidateBatch> {
        *self.engine.last_auction.lock() = Some(auction.to_vec());
        match self.hand.as_str() {
            PANIC_HAND => panic!("scripted engine blew up"),
            FAIL_HAND => Err(EngineError::Session("scripted failure".into())),
            SLOW_HAND => {
                std::thread::sleep(Duration::from_millis(500));
                Ok(self.engine.batch.clone())
            }
            _ => Ok(self.engine.batch.clone()),
        }
    }
}

impl DecisionEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn sampler_loaded(&self) -> bool {
        true
    }

    fn open_session<'a>(
        &'a self,
        params: SessionParams,
    ) -> EngineResult<Box<dyn DecisionSession + 'a>> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        let hand = params.hand.clone();
        *self.last_params.lock() = Some(params);
        Ok(Box::new(ScriptedSession { engine: self, hand }))
    }
}

pub fn resources_for(engine: Arc<dyn DecisionEngine>) -> LoadedResources {
    LoadedResources::new(
        PathBuf::from("/srv/engine"),
        PathBuf::from("/srv/engine/config/default.conf"),
        EngineSettings::default(),
        engine,
        Duration::from_millis(42),
    )
}

pub fn app_with_gate(gate: Arc<ReadinessGate>, timeout: Option<Duration>) -> Router {
    let state = Arc::new(AppState::new(gate, EngineAdapter::new(timeout)));
    build_router(state, true)
}

/// Router over a gate that is already `Ready` with `engine`.
pub fn ready_app(engine: Arc<dyn DecisionEngine>) -> Router {
    ready_app_with_timeout(engine, None)
}

pub fn ready_app_with_timeout(engine: Arc<dyn DecisionEngine>, timeout: Option<Duration>) -> Router {
    let gate = Arc::new(ReadinessGate::new());
    gate.begin_loading().expect("begin loading");
    gate.mark_ready(resources_for(engine)).expect("mark ready");
    app_with_gate(gate, timeout)
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, body.to_vec())
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).expect("json body"))
}

pub async fn post_raw(app: &Router, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let (status, body) = post_raw(app, uri, body).await;
    (status, serde_json::from_slice(&body).expect("json body"))
}
