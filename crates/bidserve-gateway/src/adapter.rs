//! Boundary between the service and the decision engine
//!
//! Every request gets its own session, opened and dropped on a blocking
//! thread. Engine failures of any kind, panics included, come back as
//! [`ServiceError::Engine`] and never take the process down.

use crate::error::{ServiceError, ServiceResult};
use crate::loader::{DISABLED_AUX_FEATURES, LoadedResources};
use crate::translator::ValidatedRequest;
use bidserve_engine::{CandidateBatch, EngineResult, RawCandidate, SessionParams};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// One engine candidate with its optional fields made explicit.
#[derive(Debug, Clone, PartialEq)]
pub struct BidCandidate {
    pub call: String,
    pub insta_score: Value,
    /// `None` when the engine did not compute one. A JSON `null` counts as
    /// not computed.
    pub expected_score: Option<Value>,
    pub explanation: Option<String>,
}

impl From<RawCandidate> for BidCandidate {
    fn from(raw: RawCandidate) -> Self {
        Self {
            call: raw.bid,
            insta_score: raw.insta_score,
            expected_score: raw.expected_score.filter(|v| !v.is_null()),
            explanation: raw.explanation,
        }
    }
}

/// Engine output for one request, in engine order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionResult {
    pub passout: bool,
    pub candidates: Vec<BidCandidate>,
}

impl From<CandidateBatch> for SuggestionResult {
    fn from(batch: CandidateBatch) -> Self {
        Self {
            passout: batch.passout,
            candidates: batch.candidates.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineAdapter {
    timeout: Option<Duration>,
}

impl EngineAdapter {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub async fn get_candidates(
        &self,
        resources: Arc<LoadedResources>,
        request: &ValidatedRequest,
    ) -> ServiceResult<SuggestionResult> {
        let params = SessionParams {
            vulnerability: request.vulnerability,
            hand: request.hand.clone(),
            seat: request.seat,
            dealer: request.dealer,
            aux_integration: false,
            disabled_features: DISABLED_AUX_FEATURES
                .iter()
                .map(|f| f.to_string())
                .collect(),
            verbose: request.verbose,
        };
        let auction = request.auction.clone();

        let task = tokio::task::spawn_blocking(move || run_session(&resources, params, &auction));

        let joined = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| ServiceError::Timeout(limit))?,
            None => task.await,
        };

        let batch = match joined {
            Ok(result) => result?,
            Err(e) if e.is_panic() => {
                error!("decision engine panicked");
                return Err(ServiceError::Engine("engine panicked".into()));
            }
            Err(e) => return Err(ServiceError::Engine(e.to_string())),
        };

        debug!(
            passout = batch.passout,
            candidates = batch.candidates.len(),
            "engine returned"
        );
        Ok(batch.into())
    }
}

fn run_session(
    resources: &LoadedResources,
    params: SessionParams,
    auction: &[String],
) -> EngineResult<CandidateBatch> {
    let mut session = resources.engine.open_session(params)?;
    let batch = session.bid_candidates(auction)?;
    Ok(batch)
}
