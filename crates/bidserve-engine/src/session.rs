//! Decision engine contracts
//!
//! | Contract | Role |
//! |----------|------|
//! | [`EngineBuilder`] | Parses settings and builds a loaded engine once at startup. |
//! | [`DecisionEngine`] | Shared, read-only loaded engine; opens one session per request. |
//! | [`DecisionSession`] | Short-lived state for one hand, seat and dealer. |
//!
//! Engine output is deliberately loose: scores arrive as JSON values and may
//! be missing, so callers coerce them at their own boundary.

use crate::error::EngineResult;
use crate::settings::EngineSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Vulnerability of the two partnerships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub ns: bool,
    pub ew: bool,
}

impl Vulnerability {
    pub fn new(ns: bool, ew: bool) -> Self {
        Self { ns, ew }
    }

    /// Whether the partnership `seat` belongs to is vulnerable.
    /// Seats 0 and 2 sit North-South.
    pub fn for_seat(self, seat: u8) -> bool {
        if seat % 2 == 0 { self.ns } else { self.ew }
    }
}

/// Everything a session is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    pub vulnerability: Vulnerability,
    pub hand: String,
    pub seat: u8,
    pub dealer: u8,
    /// Let an auxiliary convention bot steer the session.
    pub aux_integration: bool,
    /// Auxiliary features that must stay off for this session.
    pub disabled_features: Vec<String>,
    pub verbose: bool,
}

/// One candidate as produced by the engine, before any coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub bid: String,
    pub insta_score: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_score: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl RawCandidate {
    pub fn new(bid: impl Into<String>, insta_score: impl Into<Value>) -> Self {
        Self {
            bid: bid.into(),
            insta_score: insta_score.into(),
            expected_score: None,
            explanation: None,
        }
    }

    pub fn with_expected_score(mut self, score: impl Into<Value>) -> Self {
        self.expected_score = Some(score.into());
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

/// Candidates in engine order plus the terminal-auction flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateBatch {
    pub candidates: Vec<RawCandidate>,
    pub passout: bool,
}

/// Per-request session. Never shared or reused.
pub trait DecisionSession {
    fn bid_candidates(&mut self, auction: &[String]) -> EngineResult<CandidateBatch>;
}

/// A fully loaded engine, shared read-only by every request.
pub trait DecisionEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Whether a sampler was constructed alongside the models.
    fn sampler_loaded(&self) -> bool;

    fn open_session<'a>(
        &'a self,
        params: SessionParams,
    ) -> EngineResult<Box<dyn DecisionSession + 'a>>;
}

/// Builds an engine from an installation root. Both calls may be slow and
/// are expected to run on a blocking thread.
pub trait EngineBuilder: Send + Sync {
    fn parse_settings(&self, path: &Path) -> EngineResult<EngineSettings>;

    /// Construct models and sampler, forcing every feature in `disabled` off.
    fn build(
        &self,
        settings: &EngineSettings,
        root: &Path,
        disabled: &[&str],
    ) -> EngineResult<Arc<dyn DecisionEngine>>;
}
