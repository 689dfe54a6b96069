//! Outbound response shaping
//!
//! `insta_score` is required: a candidate whose score cannot be read as a
//! finite number fails the whole request. `expected_score` is best effort and
//! is dropped silently when it cannot be read. Candidate order is never
//! changed.

use crate::adapter::{BidCandidate, SuggestionResult};
use crate::error::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePayload {
    pub call: String,
    pub insta_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub passout: bool,
    pub candidates: Vec<CandidatePayload>,
    pub hand: String,
    pub auction: Vec<String>,
}

/// Read an engine score as a finite `f64`.
///
/// Numbers, numeric strings and booleans are accepted; anything else, and
/// any NaN or infinity, is not.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn required_score(candidate: &BidCandidate) -> ServiceResult<f64> {
    coerce_number(&candidate.insta_score).ok_or_else(|| {
        ServiceError::Engine(format!(
            "candidate {} has non-numeric insta_score {}",
            candidate.call, candidate.insta_score
        ))
    })
}

/// Typed response for `/suggest`.
pub fn shape(
    result: SuggestionResult,
    hand: &str,
    auction: &[String],
) -> ServiceResult<SuggestResponse> {
    let candidates = result
        .candidates
        .into_iter()
        .map(|c| {
            if c.call.is_empty() {
                return Err(ServiceError::Engine("candidate without a call".into()));
            }
            let insta_score = required_score(&c)?;
            Ok(CandidatePayload {
                insta_score,
                expected_score: c.expected_score.as_ref().and_then(coerce_number),
                explanation: c.explanation,
                call: c.call,
            })
        })
        .collect::<ServiceResult<Vec<_>>>()?;

    Ok(SuggestResponse {
        passout: result.passout,
        candidates,
        hand: hand.to_string(),
        auction: auction.to_vec(),
    })
}

/// Untyped response for `/suggest-simple`. Same fields and coercion rules,
/// but candidates are emitted as plain JSON objects with no further schema
/// checks.
pub fn shape_loose(result: SuggestionResult, hand: &str, auction: &[String]) -> ServiceResult<Value> {
    let mut candidates = Vec::with_capacity(result.candidates.len());
    for c in result.candidates {
        let mut obj = Map::new();
        obj.insert("insta_score".into(), json!(required_score(&c)?));
        if let Some(es) = c.expected_score.as_ref().and_then(coerce_number) {
            obj.insert("expected_score".into(), json!(es));
        }
        if let Some(explanation) = c.explanation {
            obj.insert("explanation".into(), Value::String(explanation));
        }
        obj.insert("call".into(), Value::String(c.call));
        candidates.push(Value::Object(obj));
    }

    Ok(json!({
        "passout": result.passout,
        "candidates": candidates,
        "hand": hand,
        "auction": auction,
    }))
}
