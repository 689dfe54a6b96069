//! Inbound request validation
//!
//! Turns the loosely-typed JSON body of `/suggest` into a [`ValidatedRequest`].
//! Only shape is checked here; card and call legality belong to the engine.

use crate::error::ValidationError;
use bidserve_engine::Vulnerability;
use serde::{Deserialize, Serialize};

/// Request body as sent by clients. Every field is optional at this stage so
/// that a missing field is reported as a validation failure rather than a
/// deserialization error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub hand: Option<String>,
    pub auction: Option<Vec<String>>,
    pub seat: Option<i64>,
    pub dealer: Option<i64>,
    pub vuln_ns: Option<bool>,
    pub vuln_ew: Option<bool>,
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub hand: String,
    pub auction: Vec<String>,
    pub seat: u8,
    pub dealer: u8,
    pub vulnerability: Vulnerability,
    pub verbose: bool,
}

/// Decode a raw body. Anything that is not a JSON object of the right field
/// types is `Malformed`.
pub fn parse_body(body: &[u8]) -> Result<SuggestRequest, ValidationError> {
    serde_json::from_slice(body).map_err(|e| ValidationError::Malformed(e.to_string()))
}

pub fn translate(raw: SuggestRequest) -> Result<ValidatedRequest, ValidationError> {
    let hand = raw.hand.ok_or(ValidationError::MissingField("hand"))?;
    if hand.trim().is_empty() {
        return Err(ValidationError::EmptyHand);
    }

    let seat = position("seat", raw.seat)?;
    let dealer = position("dealer", raw.dealer)?;

    Ok(ValidatedRequest {
        hand,
        auction: raw.auction.unwrap_or_default(),
        seat,
        dealer,
        vulnerability: Vulnerability::new(
            raw.vuln_ns.unwrap_or(false),
            raw.vuln_ew.unwrap_or(false),
        ),
        verbose: raw.verbose.unwrap_or(false),
    })
}

fn position(field: &'static str, value: Option<i64>) -> Result<u8, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField(field))?;
    match u8::try_from(value) {
        Ok(v) if v <= 3 => Ok(v),
        _ => Err(ValidationError::InvalidRange { field, value }),
    }
}
