//! Engine error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the decision engine, from settings parsing through to a
/// single bidding session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("settings error: {0}")]
    Settings(String),

    #[error("unsupported settings format: {0}")]
    UnsupportedFormat(String),

    #[error("weights file not found: {}", .0.display())]
    WeightsNotFound(PathBuf),

    #[error("invalid weights in {path}: {message}")]
    Weights { path: String, message: String },

    /// The offending hand is kept for callers but left out of the message,
    /// which may end up in logs.
    #[error("invalid hand: {reason}")]
    InvalidHand { hand: String, reason: String },

    #[error("invalid call '{0}'")]
    InvalidCall(String),

    #[error("session failed: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub(crate) fn invalid_hand(hand: &str, reason: impl Into<String>) -> Self {
        Self::InvalidHand {
            hand: hand.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
