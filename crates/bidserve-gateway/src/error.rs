//! Service error types

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crate::readiness::TransitionError;
use bidserve_engine::EngineError;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Startup failures. Any of these leaves the service in the `failed` state.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("engine installation not found (searched: {})", join_paths(.searched))]
    ResourceNotFound { searched: Vec<PathBuf> },

    #[error(
        "engine configuration not found under {} (tried: {})",
        .root.display(),
        .candidates.join(", ")
    )]
    ConfigNotFound {
        root: PathBuf,
        candidates: Vec<String>,
    },

    #[error("engine failed to load: {0}")]
    Engine(#[from] EngineError),

    #[error("loader task failed: {0}")]
    Join(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Client-caused request problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("hand must be a non-empty string")]
    EmptyHand,

    #[error("field '{0}' is required")]
    MissingField(&'static str),

    #[error("{field} must be between 0 and 3, got {value}")]
    InvalidRange { field: &'static str, value: i64 },

    #[error("malformed request body: {0}")]
    Malformed(String),
}

/// Per-request failures, each mapped to a distinct HTTP status.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotReady(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("error processing bid: {0}")]
    Engine(String),

    #[error("engine did not answer within {} ms", .0.as_millis())]
    Timeout(Duration),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotReady(_) => "NOT_READY",
            ServiceError::Validation(_) => "VALIDATION_FAILED",
            ServiceError::Engine(_) => "ENGINE_ERROR",
            ServiceError::Timeout(_) => "ENGINE_TIMEOUT",
        }
    }
}

impl From<EngineError> for ServiceError {
    fn from(err: EngineError) -> Self {
        ServiceError::Engine(err.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert("retry-after", axum::http::HeaderValue::from_static("30"));
        }
        response
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures that stop [`crate::server::BidServer::start`] or [`crate::server::BidServer::serve`].
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("resource loading failed: {0}")]
    LoadFailed(String),
}
