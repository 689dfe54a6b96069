//! Shared application state for the bid service

use crate::adapter::EngineAdapter;
use crate::readiness::ReadinessGate;
use std::sync::Arc;

/// State shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Readiness gate - the only path to the loaded engine
    pub gate: Arc<ReadinessGate>,
    /// Per-request engine boundary
    pub adapter: EngineAdapter,
}

impl AppState {
    pub fn new(gate: Arc<ReadinessGate>, adapter: EngineAdapter) -> Self {
        Self { gate, adapter }
    }
}
