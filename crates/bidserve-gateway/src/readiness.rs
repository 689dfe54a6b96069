//! Process-wide readiness state machine
//!
//! ```text
//! NotStarted ──▶ Loading ──▶ Ready
//!                   │
//!                   └──────▶ Failed(reason)
//! ```
//!
//! `Ready` and `Failed` are terminal. The resource loader is the only writer;
//! every request handler reads. Loaded resources are published in the same
//! critical section as the `Ready` transition, so a reader that observes
//! `Ready` always finds them.

use crate::loader::LoadedResources;
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ServiceReadiness {
    #[default]
    NotStarted,
    Loading,
    Ready,
    Failed { reason: String },
}

impl ServiceReadiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceReadiness::NotStarted => "not_started",
            ServiceReadiness::Loading => "loading",
            ServiceReadiness::Ready => "ready",
            ServiceReadiness::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ServiceReadiness::Ready | ServiceReadiness::Failed { .. }
        )
    }
}

impl fmt::Display for ServiceReadiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot returned by [`ReadinessGate::status_detail`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusDetail {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal readiness transition {from} -> {to}")]
pub struct TransitionError {
    pub from: &'static str,
    pub to: &'static str,
}

#[derive(Default)]
pub struct ReadinessGate {
    state: RwLock<ServiceReadiness>,
    resources: OnceLock<Arc<LoadedResources>>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ServiceReadiness {
        self.state.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        *self.state.read() == ServiceReadiness::Ready
    }

    pub fn status_detail(&self) -> StatusDetail {
        let state = self.state();
        let reason = match &state {
            ServiceReadiness::Failed { reason } => Some(reason.clone()),
            _ => None,
        };
        StatusDetail {
            state: state.as_str(),
            reason,
        }
    }

    /// Loaded resources, only once the gate is `Ready`.
    pub fn resources(&self) -> Option<Arc<LoadedResources>> {
        if self.is_ready() {
            self.resources.get().cloned()
        } else {
            None
        }
    }

    /// `NotStarted -> Loading`
    pub fn begin_loading(&self) -> Result<(), TransitionError> {
        let mut guard = self.state.write();
        if *guard != ServiceReadiness::NotStarted {
            return Err(TransitionError {
                from: guard.as_str(),
                to: "loading",
            });
        }
        *guard = ServiceReadiness::Loading;
        Ok(())
    }

    /// `Loading -> Ready`, publishing the loaded resources.
    pub fn mark_ready(
        &self,
        resources: LoadedResources,
    ) -> Result<Arc<LoadedResources>, TransitionError> {
        let mut guard = self.state.write();
        if *guard != ServiceReadiness::Loading {
            return Err(TransitionError {
                from: guard.as_str(),
                to: "ready",
            });
        }
        let resources = Arc::new(resources);
        // only reachable once: Loading is left in this same critical section
        let _ = self.resources.set(Arc::clone(&resources));
        *guard = ServiceReadiness::Ready;
        Ok(resources)
    }

    /// `Loading -> Failed(reason)`
    pub fn mark_failed(&self, reason: impl Into<String>) -> Result<(), TransitionError> {
        let mut guard = self.state.write();
        if *guard != ServiceReadiness::Loading {
            return Err(TransitionError {
                from: guard.as_str(),
                to: "failed",
            });
        }
        *guard = ServiceReadiness::Failed {
            reason: reason.into(),
        };
        Ok(())
    }
}
