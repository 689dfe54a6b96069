//! Axum-based HTTP server for the bid service.
//!
//! [`BidServer`] binds the listener first and loads the engine in the
//! background, so liveness probes answer for the whole load.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Service identity and endpoint map. |
//! | `GET`  | `/health` | Liveness and load detail. Always `200 OK`. |
//! | `GET`  | `/ready` | `200` once loaded, `503` with the reason otherwise. |
//! | `POST` | `/suggest` | Ranked bid candidates, strict response schema. |
//! | `POST` | `/suggest-simple` | Same, untyped response. |
//! | `GET`  | `/test` | Fixed-hand smoke test. |

use crate::adapter::EngineAdapter;
use crate::config::ServiceConfig;
use crate::error::ServeError;
use crate::handlers::{health_router, suggest_router};
use crate::loader::ResourceLoader;
use crate::readiness::{ReadinessGate, ServiceReadiness};
use crate::state::AppState;
use axum::Router;
use bidserve_engine::EngineBuilder;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Build the full router over an existing state.
pub fn build_router(state: Arc<AppState>, cors_permissive: bool) -> Router {
    let router = Router::new()
        .merge(health_router())
        .merge(suggest_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

pub struct BidServer {
    config: ServiceConfig,
    builder: Arc<dyn EngineBuilder>,
}

impl BidServer {
    pub fn new(config: ServiceConfig, builder: Arc<dyn EngineBuilder>) -> Self {
        Self { config, builder }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Bind, start loading, and serve until ctrl-c or SIGTERM.
    ///
    /// With `exit_on_load_failure` set, a failed load also shuts the server
    /// down and is returned as [`ServeError::LoadFailed`].
    pub async fn start(self) -> Result<(), ServeError> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves. The
    /// listener is bound before loading starts, so `/health` answers for the
    /// whole load.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let gate = Arc::new(ReadinessGate::new());
        let adapter = EngineAdapter::new(self.config.request_timeout());
        let state = Arc::new(AppState::new(Arc::clone(&gate), adapter));
        let app = build_router(state, self.config.cors_permissive);

        info!(
            addr = %listener.local_addr()?,
            timeout_ms = self.config.request_timeout_ms,
            "bidserve listening"
        );

        let load_failed = Arc::new(Notify::new());
        let exit_on_failure = self.config.exit_on_load_failure;
        let loader = ResourceLoader::from_config(&self.config, Arc::clone(&self.builder));
        {
            let gate = Arc::clone(&gate);
            let load_failed = Arc::clone(&load_failed);
            tokio::spawn(async move {
                if loader.run(gate).await.is_err() {
                    if exit_on_failure {
                        load_failed.notify_one();
                    } else {
                        warn!("staying up to report the load failure on /health");
                    }
                }
            });
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown => {}
                    _ = load_failed.notified() => warn!("resource load failed, shutting down"),
                }
            })
            .await?;

        match gate.state() {
            ServiceReadiness::Failed { reason } if exit_on_failure => {
                Err(ServeError::LoadFailed(reason))
            }
            _ => {
                info!("bidserve stopped");
                Ok(())
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("ctrl-c received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
