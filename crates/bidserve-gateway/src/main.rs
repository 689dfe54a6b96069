//! bidserve: entry point.
//!
//! Reads layered configuration and starts the HTTP service with the built-in
//! heuristic engine.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PORT` | `8000` | TCP port to listen on. |
//! | `ENGINE_PATH` | *(none)* | Extra installation root, tried after the defaults. |
//! | `BIDSERVE_CONFIG` | *(none)* | Optional service configuration file. |
//! | `BIDSERVE__<FIELD>` | | Override any configuration field. |
//! | `RUST_LOG` | `bidserve_gateway=info,bidserve_engine=info,tower_http=info` | Log filter. |

use anyhow::Context;
use bidserve_engine::HeuristicBuilder;
use bidserve_gateway::config::{LogFormat, ServiceConfig};
use bidserve_gateway::server::BidServer;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "bidserve_gateway=info,bidserve_engine=info,tower_http=info";

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load().context("invalid service configuration")?;
    init_tracing(config.log_format);

    info!(
        addr = %config.bind_addr(),
        engine_path = ?config.engine_path,
        exit_on_load_failure = config.exit_on_load_failure,
        "bidserve configuration loaded"
    );

    BidServer::new(config, Arc::new(HeuristicBuilder))
        .start()
        .await
        .context("bidserve terminated")?;
    Ok(())
}
