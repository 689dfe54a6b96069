//! Service configuration
//!
//! Layers, later ones winning:
//!
//! 1. built-in defaults ([`ServiceConfig::default`])
//! 2. an optional file named by `BIDSERVE_CONFIG` (format from its extension)
//! 3. `BIDSERVE__*` environment variables, e.g. `BIDSERVE__REQUEST_TIMEOUT_MS`
//! 4. `ENGINE_PATH` and `PORT`

use config::{Config as Cfg, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming an optional configuration file.
pub const CONFIG_FILE_ENV: &str = "BIDSERVE_CONFIG";
/// Environment variable overriding the engine installation root.
pub const ENGINE_PATH_ENV: &str = "ENGINE_PATH";
/// Environment variable overriding the listening port.
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Runtime configuration for the bid service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Interface to bind (default: `0.0.0.0`).
    pub host: String,
    /// TCP port to listen on (default: 8000).
    pub port: u16,
    /// Extra engine installation root. Tried after `root_candidates`, so it
    /// only applies when none of the default locations exist.
    pub engine_path: Option<String>,
    /// Installation roots tried in order; the first existing one wins.
    pub root_candidates: Vec<String>,
    /// Settings files tried in order, relative to the installation root.
    pub config_candidates: Vec<String>,
    /// How deep to list the installation root when no settings file is found.
    pub diagnostic_depth: usize,
    /// Upper bound on a single engine call. `0` disables the limit.
    pub request_timeout_ms: u64,
    /// Exit the process when loading fails instead of staying up to report it.
    pub exit_on_load_failure: bool,
    pub log_format: LogFormat,
    /// Allow any origin, method and header.
    pub cors_permissive: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            engine_path: None,
            root_candidates: vec![
                "/app/engine".to_string(),
                "/content/engine".to_string(),
                "./engine".to_string(),
                "../engine".to_string(),
            ],
            config_candidates: vec![
                "config/default.conf".to_string(),
                "default.conf".to_string(),
            ],
            diagnostic_depth: 2,
            request_timeout_ms: 60_000,
            exit_on_load_failure: false,
            log_format: LogFormat::Pretty,
            cors_permissive: true,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var(CONFIG_FILE_ENV).ok();
        Self::from_sources(file.as_deref())
    }

    /// Load configuration with an explicit (optional) file layer.
    pub fn from_sources(file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Cfg::builder().add_source(Cfg::try_from(&ServiceConfig::default())?);

        if let Some(path) = file {
            builder = builder.add_source(File::with_name(path));
        }

        let port = std::env::var(PORT_ENV)
            .ok()
            .and_then(|p| p.trim().parse::<u16>().ok())
            .map(i64::from);
        let engine_path = std::env::var(ENGINE_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty());

        builder
            .add_source(
                Environment::with_prefix("BIDSERVE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("root_candidates")
                    .with_list_parse_key("config_candidates"),
            )
            .set_override_option("port", port)?
            .set_override_option("engine_path", engine_path)?
            .build()?
            .try_deserialize()
    }

    /// Installation roots in the order they are tried, `engine_path` last.
    pub fn root_candidates(&self) -> Vec<PathBuf> {
        self.root_candidates
            .iter()
            .chain(self.engine_path.iter())
            .map(PathBuf::from)
            .collect()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
