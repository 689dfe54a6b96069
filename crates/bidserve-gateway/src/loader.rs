//! One-shot engine resource loading
//!
//! The loader locates the engine installation, parses its settings file and
//! builds the engine exactly once per process. It runs on a blocking thread
//! while the HTTP listener is already accepting connections, and reports its
//! outcome through the [`ReadinessGate`].

use crate::config::ServiceConfig;
use crate::error::LoadError;
use crate::readiness::ReadinessGate;
use bidserve_engine::{DecisionEngine, EngineBuilder, EngineSettings};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Auxiliary convention-bot features that are forced off for every engine
/// this service builds, regardless of what the settings file says.
pub const DISABLED_AUX_FEATURES: &[&str] = &[
    "consult_bba",
    "use_bba",
    "use_bba_to_count_aces",
    "use_bba_to_count_keycards",
    "use_bba_to_estimate_shape",
    "use_bba_for_sampling",
];

/// Cap on entries logged by the diagnostic directory listing.
const MAX_LISTED_ENTRIES: usize = 200;

/// Everything produced by a successful load. Immutable once published.
pub struct LoadedResources {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub settings: EngineSettings,
    pub(crate) engine: Arc<dyn DecisionEngine>,
    pub load_time: Duration,
}

impl LoadedResources {
    pub fn new(
        root: PathBuf,
        config_path: PathBuf,
        settings: EngineSettings,
        engine: Arc<dyn DecisionEngine>,
        load_time: Duration,
    ) -> Self {
        Self {
            root,
            config_path,
            settings,
            engine,
            load_time,
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn sampler_loaded(&self) -> bool {
        self.engine.sampler_loaded()
    }
}

impl fmt::Debug for LoadedResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedResources")
            .field("root", &self.root)
            .field("config_path", &self.config_path)
            .field("engine", &self.engine.name())
            .field("load_time", &self.load_time)
            .finish()
    }
}

pub struct ResourceLoader {
    root_candidates: Vec<PathBuf>,
    config_candidates: Vec<String>,
    diagnostic_depth: usize,
    builder: Arc<dyn EngineBuilder>,
}

impl ResourceLoader {
    pub fn new(builder: Arc<dyn EngineBuilder>) -> Self {
        let defaults = ServiceConfig::default();
        Self::from_config(&defaults, builder)
    }

    pub fn from_config(config: &ServiceConfig, builder: Arc<dyn EngineBuilder>) -> Self {
        Self {
            root_candidates: config.root_candidates(),
            config_candidates: config.config_candidates.clone(),
            diagnostic_depth: config.diagnostic_depth,
            builder,
        }
    }

    pub fn with_root_candidates(mut self, roots: Vec<PathBuf>) -> Self {
        self.root_candidates = roots;
        self
    }

    pub fn with_config_candidates(mut self, candidates: Vec<String>) -> Self {
        self.config_candidates = candidates;
        self
    }

    pub fn with_diagnostic_depth(mut self, depth: usize) -> Self {
        self.diagnostic_depth = depth;
        self
    }

    /// First candidate that exists as a directory.
    pub fn resolve_root(&self) -> Result<PathBuf, LoadError> {
        for candidate in &self.root_candidates {
            if candidate.is_dir() {
                return Ok(candidate.clone());
            }
        }
        Err(LoadError::ResourceNotFound {
            searched: self.root_candidates.clone(),
        })
    }

    /// First settings file that exists under `root`. On failure the root's
    /// contents are logged to help diagnose a broken installation.
    pub fn resolve_config(&self, root: &Path) -> Result<PathBuf, LoadError> {
        for candidate in &self.config_candidates {
            let path = root.join(candidate);
            if path.is_file() {
                return Ok(path);
            }
        }

        warn!(
            root = %root.display(),
            tried = ?self.config_candidates,
            "no engine settings file found, listing installation"
        );
        let mut listed = 0;
        log_tree(root, 0, self.diagnostic_depth, &mut listed);

        Err(LoadError::ConfigNotFound {
            root: root.to_path_buf(),
            candidates: self.config_candidates.clone(),
        })
    }

    /// Run the whole load on the current thread. Slow; call from a blocking
    /// context.
    pub fn load(&self) -> Result<LoadedResources, LoadError> {
        let started = Instant::now();

        let root = self.resolve_root()?;
        info!(
            stage = "resolve_root",
            root = %root.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "engine installation found"
        );

        let config_path = self.resolve_config(&root)?;
        info!(
            stage = "resolve_config",
            config = %config_path.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "engine settings found"
        );

        let settings = self.builder.parse_settings(&config_path)?;
        info!(
            stage = "parse_config",
            elapsed_ms = started.elapsed().as_millis() as u64,
            "engine settings parsed"
        );

        // The builder constructs the models and then switches the aux
        // features off, so the stage logs follow that order.
        let engine = self.builder.build(&settings, &root, DISABLED_AUX_FEATURES)?;
        let load_time = started.elapsed();
        info!(
            stage = "build_models",
            engine = engine.name(),
            sampler = engine.sampler_loaded(),
            elapsed_ms = load_time.as_millis() as u64,
            "engine models loaded"
        );
        info!(
            stage = "disable_aux",
            features = ?DISABLED_AUX_FEATURES,
            elapsed_ms = load_time.as_millis() as u64,
            "auxiliary features forced off"
        );

        Ok(LoadedResources::new(
            root,
            config_path,
            settings,
            engine,
            load_time,
        ))
    }

    /// Drive the gate through `Loading` to `Ready` or `Failed`.
    pub async fn run(self, gate: Arc<ReadinessGate>) -> Result<Arc<LoadedResources>, LoadError> {
        gate.begin_loading()?;
        info!("loading engine resources");

        let outcome = tokio::task::spawn_blocking(move || self.load())
            .await
            .map_err(|e| LoadError::Join(e.to_string()))
            .and_then(|result| result);

        match outcome {
            Ok(resources) => {
                let resources = gate.mark_ready(resources)?;
                info!(
                    load_ms = resources.load_time.as_millis() as u64,
                    "service ready"
                );
                Ok(resources)
            }
            Err(err) => {
                error!(error = %err, "engine resources failed to load");
                gate.mark_failed(err.to_string())?;
                Err(err)
            }
        }
    }
}

fn log_tree(dir: &Path, depth: usize, max_depth: usize, listed: &mut usize) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "cannot list directory");
            return;
        }
    };

    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();

    for path in paths {
        if *listed >= MAX_LISTED_ENTRIES {
            warn!("listing truncated");
            return;
        }
        *listed += 1;

        let is_dir = path.is_dir();
        warn!(depth, dir = is_dir, path = %path.display(), "installation entry");
        if is_dir && depth + 1 < max_depth {
            log_tree(&path, depth + 1, max_depth, listed);
        }
    }
}
