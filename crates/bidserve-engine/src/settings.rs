//! Engine settings parser
//!
//! The engine installation ships a settings file (INI by default,
//! `config/default.conf`) describing where the model weights live, how the
//! sampler is tuned and which auxiliary features are switched on. Parsing
//! goes through the `config` crate so any of its formats work, and
//! `${VAR}` / `$VAR` references are expanded from the environment first.

use crate::error::{EngineError, EngineResult};
use config::{Config as Cfg, File, FileFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

static BRACED_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("braced env var pattern is valid")
});

static BARE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").expect("bare env var pattern is valid")
});

/// Parsed engine settings.
///
/// Opaque to the service shell: the loader only hands it back to the engine
/// builder that produced it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub models: ModelSettings,

    #[serde(default)]
    pub sampling: SamplingSettings,

    /// Auxiliary feature flags, keyed by feature name.
    #[serde(default)]
    pub aux: BTreeMap<String, bool>,
}

/// `[models]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Weight table path, relative to the installation root.
    pub weights: String,

    /// Upper bound on candidates returned per request.
    pub max_candidates: usize,

    /// Candidates scoring below this are dropped (the best one is always kept).
    pub min_candidate_score: f64,

    /// Attach explanations even when the request is not verbose.
    pub explain: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            weights: String::from("models/bidder.yaml"),
            max_candidates: 3,
            min_candidate_score: 0.05,
            explain: false,
        }
    }
}

/// `[sampling]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    pub enabled: bool,
    pub samples: usize,
    pub seed: u64,

    /// Half-width of the uniform spread applied to the partner's assumed
    /// strength in each sample.
    pub partner_spread: f64,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            samples: 128,
            seed: 42,
            partner_spread: 4.0,
        }
    }
}

impl EngineSettings {
    /// Load settings from a file, detecting the format from its extension.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let format = detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content, format)
    }

    /// Parse settings from a string in the given format.
    pub fn from_str(content: &str, format: FileFormat) -> EngineResult<Self> {
        let substituted = substitute_env_vars(content);

        let config = Cfg::builder()
            .add_source(File::from_str(&substituted, format))
            .build()
            .map_err(|e| EngineError::Settings(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| EngineError::Settings(e.to_string()))
    }
}

/// Detect the settings format from a file extension.
///
/// `.conf` and `.ini` are both read as INI.
pub fn detect_format(path: &Path) -> EngineResult<FileFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| EngineError::UnsupportedFormat("no file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "conf" | "ini" => Ok(FileFormat::Ini),
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        _ => Err(EngineError::UnsupportedFormat(ext.to_string())),
    }
}

/// Expand `${VAR}` and `$VAR` references from the process environment.
///
/// Unknown variables are left untouched.
pub fn substitute_env_vars(content: &str) -> String {
    let braced = BRACED_VAR.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });

    BARE_VAR
        .replace_all(&braced, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_CONF: &str = r#"
[models]
weights = models/bidder.yaml
max_candidates = 4
min_candidate_score = 0.1
explain = true

[sampling]
enabled = false
samples = 64
seed = 7

[aux]
consult_bba = true
use_bba = false
"#;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("default.conf")).unwrap(), FileFormat::Ini);
        assert_eq!(detect_format(Path::new("a/b.ini")).unwrap(), FileFormat::Ini);
        assert_eq!(detect_format(Path::new("engine.yml")).unwrap(), FileFormat::Yaml);
        assert_eq!(detect_format(Path::new("engine.toml")).unwrap(), FileFormat::Toml);
        assert!(detect_format(Path::new("engine.txt")).is_err());
        assert!(detect_format(Path::new("engine")).is_err());
    }

    #[test]
    fn test_parse_ini_settings() {
        let settings = EngineSettings::from_str(DEFAULT_CONF, FileFormat::Ini).unwrap();
        assert_eq!(settings.models.weights, "models/bidder.yaml");
        assert_eq!(settings.models.max_candidates, 4);
        assert!(settings.models.explain);
        assert!(!settings.sampling.enabled);
        assert_eq!(settings.sampling.samples, 64);
        assert_eq!(settings.sampling.seed, 7);
        assert_eq!(settings.aux.get("consult_bba"), Some(&true));
        assert_eq!(settings.aux.get("use_bba"), Some(&false));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let settings = EngineSettings::from_str("[models]\nmax_candidates = 2\n", FileFormat::Ini)
            .unwrap();
        assert_eq!(settings.models.max_candidates, 2);
        assert_eq!(settings.models.weights, "models/bidder.yaml");
        assert!(settings.sampling.enabled);
        assert!(settings.aux.is_empty());
    }

    #[test]
    fn test_substitute_leaves_unknown_vars() {
        let out = substitute_env_vars("weights = ${BIDSERVE_SURELY_UNSET_VAR}/x");
        assert_eq!(out, "weights = ${BIDSERVE_SURELY_UNSET_VAR}/x");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.conf");
        std::fs::write(&path, DEFAULT_CONF).unwrap();

        let settings = EngineSettings::load(&path).unwrap();
        assert_eq!(settings.models.max_candidates, 4);
    }
}
