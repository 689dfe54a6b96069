//! Model set: the weight table plus candidate-shaping knobs and auxiliary
//! feature flags.

use crate::error::{EngineError, EngineResult};
use crate::settings::EngineSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Scoring weights read from the bidder weight table (YAML or JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BidWeights {
    pub name: String,

    /// Combined partnership points needed for a one-level contract.
    pub base_points: f64,

    /// Extra combined points needed per level above one.
    pub points_per_level: f64,

    /// Assumed partner strength before partner has called.
    pub partner_points: f64,

    /// Assumed partner strength once partner has passed.
    pub passed_partner_points: f64,

    /// Assumed partner strength once partner has bid.
    pub bidding_partner_points: f64,

    /// Combined trump length considered a fit.
    pub fit_target: f64,

    /// Assumed partner length in a suit partner has not shown.
    pub assumed_partner_length: f64,

    /// Assumed partner length in a suit partner has bid.
    pub shown_suit_length: f64,

    /// Points subtracted from the margin when our side is vulnerable.
    pub vulnerable_penalty: f64,

    /// Penalty per level of unnecessary jump.
    pub jump_penalty: f64,

    /// Own points at which a penalty double becomes attractive.
    pub double_points: f64,

    /// Softmax temperature over call logits.
    pub temperature: f64,
}

impl Default for BidWeights {
    fn default() -> Self {
        Self {
            name: String::from("heuristic"),
            base_points: 20.0,
            points_per_level: 3.0,
            partner_points: 8.0,
            passed_partner_points: 5.0,
            bidding_partner_points: 12.0,
            fit_target: 8.0,
            assumed_partner_length: 2.5,
            shown_suit_length: 4.5,
            vulnerable_penalty: 1.5,
            jump_penalty: 1.0,
            double_points: 15.0,
            temperature: 1.5,
        }
    }
}

impl BidWeights {
    /// Read and validate a weight table.
    pub fn load(path: &Path) -> EngineResult<Self> {
        if !path.is_file() {
            return Err(EngineError::WeightsNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let weights: BidWeights = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| weights_error(path, e))?,
            _ => serde_yaml::from_str(&content).map_err(|e| weights_error(path, e))?,
        };
        weights.validate(path)?;
        Ok(weights)
    }

    fn validate(&self, path: &Path) -> EngineResult<()> {
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(weights_error(path, "temperature must be a positive number"));
        }
        if !(self.points_per_level.is_finite() && self.points_per_level >= 0.0) {
            return Err(weights_error(path, "points_per_level must be non-negative"));
        }
        Ok(())
    }
}

fn weights_error(path: &Path, message: impl ToString) -> EngineError {
    EngineError::Weights {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}

/// Loaded model set. Immutable once the loader has finished with it.
#[derive(Debug, Clone)]
pub struct ModelSet {
    weights: BidWeights,
    weights_path: PathBuf,
    max_candidates: usize,
    min_candidate_score: f64,
    explain: bool,
    features: BTreeMap<String, bool>,
}

impl ModelSet {
    /// Load the weight table named in `settings`, resolved against `root`.
    pub fn from_settings(settings: &EngineSettings, root: &Path) -> EngineResult<Self> {
        let weights_path = root.join(&settings.models.weights);
        tracing::info!(path = %weights_path.display(), "loading bidder weights");
        let weights = BidWeights::load(&weights_path)?;

        if settings.models.max_candidates == 0 {
            return Err(EngineError::Settings(
                "models.max_candidates must be > 0".into(),
            ));
        }

        Ok(Self {
            weights,
            weights_path,
            max_candidates: settings.models.max_candidates,
            min_candidate_score: settings.models.min_candidate_score,
            explain: settings.models.explain,
            features: settings.aux.clone(),
        })
    }

    /// Force the named auxiliary features off. Names absent from the settings
    /// are recorded as off too, so the final state never depends on the file.
    pub fn disable_features(&mut self, names: &[&str]) {
        for name in names {
            self.features.insert((*name).to_string(), false);
        }
    }

    pub fn feature_enabled(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }

    pub fn enabled_features(&self) -> Vec<&str> {
        self.features
            .iter()
            .filter(|(_, on)| **on)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn weights(&self) -> &BidWeights {
        &self.weights
    }

    pub fn weights_path(&self) -> &Path {
        &self.weights_path
    }

    pub fn max_candidates(&self) -> usize {
        self.max_candidates
    }

    pub fn min_candidate_score(&self) -> f64 {
        self.min_candidate_score
    }

    pub fn explain(&self) -> bool {
        self.explain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn install(dir: &Path, weights: &str) -> EngineSettings {
        std::fs::create_dir_all(dir.join("models")).unwrap();
        std::fs::write(dir.join("models/bidder.yaml"), weights).unwrap();
        let mut settings = EngineSettings::default();
        settings.aux.insert("consult_bba".into(), true);
        settings.aux.insert("use_bba_for_sampling".into(), true);
        settings
    }

    #[test]
    fn test_load_partial_weights_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = install(dir.path(), "name: compact\ntemperature: 2.0\n");

        let models = ModelSet::from_settings(&settings, dir.path()).unwrap();
        assert_eq!(models.weights().name, "compact");
        assert_eq!(models.weights().temperature, 2.0);
        assert_eq!(models.weights().base_points, 20.0);
        assert_eq!(models.max_candidates(), 3);
    }

    #[test]
    fn test_missing_weights_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelSet::from_settings(&EngineSettings::default(), dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::WeightsNotFound(_)));
    }

    #[test]
    fn test_invalid_temperature_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let settings = install(dir.path(), "temperature: 0\n");
        let err = ModelSet::from_settings(&settings, dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::Weights { .. }));
    }

    #[test]
    fn test_disable_features() {
        let dir = tempfile::tempdir().unwrap();
        let settings = install(dir.path(), "name: x\n");
        let mut models = ModelSet::from_settings(&settings, dir.path()).unwrap();
        assert!(models.feature_enabled("consult_bba"));

        models.disable_features(&["consult_bba", "use_bba_for_sampling", "use_bba"]);
        assert!(!models.feature_enabled("consult_bba"));
        assert!(!models.feature_enabled("use_bba"));
        assert!(models.enabled_features().is_empty());
    }
}
