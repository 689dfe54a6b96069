//! Partner-strength sampler used to estimate an expected score per bid.

use crate::error::{EngineError, EngineResult};
use crate::settings::SamplingSettings;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Score awarded for reaching a makeable contract, before overtricks.
const MAKE_BONUS: f64 = 50.0;
/// Score per point of surplus (or per point short when failing).
const POINT_VALUE: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct Sampler {
    enabled: bool,
    samples: usize,
    seed: u64,
    partner_spread: f64,
}

impl Sampler {
    pub fn from_settings(settings: &SamplingSettings) -> EngineResult<Self> {
        if settings.enabled && settings.samples == 0 {
            return Err(EngineError::Settings(
                "sampling.samples must be > 0 when sampling is enabled".into(),
            ));
        }
        if !(settings.partner_spread.is_finite() && settings.partner_spread >= 0.0) {
            return Err(EngineError::Settings(
                "sampling.partner_spread must be a non-negative number".into(),
            ));
        }
        Ok(Self {
            enabled: settings.enabled,
            samples: settings.samples,
            seed: settings.seed,
            partner_spread: settings.partner_spread,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Average outcome of a contract needing `required` combined points,
    /// holding `own` points with partner assumed around `partner_mean`.
    ///
    /// `key` mixes into the configured seed so the same deal and auction
    /// always draw the same samples. Returns `None` when sampling is off.
    pub fn estimate(&self, key: u64, own: f64, partner_mean: f64, required: f64) -> Option<f64> {
        if !self.enabled {
            return None;
        }

        let mut rng = StdRng::seed_from_u64(self.seed ^ key);
        let spread = self.partner_spread;
        let total: f64 = (0..self.samples)
            .map(|_| {
                let partner = (partner_mean + rng.gen_range(-spread..=spread)).max(0.0);
                let surplus = own + partner - required;
                if surplus >= 0.0 {
                    MAKE_BONUS + surplus * POINT_VALUE
                } else {
                    surplus * POINT_VALUE * 2.0
                }
            })
            .sum();

        let mean = total / self.samples as f64;
        Some((mean * 10.0).round() / 10.0)
    }
}
