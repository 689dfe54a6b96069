//! Built-in heuristic bidder.
//!
//! Scores every legal call from hand strength, suit length and what partner
//! has shown, then turns the scores into a probability-like `insta_score`
//! with a softmax. Deterministic for a given request.

use crate::auction::{Auction, Call, Strain};
use crate::error::{EngineError, EngineResult};
use crate::hand::Hand;
use crate::models::{BidWeights, ModelSet};
use crate::sampler::Sampler;
use crate::session::{
    CandidateBatch, DecisionEngine, DecisionSession, EngineBuilder, RawCandidate, SessionParams,
};
use crate::settings::EngineSettings;
use std::path::Path;
use std::sync::Arc;
use xxhash_rust::xxh3::xxh3_64;

/// Builds a [`HeuristicEngine`] from an installation root.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicBuilder;

impl EngineBuilder for HeuristicBuilder {
    fn parse_settings(&self, path: &Path) -> EngineResult<EngineSettings> {
        EngineSettings::load(path)
    }

    fn build(
        &self,
        settings: &EngineSettings,
        root: &Path,
        disabled: &[&str],
    ) -> EngineResult<Arc<dyn DecisionEngine>> {
        let mut models = ModelSet::from_settings(settings, root)?;
        models.disable_features(disabled);
        let sampler = Sampler::from_settings(&settings.sampling)?;

        tracing::info!(
            model = %models.weights().name,
            sampling = sampler.is_enabled(),
            samples = sampler.samples(),
            "heuristic engine built"
        );
        Ok(Arc::new(HeuristicEngine::new(models, sampler)))
    }
}

pub struct HeuristicEngine {
    models: ModelSet,
    sampler: Sampler,
}

impl HeuristicEngine {
    pub fn new(models: ModelSet, sampler: Sampler) -> Self {
        Self { models, sampler }
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }
}

impl DecisionEngine for HeuristicEngine {
    fn name(&self) -> &str {
        &self.models.weights().name
    }

    fn sampler_loaded(&self) -> bool {
        self.sampler.is_enabled()
    }

    fn open_session<'a>(
        &'a self,
        params: SessionParams,
    ) -> EngineResult<Box<dyn DecisionSession + 'a>> {
        if params.seat > 3 || params.dealer > 3 {
            return Err(EngineError::Session(format!(
                "seat {} / dealer {} out of range",
                params.seat, params.dealer
            )));
        }

        if params.aux_integration {
            let requested: Vec<&str> = self
                .models
                .enabled_features()
                .into_iter()
                .filter(|f| !params.disabled_features.iter().any(|d| d == f))
                .collect();
            if !requested.is_empty() {
                return Err(EngineError::Session(format!(
                    "auxiliary convention bot unavailable (requested: {})",
                    requested.join(", ")
                )));
            }
        }

        let hand: Hand = params.hand.parse()?;
        Ok(Box::new(HeuristicSession {
            engine: self,
            hand,
            params,
        }))
    }
}

struct HeuristicSession<'a> {
    engine: &'a HeuristicEngine,
    hand: Hand,
    params: SessionParams,
}

/// Score for one legal call before normalisation.
struct Assessment {
    call: Call,
    logit: f64,
    /// Combined points the resulting contract needs (bids only).
    required: Option<f64>,
    note: String,
}

impl DecisionSession for HeuristicSession<'_> {
    fn bid_candidates(&mut self, tokens: &[String]) -> EngineResult<CandidateBatch> {
        let auction = Auction::parse(tokens)?;
        if auction.is_ended() {
            return Ok(CandidateBatch {
                candidates: Vec::new(),
                passout: true,
            });
        }

        let models = &self.engine.models;
        let weights = models.weights();
        let own = f64::from(self.hand.points());
        let partner = partner_estimate(&auction, weights);

        let mut scored: Vec<(Assessment, f64)> = {
            let assessments: Vec<Assessment> = auction
                .legal_calls()
                .into_iter()
                .map(|call| self.assess(call, &auction, own, partner))
                .collect();
            let max = assessments
                .iter()
                .map(|a| a.logit)
                .fold(f64::NEG_INFINITY, f64::max);
            let exps: Vec<f64> = assessments
                .iter()
                .map(|a| ((a.logit - max) / weights.temperature).exp())
                .collect();
            let sum: f64 = exps.iter().sum();
            assessments
                .into_iter()
                .zip(exps)
                .map(|(a, e)| (a, e / sum))
                .collect()
        };
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let verbose = self.params.verbose || models.explain();
        let candidates = scored
            .into_iter()
            .enumerate()
            .take_while(|(i, (_, p))| *i == 0 || *p >= models.min_candidate_score())
            .take(models.max_candidates())
            .map(|(_, (assessment, p))| {
                let mut candidate =
                    RawCandidate::new(assessment.call.to_string(), round_to(p, 4));
                if let Some(required) = assessment.required {
                    let key = sample_key(&self.hand, tokens, self.params.seat, assessment.call);
                    if let Some(es) = self.engine.sampler.estimate(key, own, partner, required) {
                        candidate = candidate.with_expected_score(es);
                    }
                }
                if verbose {
                    candidate = candidate.with_explanation(assessment.note);
                }
                candidate
            })
            .collect();

        Ok(CandidateBatch {
            candidates,
            passout: false,
        })
    }
}

impl HeuristicSession<'_> {
    fn assess(&self, call: Call, auction: &Auction, own: f64, partner: f64) -> Assessment {
        let w = self.engine.models.weights();
        let combined = own + partner;
        let vul_penalty = if self.params.vulnerability.for_seat(self.params.seat) {
            w.vulnerable_penalty
        } else {
            0.0
        };
        let floor = auction.last_bid().and_then(|(_, c)| c.bid_rank());

        match call {
            Call::Pass => {
                let cheapest = Call::bids_above(floor).next();
                let logit = match cheapest {
                    Some(Call::Bid { level, .. }) => {
                        (required_points(w, level) + vul_penalty - combined) / 2.0
                    }
                    _ => 0.0,
                };
                Assessment {
                    call,
                    logit,
                    required: None,
                    note: format!("{own:.0} points, about {combined:.0} combined"),
                }
            }
            Call::Double => Assessment {
                call,
                logit: (own - w.double_points) / 2.0 - 1.0,
                required: None,
                note: format!("penalty double with {own:.0} points"),
            },
            Call::Redouble => Assessment {
                call,
                logit: (own - w.double_points) / 2.0 - 2.0,
                required: None,
                note: format!("redouble with {own:.0} points"),
            },
            Call::Bid { level, strain } => {
                let required = required_points(w, level);
                let margin = combined - required - vul_penalty;
                let partner_shown = auction.partner_bids().any(|c| match c {
                    Call::Bid { strain: s, .. } => s == strain,
                    _ => false,
                });
                let (fit, shape_note) = match strain.suit() {
                    Some(suit) => {
                        let own_len = f64::from(self.hand.length(suit));
                        let partner_len = if partner_shown {
                            w.shown_suit_length
                        } else {
                            w.assumed_partner_length
                        };
                        (
                            own_len + partner_len - w.fit_target,
                            format!("{own_len:.0} {}", suit.name()),
                        )
                    }
                    None => {
                        let base = if self.hand.is_balanced() { 0.5 } else { -1.5 };
                        let bonus = if partner_shown { 1.0 } else { 0.0 };
                        (base + bonus, String::from("notrump shape"))
                    }
                };
                let jump = f64::from(level - cheapest_level(strain, floor));
                Assessment {
                    call,
                    logit: margin / 2.0 + fit - jump * w.jump_penalty,
                    required: Some(required),
                    note: format!(
                        "{own:.0} points, {shape_note}, needs about {required:.0} combined"
                    ),
                }
            }
        }
    }
}

const KEY_SEPARATOR: u8 = 0x1f;

/// Seed for the sampler. Built from the canonical text of the inputs and
/// hashed with xxh3, so the same request samples the same deals on every
/// build and platform.
fn sample_key(hand: &Hand, tokens: &[String], seat: u8, call: Call) -> u64 {
    let mut buf = hand.to_string().into_bytes();
    buf.push(KEY_SEPARATOR);
    for token in tokens {
        buf.extend_from_slice(token.as_bytes());
        buf.push(KEY_SEPARATOR);
    }
    buf.push(seat);
    buf.push(KEY_SEPARATOR);
    buf.extend_from_slice(call.to_string().as_bytes());
    xxh3_64(&buf)
}

fn required_points(w: &BidWeights, level: u8) -> f64 {
    w.base_points + w.points_per_level * f64::from(level - 1)
}

fn partner_estimate(auction: &Auction, w: &BidWeights) -> f64 {
    if auction.partner_bids().next().is_some() {
        w.bidding_partner_points
    } else if auction.partner_has_called() {
        w.passed_partner_points
    } else {
        w.partner_points
    }
}

/// Lowest level at which `strain` can still be bid over `floor`.
fn cheapest_level(strain: Strain, floor: Option<u8>) -> u8 {
    Call::bids_above(floor)
        .find_map(|c| match c {
            Call::Bid { level, strain: s } if s == strain => Some(level),
            _ => None,
        })
        .unwrap_or(7)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
