//! Pricing heuristics.
//!
//! The builder needs a price for game legs it invents from predictions, and
//! the sizer needs a win probability per leg. Both are coarse placeholders
//! today; they live behind `PricingPolicy` so a calibrated model can replace
//! them without touching the pipeline.

use serde::Deserialize;

use crate::types::LegKind;

/// Maps model output to market terms.
pub trait PricingPolicy {
    /// American price to quote for a game leg with the given confidence.
    fn price_for_confidence(&self, confidence: f64) -> i32;

    /// Assumed independent win probability for a leg of this kind.
    fn win_probability(&self, kind: LegKind) -> f64;
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Confidence (points vs spread) above which a leg is priced as a favourite.
    pub high_confidence_threshold: f64,
    pub high_confidence_price: i32,
    pub standard_price: i32,
    pub spread_or_total_probability: f64,
    pub player_prop_probability: f64,
    /// Fallback for unrecognised leg kinds.
    pub unknown_probability: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            high_confidence_threshold: 5.0,
            high_confidence_price: -120,
            standard_price: -110,
            spread_or_total_probability: 0.55,
            player_prop_probability: 0.60,
            unknown_probability: 0.50,
        }
    }
}

// ---------------------------------------------------------------------------
// Heuristic policy
// ---------------------------------------------------------------------------

/// Threshold and lookup-table policy driven by `PricingConfig`.
#[derive(Debug, Clone, Default)]
pub struct HeuristicPolicy {
    config: PricingConfig,
}

impl HeuristicPolicy {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }
}

impl PricingPolicy for HeuristicPolicy {
    fn price_for_confidence(&self, confidence: f64) -> i32 {
        if confidence > self.config.high_confidence_threshold {
            self.config.high_confidence_price
        } else {
            self.config.standard_price
        }
    }

    fn win_probability(&self, kind: LegKind) -> f64 {
        match kind {
            LegKind::SpreadOrTotal => self.config.spread_or_total_probability,
            LegKind::PlayerProp => self.config.player_prop_probability,
            LegKind::Unknown => self.config.unknown_probability,
        }
    }
}
