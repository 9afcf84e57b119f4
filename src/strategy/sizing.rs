//! Expected-value stake sizing.
//!
//! Treats the parlay legs as independent, multiplies their assumed win
//! probabilities and decimal prices, and stakes a capped fraction of the
//! bankroll when the combined expected value is positive.

use rust_decimal::prelude::*;
use serde::Deserialize;
use tracing::debug;

use super::policy::{HeuristicPolicy, PricingPolicy};
use crate::types::{EngineError, Parlay, StakeRecommendation};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Bankroll used when the caller does not supply one.
    pub bankroll: f64,
    /// Cap on the stake fraction when the parlay shows an edge.
    pub max_stake_fraction: f64,
    /// Stake fraction when there is no edge.
    pub min_stake_fraction: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            bankroll: 1000.0,
            max_stake_fraction: 0.05, // never more than 5% of bankroll
            min_stake_fraction: 0.01, // stay in the game
        }
    }
}

// ---------------------------------------------------------------------------
// Odds conversion
// ---------------------------------------------------------------------------

/// Parse a signed-integer American price ("-110", "+145", "120").
pub fn parse_american_odds(odds: &str) -> Result<i32, EngineError> {
    match odds.trim().parse::<i32>() {
        Ok(0) | Err(_) => Err(EngineError::InvalidOddsFormat(odds.to_string())),
        Ok(price) => Ok(price),
    }
}

/// American price → decimal payout factor. `price` must be non-zero.
pub fn american_to_decimal(price: i32) -> f64 {
    if price > 0 {
        1.0 + price as f64 / 100.0
    } else {
        1.0 + 100.0 / (price as f64).abs()
    }
}

// ---------------------------------------------------------------------------
// Sizer
// ---------------------------------------------------------------------------

pub struct StakeSizer<P: PricingPolicy = HeuristicPolicy> {
    config: SizingConfig,
    policy: P,
}

impl<P: PricingPolicy> StakeSizer<P> {
    pub fn new(config: SizingConfig, policy: P) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    /// Stake against the configured default bankroll.
    pub fn recommend_default(&self, parlay: &Parlay) -> Result<StakeRecommendation, EngineError> {
        self.recommend(parlay, self.config.bankroll)
    }

    /// Recommend a stake for `parlay` out of `bankroll`.
    ///
    /// EV = Π pᵢ × Π dᵢ − 1, where pᵢ is the policy's win probability and
    /// dᵢ the decimal odds of leg i. Positive EV stakes
    /// `min(EV, max_stake_fraction)` of the bankroll; otherwise
    /// `min_stake_fraction`.
    pub fn recommend(&self, parlay: &Parlay, bankroll: f64) -> Result<StakeRecommendation, EngineError> {
        if !bankroll.is_finite() || bankroll < 0.0 {
            return Err(EngineError::InvalidBankroll(bankroll));
        }

        let parlay_probability: f64 = parlay
            .iter()
            .map(|leg| self.policy.win_probability(leg.kind))
            .product();

        let mut total_decimal_odds = 1.0;
        for leg in parlay {
            let price = parse_american_odds(&leg.odds)?;
            total_decimal_odds *= american_to_decimal(price);
        }

        let expected_value = parlay_probability * total_decimal_odds - 1.0;

        let stake_fraction = if expected_value > 0.0 {
            expected_value.min(self.config.max_stake_fraction)
        } else {
            self.config.min_stake_fraction
        };

        let bankroll_dec =
            Decimal::from_f64(bankroll).ok_or(EngineError::InvalidBankroll(bankroll))?;
        let amount = Decimal::from_f64(bankroll * stake_fraction)
            .ok_or(EngineError::InvalidBankroll(bankroll))?
            .round_dp(2);

        debug!(
            legs = parlay.len(),
            parlay_probability = format!("{:.6}", parlay_probability),
            decimal_odds = format!("{:.4}", total_decimal_odds),
            ev = format!("{:+.4}", expected_value),
            fraction = format!("{:.2}%", stake_fraction * 100.0),
            amount = %amount,
            "Stake sized"
        );

        Ok(StakeRecommendation {
            amount,
            bankroll: bankroll_dec,
            stake_fraction,
            parlay_probability,
            total_decimal_odds,
            expected_value,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
