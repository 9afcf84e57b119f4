//! Decision engine — outcome prediction, parlay building and stake sizing.

pub mod parlay;
pub mod policy;
pub mod predictor;
pub mod sizing;

use std::collections::HashSet;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::data::{odds, Slate};
use crate::types::{
    EngineError, Game, MetricsTable, Parlay, PipelineReport, PlayerPropMarket, StakeRecommendation,
};
use parlay::ParlayBuilder;
use policy::{HeuristicPolicy, PricingPolicy};
use predictor::{MonteCarloSimulator, OutcomePredictor, ScoreSimulator};
use sizing::StakeSizer;

/// Round to 2 decimal places, halves to even. Matches `Decimal::round_dp`
/// used for stake amounts.
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Runs predictor → builder → sizer in order.
///
/// Each stage is usable on its own; the pipeline only fixes the order and
/// packages the results into a `PipelineReport`.
pub struct BettingPipeline<S = MonteCarloSimulator, P = HeuristicPolicy>
where
    S: ScoreSimulator,
    P: PricingPolicy,
{
    predictor: OutcomePredictor<S>,
    builder: ParlayBuilder<P>,
    sizer: StakeSizer<P>,
}

impl BettingPipeline {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let policy = HeuristicPolicy::new(cfg.pricing.clone());
        Self::new(
            OutcomePredictor::from_config(cfg.simulation.clone()),
            ParlayBuilder::new(cfg.parlay.clone(), policy.clone()),
            StakeSizer::new(cfg.sizing.clone(), policy),
        )
    }
}

impl<S: ScoreSimulator, P: PricingPolicy> BettingPipeline<S, P> {
    pub fn new(predictor: OutcomePredictor<S>, builder: ParlayBuilder<P>, sizer: StakeSizer<P>) -> Self {
        Self {
            predictor,
            builder,
            sizer,
        }
    }

    pub fn builder(&self) -> &ParlayBuilder<P> {
        &self.builder
    }

    pub fn sizer(&self) -> &StakeSizer<P> {
        &self.sizer
    }

    /// Stage 1: annotate games with predictions.
    pub fn predict(&mut self, games: &mut [Game], metrics: &MetricsTable) {
        self.predictor.predict_outcomes(games, metrics);
    }

    /// Stages 2 and 3 on already-predicted games.
    pub fn select_and_size(
        &self,
        selection: &HashSet<String>,
        predicted: &[Game],
        props: &[PlayerPropMarket],
        bankroll: f64,
    ) -> Result<(Parlay, StakeRecommendation), EngineError> {
        let parlay = self.builder.build(selection, predicted, props);
        let stake = self.sizer.recommend(&parlay, bankroll)?;
        Ok((parlay, stake))
    }

    /// Full pass over a loaded slate.
    pub fn run(&mut self, slate: Slate, bankroll: f64) -> Result<PipelineReport, EngineError> {
        let Slate {
            mut games,
            metrics,
            props,
            line_history,
            selection,
            ..
        } = slate;

        let table = MetricsTable::from_records(&metrics);
        self.predict(&mut games, &table);

        let (parlay, stake) = self.select_and_size(&selection, &games, &props, bankroll)?;
        let line_movements = odds::analyze_line_movement(&games, &line_history);

        let report = PipelineReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            games,
            parlay,
            stake,
            line_movements,
        };

        info!(
            run_id = %report.run_id,
            games = report.games.len(),
            legs = report.parlay.len(),
            stake = %report.stake.amount,
            ev = format!("{:+.4}", report.stake.expected_value),
            "Pipeline complete"
        );

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
