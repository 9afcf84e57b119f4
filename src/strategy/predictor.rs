//! Game outcome prediction.
//!
//! Simulates each game many times from team efficiency metrics, averages
//! the home margin, and compares it to the market spread to pick a side
//! and score confidence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info};

use super::round2;
use crate::types::{Game, MetricsTable, Prediction, TeamMetrics};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Simulation constants. The defaults are league-average college football.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated games per prediction.
    pub trials: usize,
    /// League-average points scored.
    pub baseline_score: f64,
    /// Converts a per-attempt efficiency differential into points.
    pub efficiency_scale: f64,
    /// Standard deviation of the per-side scoring noise.
    pub noise_std_dev: f64,
    /// Fixed RNG seed for reproducible runs. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: 500,
            baseline_score: 24.0,
            efficiency_scale: 10.0,
            noise_std_dev: 5.0,
            seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulators
// ---------------------------------------------------------------------------

/// Produces one simulated final score.
pub trait ScoreSimulator {
    /// Returns `(home_score, away_score)`.
    fn simulate(&mut self, home: &TeamMetrics, away: &TeamMetrics) -> (f64, f64);
}

/// Efficiency-differential model with independent Gaussian noise per side.
pub struct MonteCarloSimulator<R: Rng = StdRng> {
    config: SimulationConfig,
    rng: R,
}

impl MonteCarloSimulator<StdRng> {
    /// Seeded from `config.seed` when set, otherwise from OS entropy.
    pub fn from_config(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    pub fn seeded(config: SimulationConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> MonteCarloSimulator<R> {
    pub fn with_rng(config: SimulationConfig, rng: R) -> Self {
        Self { config, rng }
    }

    /// Standard normal sample (Box-Muller).
    fn sample_normal(&mut self) -> f64 {
        // (0, 1] keeps ln() finite
        let u1: f64 = 1.0 - self.rng.gen::<f64>();
        let u2: f64 = self.rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    fn expected_score(&self, offense: f64, opponent_defense: f64) -> f64 {
        self.config.baseline_score + (offense - opponent_defense) * self.config.efficiency_scale
    }
}

impl<R: Rng> ScoreSimulator for MonteCarloSimulator<R> {
    fn simulate(&mut self, home: &TeamMetrics, away: &TeamMetrics) -> (f64, f64) {
        let home_mean = self.expected_score(home.offense, away.defense);
        let away_mean = self.expected_score(away.offense, home.defense);
        let home_score = home_mean + self.sample_normal() * self.config.noise_std_dev;
        let away_score = away_mean + self.sample_normal() * self.config.noise_std_dev;
        (home_score, away_score)
    }
}

// ---------------------------------------------------------------------------
// Predictor
// ---------------------------------------------------------------------------

/// Annotates games with a `Prediction`. Total: never fails, never drops or
/// reorders games.
pub struct OutcomePredictor<S: ScoreSimulator = MonteCarloSimulator> {
    simulator: S,
    trials: usize,
}

impl OutcomePredictor<MonteCarloSimulator> {
    pub fn from_config(config: SimulationConfig) -> Self {
        let trials = config.trials;
        Self::new(MonteCarloSimulator::from_config(config), trials)
    }
}

impl<S: ScoreSimulator> OutcomePredictor<S> {
    pub fn new(simulator: S, trials: usize) -> Self {
        Self { simulator, trials }
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Predict every game in place.
    pub fn predict_outcomes(&mut self, games: &mut [Game], metrics: &MetricsTable) {
        let mut unmatched = 0usize;
        for game in games.iter_mut() {
            if !metrics.contains(&game.home_team) || !metrics.contains(&game.away_team) {
                unmatched += 1;
            }
            let prediction = self.predict_game(game, metrics);
            game.prediction = Some(prediction);
        }

        info!(
            games = games.len(),
            teams_with_metrics = metrics.len(),
            games_missing_metrics = unmatched,
            "Outcome prediction complete"
        );
    }

    /// Predict a single game without mutating it.
    pub fn predict_game(&mut self, game: &Game, metrics: &MetricsTable) -> Prediction {
        let home = metrics.lookup(&game.home_team);
        let away = metrics.lookup(&game.away_team);

        let margin = self.mean_margin(&home, &away);
        let spread = game.spread().unwrap_or(0.0);

        let recommended_pick = if margin > spread {
            game.home_team.clone()
        } else {
            game.away_team.clone()
        };
        let confidence = round2((margin - spread).abs());

        debug!(
            game_id = %game.game_id,
            matchup = %game.matchup(),
            margin = format!("{:+.2}", margin),
            spread,
            pick = %recommended_pick,
            confidence,
            "Game predicted"
        );

        Prediction {
            pred_margin: round2(margin),
            recommended_pick,
            confidence,
        }
    }

    /// Mean home-minus-away margin across all trials.
    fn mean_margin(&mut self, home: &TeamMetrics, away: &TeamMetrics) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        let total: f64 = (0..self.trials)
            .map(|_| {
                let (h, a) = self.simulator.simulate(home, away);
                h - a
            })
            .sum();
        total / self.trials as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GameOdd, OddsSnapshot, TeamMetricsRecord};

    /// Noise-free simulator returning the same score every trial.
    struct FixedScores(f64, f64);

    impl ScoreSimulator for FixedScores {
        fn simulate(&mut self, _home: &TeamMetrics, _away: &TeamMetrics) -> (f64, f64) {
            (self.0, self.1)
        }
    }

    fn make_game(id: &str, home: &str, away: &str, spread: Option<f64>) -> Game {
        let mut g = Game::new(id, home, away);
        g.odds = OddsSnapshot {
            game_id: Some(id.to_string()),
            game_odds: vec![GameOdd {
                odd_type: Some("Game".into()),
                point_spread: spread,
                ..Default::default()
            }],
        };
        g
    }

    fn make_metrics(rows: &[(&str, f64, f64)]) -> MetricsTable {
        let records: Vec<TeamMetricsRecord> = rows
            .iter()
            .map(|(t, o, d)| TeamMetricsRecord {
                team: t.to_string(),
                points_per_attempt: *o,
                opponent_points_per_attempt: *d,
            })
            .collect();
        MetricsTable::from_records(&records)
    }

    fn noiseless() -> SimulationConfig {
        SimulationConfig {
            noise_std_dev: 0.0,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_default_constants() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.trials, 500);
        assert_eq!(cfg.baseline_score, 24.0);
        assert_eq!(cfg.efficiency_scale, 10.0);
        assert_eq!(cfg.noise_std_dev, 5.0);
        assert!(cfg.seed.is_none());
        assert_eq!(OutcomePredictor::from_config(cfg).trials(), 500);
    }

    #[test]
    fn test_noiseless_simulation_is_exact() {
        let mut sim = MonteCarloSimulator::seeded(noiseless(), 1);
        let (h, a) = sim.simulate(&TeamMetrics::new(0.5, 0.4), &TeamMetrics::new(0.3, 0.2));
        // home: 24 + (0.5 - 0.2) * 10, away: 24 + (0.3 - 0.4) * 10
        assert!((h - 27.0).abs() < 1e-9);
        assert!((a - 23.0).abs() < 1e-9);
    }

    #[test]
    fn test_home_pick_when_margin_beats_spread() {
        let mut p = OutcomePredictor::new(FixedScores(31.0, 20.0), 10);
        let game = make_game("1", "Georgia", "Florida", Some(-3.0));
        let pred = p.predict_game(&game, &MetricsTable::default());
        assert_eq!(pred.pred_margin, 11.0);
        assert_eq!(pred.recommended_pick, "Georgia");
        assert_eq!(pred.confidence, 14.0);
    }

    #[test]
    fn test_away_pick_when_margin_equals_spread() {
        let mut p = OutcomePredictor::new(FixedScores(27.0, 24.0), 10);
        let game = make_game("1", "Georgia", "Florida", Some(3.0));
        let pred = p.predict_game(&game, &MetricsTable::default());
        assert_eq!(pred.recommended_pick, "Florida");
        assert_eq!(pred.confidence, 0.0);
    }

    #[test]
    fn test_missing_spread_treated_as_zero() {
        let mut p = OutcomePredictor::new(FixedScores(20.0, 23.5), 10);
        let game = Game::new("1", "Iowa", "Minnesota");
        let pred = p.predict_game(&game, &MetricsTable::default());
        assert_eq!(pred.pred_margin, -3.5);
        assert_eq!(pred.recommended_pick, "Minnesota");
        assert_eq!(pred.confidence, 3.5);
    }

    #[test]
    fn test_unknown_teams_default_to_zero_metrics() {
        let mut p = OutcomePredictor::new(MonteCarloSimulator::seeded(noiseless(), 7), 50);
        let metrics = make_metrics(&[("Somebody Else", 1.0, 1.0)]);
        let mut games = vec![make_game("1", "Rice", "Tulane", None)];
        p.predict_outcomes(&mut games, &metrics);
        let pred = games[0].prediction.as_ref().unwrap();
        assert_eq!(pred.pred_margin, 0.0);
        assert_eq!(pred.recommended_pick, "Tulane");
    }

    #[test]
    fn test_metrics_drive_margin() {
        let mut p = OutcomePredictor::new(MonteCarloSimulator::seeded(noiseless(), 7), 20);
        let metrics = make_metrics(&[("Oregon", 0.6, 0.1), ("Utah", 0.2, 0.3)]);
        let mut games = vec![make_game("1", "Oregon", "Utah", Some(-2.5))];
        p.predict_outcomes(&mut games, &metrics);
        let pred = games[0].prediction.as_ref().unwrap();
        // home 24 + (0.6-0.3)*10 = 27, away 24 + (0.2-0.1)*10 = 25
        assert_eq!(pred.pred_margin, 2.0);
        assert_eq!(pred.recommended_pick, "Oregon");
        assert_eq!(pred.confidence, 4.5);
    }

    #[test]
    fn test_symmetric_metrics_margin_near_zero() {
        let metrics = make_metrics(&[("Home", 0.45, 0.30), ("Away", 0.30, 0.45)]);
        for seed in [1u64, 42, 2024] {
            let mut p = OutcomePredictor::new(
                MonteCarloSimulator::seeded(SimulationConfig::default(), seed),
                500,
            );
            let pred = p.predict_game(&make_game("1", "Home", "Away", Some(0.0)), &metrics);
            // sd of the mean is ~0.32 points at 500 trials
            assert!(pred.pred_margin.abs() < 1.6, "seed {seed}: {}", pred.pred_margin);
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let metrics = make_metrics(&[("A", 0.5, 0.2), ("B", 0.3, 0.4)]);
        let game = make_game("1", "A", "B", Some(-1.5));
        let mut p1 = OutcomePredictor::new(MonteCarloSimulator::seeded(SimulationConfig::default(), 99), 500);
        let mut p2 = OutcomePredictor::new(MonteCarloSimulator::seeded(SimulationConfig::default(), 99), 500);
        assert_eq!(p1.predict_game(&game, &metrics), p2.predict_game(&game, &metrics));
    }

    #[test]
    fn test_confidence_never_negative() {
        let metrics = make_metrics(&[("A", 0.1, 0.9), ("B", 0.9, 0.1)]);
        let mut p = OutcomePredictor::from_config(SimulationConfig {
            seed: Some(5),
            ..SimulationConfig::default()
        });
        for spread in [-21.0, -3.5, 0.0, 3.5, 21.0] {
            let pred = p.predict_game(&make_game("1", "A", "B", Some(spread)), &metrics);
            assert!(pred.confidence >= 0.0);
        }
    }

    #[test]
    fn test_predict_outcomes_preserves_order_and_count() {
        let mut p = OutcomePredictor::new(FixedScores(21.0, 17.0), 5);
        let mut games = vec![
            make_game("3", "C", "D", None),
            make_game("1", "A", "B", None),
            make_game("2", "E", "F", None),
        ];
        p.predict_outcomes(&mut games, &MetricsTable::default());
        let ids: Vec<_> = games.iter().map(|g| g.game_id.as_str()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
        assert!(games.iter().all(|g| g.prediction.is_some()));
    }

    #[test]
    fn test_zero_trials_predicts_no_margin() {
        let mut p = OutcomePredictor::new(FixedScores(40.0, 0.0), 0);
        let pred = p.predict_game(&Game::new("1", "A", "B"), &MetricsTable::default());
        assert_eq!(pred.pred_margin, 0.0);
    }
}
