//! Configuration loading from TOML.
//!
//! Reads `config.toml` into strongly-typed structs. Every section is
//! optional and falls back to the engine defaults, so a config file only
//! needs to name what it overrides.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::strategy::parlay::ParlayConfig;
use crate::strategy::policy::PricingConfig;
use crate::strategy::predictor::SimulationConfig;
use crate::strategy::sizing::SizingConfig;

/// Default config path, overridable with `PARLAY_CONFIG`.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub slate: SlateConfig,
    pub simulation: SimulationConfig,
    pub parlay: ParlayConfig,
    pub pricing: PricingConfig,
    pub sizing: SizingConfig,
}

/// Which slate to load and from where.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SlateConfig {
    /// Root directory of the JSON fixture feeds.
    pub data_dir: String,
    pub season: i32,
    pub week: u32,
    /// Game ids to build the parlay from. Empty selects every game.
    pub selected_games: Vec<String>,
}

impl Default for SlateConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            season: 2024,
            week: 1,
            selected_games: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Path from `PARLAY_CONFIG`, else `config.toml`.
    pub fn path_from_env() -> String {
        std::env::var("PARLAY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    fn validate(&self) -> Result<()> {
        let s = &self.sizing;
        anyhow::ensure!(
            s.bankroll.is_finite() && s.bankroll >= 0.0,
            "sizing.bankroll must be a non-negative number, got {}",
            s.bankroll
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&s.min_stake_fraction) && (0.0..=1.0).contains(&s.max_stake_fraction),
            "sizing stake fractions must be within [0, 1]"
        );
        anyhow::ensure!(
            self.simulation.noise_std_dev >= 0.0,
            "simulation.noise_std_dev must be non-negative"
        );
        Ok(())
    }
}
