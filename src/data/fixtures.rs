//! File-backed slate source.
//!
//! Reads provider-shaped JSON from a local directory laid out like the
//! provider endpoints:
//!
//! ```text
//! <root>/<season>/<week>/games.json
//! <root>/<season>/<week>/odds.json
//! <root>/<season>/<week>/metrics.json
//! <root>/props/<game_id>.json
//! <root>/line_movement/<game_id>.json
//! ```
//!
//! Per-game files are optional; a missing one reads as an empty list. Each
//! file must be a JSON array; records that fail to decode are skipped.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{decode_records, SlateSource};
use crate::types::{Game, OddsSnapshot, PlayerPropMarket, TeamMetricsRecord};

pub struct FixtureSource {
    root: PathBuf,
}

impl FixtureSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn week_file(&self, season: i32, week: u32, name: &str) -> PathBuf {
        self.root.join(season.to_string()).join(week.to_string()).join(name)
    }

    fn game_file(&self, dir: &str, game_id: &str) -> PathBuf {
        self.root.join(dir).join(format!("{game_id}.json"))
    }

    /// Read a JSON array and decode it record by record.
    async fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
        let raw: Vec<Value> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse fixture: {}", path.display()))?;
        let feed = path.display().to_string();
        let records = decode_records(raw, &feed);
        debug!(path = %feed, records = records.len(), "Fixture loaded");
        Ok(records)
    }

    async fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
        let exists = tokio::fs::try_exists(path)
            .await
            .with_context(|| format!("Failed to stat fixture: {}", path.display()))?;
        if !exists {
            return Ok(Vec::new());
        }
        Self::read_records(path).await
    }
}

#[async_trait]
impl SlateSource for FixtureSource {
    async fn games(&self, season: i32, week: u32) -> Result<Vec<Game>> {
        Self::read_records(&self.week_file(season, week, "games.json")).await
    }

    async fn odds(&self, season: i32, week: u32) -> Result<Vec<OddsSnapshot>> {
        Self::read_records(&self.week_file(season, week, "odds.json")).await
    }

    async fn team_metrics(&self, season: i32, week: u32) -> Result<Vec<TeamMetricsRecord>> {
        Self::read_records(&self.week_file(season, week, "metrics.json")).await
    }

    async fn player_props(&self, game_id: &str) -> Result<Vec<PlayerPropMarket>> {
        Self::read_optional(&self.game_file("props", game_id)).await
    }

    async fn line_history(&self, game_id: &str) -> Result<Vec<OddsSnapshot>> {
        Self::read_optional(&self.game_file("line_movement", game_id)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
