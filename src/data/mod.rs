//! Slate data: games, odds, team metrics and player props.
//!
//! Defines the `SlateSource` trait for whatever supplies the raw feeds and
//! `load_slate`, which assembles one season/week into a `Slate`. Providers
//! are unreliable, so a failing feed is logged and treated as empty rather
//! than aborting the run.

pub mod fixtures;
pub mod odds;

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::types::{Game, OddsSnapshot, PlayerPropMarket, TeamMetricsRecord};

/// Abstraction over the external odds/stats providers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlateSource: Send + Sync {
    /// Games scheduled for a season/week.
    async fn games(&self, season: i32, week: u32) -> Result<Vec<Game>>;

    /// Latest odds snapshot per game for a season/week.
    async fn odds(&self, season: i32, week: u32) -> Result<Vec<OddsSnapshot>>;

    /// Per-team efficiency rows for a season/week.
    async fn team_metrics(&self, season: i32, week: u32) -> Result<Vec<TeamMetricsRecord>>;

    /// Player-prop markets for one game.
    async fn player_props(&self, game_id: &str) -> Result<Vec<PlayerPropMarket>>;

    /// Chronological odds snapshots for one game.
    async fn line_history(&self, game_id: &str) -> Result<Vec<OddsSnapshot>>;
}

/// Everything the pipeline needs for one season/week.
#[derive(Debug, Clone, Default)]
pub struct Slate {
    pub season: i32,
    pub week: u32,
    /// Games with odds attached.
    pub games: Vec<Game>,
    pub metrics: Vec<TeamMetricsRecord>,
    /// Props for the selected games, in game order.
    pub props: Vec<PlayerPropMarket>,
    pub line_history: HashMap<String, Vec<OddsSnapshot>>,
    /// Game ids chosen for the parlay.
    pub selection: HashSet<String>,
}

/// The configured ids, or every game on the slate when none are configured.
pub fn resolve_selection(configured: &[String], games: &[Game]) -> HashSet<String> {
    if configured.is_empty() {
        games.iter().map(|g| g.game_id.clone()).collect()
    } else {
        configured.iter().cloned().collect()
    }
}

/// Decode feed records one at a time, skipping any that do not fit `T`.
pub fn decode_records<T: DeserializeOwned>(raw: Vec<Value>, feed: &str) -> Vec<T> {
    let total = raw.len();
    let records: Vec<T> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(feed, index, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect();
    if records.len() < total {
        warn!(feed, kept = records.len(), total, "Feed had malformed records");
    }
    records
}

fn or_empty<T>(result: Result<Vec<T>>, feed: &str) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!(feed, error = %e, "Feed unavailable, continuing without it");
            Vec::new()
        }
    }
}

/// Assemble a slate from `source`. Never fails; missing feeds are empty.
pub async fn load_slate(
    source: &dyn SlateSource,
    season: i32,
    week: u32,
    configured_selection: &[String],
) -> Slate {
    let mut games = or_empty(source.games(season, week).await, "games");
    if games.is_empty() {
        info!(season, week, "No games found");
        return Slate {
            season,
            week,
            ..Default::default()
        };
    }

    let odds_feed = or_empty(source.odds(season, week).await, "odds");
    odds::attach_odds(&mut games, &odds_feed);

    let metrics = or_empty(source.team_metrics(season, week).await, "team_metrics");
    if metrics.is_empty() {
        warn!(season, week, "Team metrics not available, predictions use league baseline");
    }

    let selection = resolve_selection(configured_selection, &games);

    let mut props = Vec::new();
    let mut line_history = HashMap::new();
    for game in &games {
        if selection.contains(&game.game_id) {
            props.extend(or_empty(source.player_props(&game.game_id).await, "player_props"));
        }
        let history = or_empty(source.line_history(&game.game_id).await, "line_history");
        if !history.is_empty() {
            line_history.insert(game.game_id.clone(), history);
        }
    }

    info!(
        season,
        week,
        games = games.len(),
        selected = selection.len(),
        teams = metrics.len(),
        prop_markets = props.len(),
        "Slate loaded"
    );

    Slate {
        season,
        week,
        games,
        metrics,
        props,
        line_history,
        selection,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
