//! Shared types for the PARLAY engine.
//!
//! These records are the data model passed between the predictor, the
//! parlay builder and the stake sizer. Upstream feeds are sparse and
//! loosely typed, so every optional field has a defined default and
//! deserialisation never fails on a missing or oddly-typed value.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Lenient field decoding
// ---------------------------------------------------------------------------

/// Identifiers arrive as numbers from some feeds and strings from others.
fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn de_opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// A number or numeric string; anything else (null, bool, junk) is `None`.
fn de_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let parsed = match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|v| v.is_finite()))
}

fn de_f64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    de_opt_f64(d).map(|v| v.unwrap_or(0.0))
}

/// American prices are kept as signed-integer strings. Whole floats such as
/// `-115.0` are narrowed to `-115`; fractional or junk prices are `None`.
fn de_opt_price<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => n.as_f64().and_then(whole_price),
        },
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.parse::<i64>().is_ok() {
                Some(s.to_string())
            } else {
                s.parse::<f64>().ok().and_then(whole_price)
            }
        }
        _ => None,
    })
}

fn whole_price(v: f64) -> Option<String> {
    (v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64).then(|| (v as i64).to_string())
}

/// Availability flag. Only an explicit `true` is available once the field
/// is present; null or non-bool values are unavailable.
fn de_availability<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(Some(matches!(Value::deserialize(d)?, Value::Bool(true))))
}

fn de_null_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

// ---------------------------------------------------------------------------
// Games and odds
// ---------------------------------------------------------------------------

/// A scheduled game with its market odds and, once the predictor has run,
/// its prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    #[serde(rename = "GameID", alias = "GameId", deserialize_with = "de_id")]
    pub game_id: String,
    #[serde(rename = "HomeTeam")]
    pub home_team: String,
    #[serde(rename = "AwayTeam")]
    pub away_team: String,
    #[serde(rename = "Odds", default, deserialize_with = "de_null_default")]
    pub odds: OddsSnapshot,
    /// Attached by the outcome predictor; flattened onto the game record.
    #[serde(flatten)]
    pub prediction: Option<Prediction>,
}

impl Game {
    pub fn new(game_id: impl Into<String>, home_team: impl Into<String>, away_team: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            home_team: home_team.into(),
            away_team: away_team.into(),
            odds: OddsSnapshot::default(),
            prediction: None,
        }
    }

    /// "{away} @ {home}", the conventional matchup label.
    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }

    /// Market spread for the primary game line, if the odds carry one.
    pub fn spread(&self) -> Option<f64> {
        self.odds.spread()
    }

    /// Prediction confidence, or `None` before prediction.
    pub fn confidence(&self) -> Option<f64> {
        self.prediction.as_ref().map(|p| p.confidence)
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.game_id, self.matchup())?;
        match self.spread() {
            Some(s) => write!(f, " (spread {s:+.1})")?,
            None => write!(f, " (no spread)")?,
        }
        if let Some(p) = &self.prediction {
            write!(f, " → {p}")?;
        }
        Ok(())
    }
}

/// Predictor output for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Mean simulated home-minus-away margin, 2dp.
    pub pred_margin: f64,
    pub recommended_pick: String,
    /// |pred_margin − spread|, 2dp. Never negative.
    pub confidence: f64,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (margin {:+.2}, confidence {:.2})",
            self.recommended_pick, self.pred_margin, self.confidence
        )
    }
}

/// One odds snapshot for a game: a list of per-market entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OddsSnapshot {
    #[serde(
        rename = "GameId",
        alias = "GameID",
        default,
        deserialize_with = "de_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub game_id: Option<String>,
    #[serde(rename = "GameOdds", default, deserialize_with = "de_null_default")]
    pub game_odds: Vec<GameOdd>,
}

/// Marker identifying the full-game market among a snapshot's entries.
pub const FULL_GAME_ODD_TYPE: &str = "Game";

impl OddsSnapshot {
    /// Point spread of the first full-game entry that carries one.
    pub fn spread(&self) -> Option<f64> {
        self.game_odds
            .iter()
            .filter(|o| o.odd_type.as_deref() == Some(FULL_GAME_ODD_TYPE))
            .find_map(|o| o.point_spread)
    }

    pub fn is_empty(&self) -> bool {
        self.game_odds.is_empty()
    }
}

/// A single sportsbook line inside an odds snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameOdd {
    /// Market type marker. Feeds use either `OddType` or `Type`.
    #[serde(rename = "OddType", alias = "Type", default)]
    pub odd_type: Option<String>,
    #[serde(rename = "Sportsbook", default, skip_serializing_if = "Option::is_none")]
    pub sportsbook: Option<String>,
    #[serde(rename = "PointSpread", default, deserialize_with = "de_opt_f64")]
    pub point_spread: Option<f64>,
    #[serde(rename = "OverUnder", default, deserialize_with = "de_opt_f64")]
    pub over_under: Option<f64>,
    #[serde(rename = "HomeMoneyLine", default, deserialize_with = "de_opt_price")]
    pub home_money_line: Option<String>,
    #[serde(rename = "AwayMoneyLine", default, deserialize_with = "de_opt_price")]
    pub away_money_line: Option<String>,
}

/// Spread change between the opening and latest snapshot of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineMovement {
    pub game: String,
    pub old_spread: f64,
    pub new_spread: f64,
}

impl LineMovement {
    pub fn delta(&self) -> f64 {
        self.new_spread - self.old_spread
    }
}

impl fmt::Display for LineMovement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:+.1} → {:+.1}",
            self.game, self.old_spread, self.new_spread
        )
    }
}

// ---------------------------------------------------------------------------
// Team metrics
// ---------------------------------------------------------------------------

/// Per-attempt efficiency for one team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMetrics {
    pub offense: f64,
    pub defense: f64,
}

impl TeamMetrics {
    pub const ZERO: TeamMetrics = TeamMetrics { offense: 0.0, defense: 0.0 };

    pub fn new(offense: f64, defense: f64) -> Self {
        Self { offense, defense }
    }
}

/// A row of the metrics feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMetricsRecord {
    #[serde(alias = "Team")]
    pub team: String,
    #[serde(rename = "PointsPerAttempt", default, deserialize_with = "de_f64_or_zero")]
    pub points_per_attempt: f64,
    #[serde(rename = "OpponentPointsPerAttempt", default, deserialize_with = "de_f64_or_zero")]
    pub opponent_points_per_attempt: f64,
}

impl TeamMetricsRecord {
    pub fn metrics(&self) -> TeamMetrics {
        TeamMetrics::new(self.points_per_attempt, self.opponent_points_per_attempt)
    }
}

/// Team-name → metrics lookup. Unknown teams resolve to zero metrics.
#[derive(Debug, Clone, Default)]
pub struct MetricsTable {
    by_team: HashMap<String, TeamMetrics>,
}

impl MetricsTable {
    /// Build from feed rows. The first row for a team name wins.
    pub fn from_records(records: &[TeamMetricsRecord]) -> Self {
        let mut by_team = HashMap::with_capacity(records.len());
        for r in records {
            by_team.entry(r.team.clone()).or_insert_with(|| r.metrics());
        }
        Self { by_team }
    }

    /// Exact-name lookup.
    pub fn lookup(&self, team: &str) -> TeamMetrics {
        self.by_team.get(team).copied().unwrap_or(TeamMetrics::ZERO)
    }

    pub fn contains(&self, team: &str) -> bool {
        self.by_team.contains_key(team)
    }

    pub fn len(&self) -> usize {
        self.by_team.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_team.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Player props
// ---------------------------------------------------------------------------

/// A player-proposition betting market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerPropMarket {
    #[serde(rename = "EventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(rename = "Outcomes", default, deserialize_with = "de_null_default")]
    pub outcomes: Vec<PropOutcome>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropOutcome {
    #[serde(rename = "Participant", default)]
    pub participant: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "MoneyLine", default, deserialize_with = "de_opt_price")]
    pub money_line: Option<String>,
    #[serde(rename = "IsAvailable", default, deserialize_with = "de_availability")]
    pub is_available: Option<bool>,
}

impl PropOutcome {
    /// Outcomes without an availability flag are treated as available; a
    /// null flag decodes to `Some(false)`.
    pub fn available(&self) -> bool {
        self.is_available.unwrap_or(true)
    }
}

// ---------------------------------------------------------------------------
// Parlay
// ---------------------------------------------------------------------------

/// Kind of bet a leg represents. Unrecognised tags decode to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    SpreadOrTotal,
    PlayerProp,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for LegKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegKind::SpreadOrTotal => write!(f, "spread_or_total"),
            LegKind::PlayerProp => write!(f, "player_prop"),
            LegKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// One selected bet within a parlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParlayLeg {
    pub game: String,
    pub pick: String,
    /// American price as a signed integer string, e.g. "-110" or "+145".
    pub odds: String,
    #[serde(rename = "type")]
    pub kind: LegKind,
}

impl ParlayLeg {
    pub const PLACEHOLDER_GAME: &'static str = "No props found";
    pub const PLACEHOLDER_PICK: &'static str = "N/A";

    /// Filler prop leg used when the prop feed runs dry.
    pub fn placeholder(odds: &str) -> Self {
        Self {
            game: Self::PLACEHOLDER_GAME.to_string(),
            pick: Self::PLACEHOLDER_PICK.to_string(),
            odds: odds.to_string(),
            kind: LegKind::PlayerProp,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.game == Self::PLACEHOLDER_GAME && self.pick == Self::PLACEHOLDER_PICK
    }
}

impl fmt::Display for ParlayLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} ({}) [{}]", self.game, self.pick, self.odds, self.kind)
    }
}

/// Ordered parlay legs: game legs first, then prop legs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parlay {
    pub legs: Vec<ParlayLeg>,
}

impl Parlay {
    pub fn new(legs: Vec<ParlayLeg>) -> Self {
        Self { legs }
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParlayLeg> {
        self.legs.iter()
    }

    pub fn count_of(&self, kind: LegKind) -> usize {
        self.legs.iter().filter(|l| l.kind == kind).count()
    }
}

impl<'a> IntoIterator for &'a Parlay {
    type Item = &'a ParlayLeg;
    type IntoIter = std::slice::Iter<'a, ParlayLeg>;

    fn into_iter(self) -> Self::IntoIter {
        self.legs.iter()
    }
}

impl fmt::Display for Parlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, leg) in self.legs.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}. {leg}", i + 1)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stake
// ---------------------------------------------------------------------------

/// Stake for a parlay, with the figures it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeRecommendation {
    /// Amount to wager, 2dp.
    pub amount: Decimal,
    pub bankroll: Decimal,
    pub stake_fraction: f64,
    pub parlay_probability: f64,
    pub total_decimal_odds: f64,
    pub expected_value: f64,
}

impl StakeRecommendation {
    pub fn has_edge(&self) -> bool {
        self.expected_value > 0.0
    }
}

impl fmt::Display for StakeRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stake ${} ({:.1}% of ${}) | p={:.4} odds={:.2} EV={:+.4}",
            self.amount,
            self.stake_fraction * 100.0,
            self.bankroll,
            self.parlay_probability,
            self.total_decimal_odds,
            self.expected_value,
        )
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Output of one full predictor → builder → sizer pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub games: Vec<Game>,
    pub parlay: Parlay,
    pub stake: StakeRecommendation,
    #[serde(default)]
    pub line_movements: Vec<LineMovement>,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run {}: games={} legs={} moves={} {}",
            self.run_id,
            self.games.len(),
            self.parlay.len(),
            self.line_movements.len(),
            self.stake,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain errors. Missing upstream data is defaulted, never an error; these
/// signal a broken contract between stages or from the caller.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid odds format: {0:?} is not a non-zero signed integer price")]
    InvalidOddsFormat(String),

    #[error("Invalid bankroll: {0}")]
    InvalidBankroll(f64),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
