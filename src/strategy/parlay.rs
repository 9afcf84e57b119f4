//! Parlay construction.
//!
//! Combines the highest-confidence game predictions from the caller's
//! selection with the first available player-prop outcomes.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::policy::{HeuristicPolicy, PricingPolicy};
use crate::types::{Game, LegKind, Parlay, ParlayLeg, PlayerPropMarket};

/// Event label for props whose market carries no event name.
pub const DEFAULT_PROP_EVENT: &str = "Player Prop";
/// Price used for props without a moneyline and for placeholder legs.
pub const DEFAULT_PROP_ODDS: &str = "-110";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParlayConfig {
    /// Maximum game legs taken from predictions.
    pub game_legs: usize,
    /// Exact number of prop legs; shortfalls are padded with placeholders.
    pub prop_legs: usize,
}

impl Default for ParlayConfig {
    fn default() -> Self {
        Self {
            game_legs: 2,
            prop_legs: 2,
        }
    }
}

pub struct ParlayBuilder<P: PricingPolicy = HeuristicPolicy> {
    config: ParlayConfig,
    policy: P,
}

impl<P: PricingPolicy> ParlayBuilder<P> {
    pub fn new(config: ParlayConfig, policy: P) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &ParlayConfig {
        &self.config
    }

    /// Build the parlay. Never fails.
    ///
    /// The game half may come up short when fewer than `game_legs` selected
    /// games are available; only the prop half is padded.
    pub fn build(
        &self,
        selection: &HashSet<String>,
        predicted: &[Game],
        props: &[PlayerPropMarket],
    ) -> Parlay {
        let mut legs = self.select_game_legs(selection, predicted);
        let game_count = legs.len();
        legs.extend(self.select_prop_legs(props));

        let parlay = Parlay::new(legs);
        info!(
            selected = selection.len(),
            game_legs = game_count,
            prop_legs = parlay.len() - game_count,
            placeholders = parlay.iter().filter(|l| l.is_placeholder()).count(),
            "Parlay built"
        );
        parlay
    }

    /// Top selected games by confidence, highest first. Ties keep input order.
    pub fn select_game_legs(&self, selection: &HashSet<String>, predicted: &[Game]) -> Vec<ParlayLeg> {
        let mut candidates: Vec<(&Game, f64)> = predicted
            .iter()
            .filter(|g| selection.contains(&g.game_id))
            .filter_map(|g| match g.confidence() {
                Some(c) => Some((g, c)),
                None => {
                    warn!(game_id = %g.game_id, "Selected game has no prediction, skipping");
                    None
                }
            })
            .collect();

        // sort_by is stable
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        candidates
            .into_iter()
            .take(self.config.game_legs)
            .filter_map(|(g, confidence)| {
                let prediction = g.prediction.as_ref()?;
                let leg = ParlayLeg {
                    game: g.matchup(),
                    pick: prediction.recommended_pick.clone(),
                    odds: self.policy.price_for_confidence(confidence).to_string(),
                    kind: LegKind::SpreadOrTotal,
                };
                debug!(game_id = %g.game_id, confidence, leg = %leg, "Game leg selected");
                Some(leg)
            })
            .collect()
    }

    /// First available outcomes in feed order, padded to `prop_legs`.
    pub fn select_prop_legs(&self, props: &[PlayerPropMarket]) -> Vec<ParlayLeg> {
        let limit = self.config.prop_legs;
        let mut legs: Vec<ParlayLeg> = props
            .iter()
            .flat_map(|market| {
                let event = market.event_name.as_deref().unwrap_or(DEFAULT_PROP_EVENT);
                market
                    .outcomes
                    .iter()
                    .filter(|o| o.available())
                    .map(move |o| ParlayLeg {
                        game: event.to_string(),
                        pick: format!("{} {}", o.participant, o.name),
                        odds: o.money_line.clone().unwrap_or_else(|| DEFAULT_PROP_ODDS.to_string()),
                        kind: LegKind::PlayerProp,
                    })
            })
            .take(limit)
            .collect();

        if legs.len() < limit {
            debug!(
                found = legs.len(),
                wanted = limit,
                "Not enough player props, padding with placeholders"
            );
            legs.resize_with(limit, || ParlayLeg::placeholder(DEFAULT_PROP_ODDS));
        }
        legs
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Prediction, PropOutcome};

    fn make_predicted(id: &str, home: &str, away: &str, confidence: f64) -> Game {
        let mut g = Game::new(id, home, away);
        g.prediction = Some(Prediction {
            pred_margin: confidence,
            recommended_pick: home.to_string(),
            confidence,
        });
        g
    }

    fn make_outcome(participant: &str, name: &str, line: Option<&str>, available: Option<bool>) -> PropOutcome {
        PropOutcome {
            participant: participant.into(),
            name: name.into(),
            money_line: line.map(str::to_string),
            is_available: available,
        }
    }

    fn make_market(event: Option<&str>, outcomes: Vec<PropOutcome>) -> PlayerPropMarket {
        PlayerPropMarket {
            event_name: event.map(str::to_string),
            outcomes,
        }
    }

    fn select(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn builder() -> ParlayBuilder {
        ParlayBuilder::new(ParlayConfig::default(), HeuristicPolicy::default())
    }

    #[test]
    fn test_top_two_by_confidence() {
        let games = vec![
            make_predicted("1", "A", "B", 1.0),
            make_predicted("2", "C", "D", 7.5),
            make_predicted("3", "E", "F", 3.0),
        ];
        let legs = builder().select_game_legs(&select(&["1", "2", "3"]), &games);
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].game, "D @ C");
        assert_eq!(legs[0].pick, "C");
        assert_eq!(legs[0].odds, "-120");
        assert_eq!(legs[1].game, "F @ E");
        assert_eq!(legs[1].odds, "-110");
        assert!(legs.iter().all(|l| l.kind == LegKind::SpreadOrTotal));
    }

    #[test]
    fn test_only_selected_games_considered() {
        let games = vec![
            make_predicted("1", "A", "B", 9.0),
            make_predicted("2", "C", "D", 2.0),
        ];
        let legs = builder().select_game_legs(&select(&["2"]), &games);
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].pick, "C");
    }

    #[test]
    fn test_confidence_ties_keep_input_order() {
        let games = vec![
            make_predicted("1", "First", "X", 4.0),
            make_predicted("2", "Second", "Y", 4.0),
            make_predicted("3", "Third", "Z", 4.0),
        ];
        let legs = builder().select_game_legs(&select(&["3", "2", "1"]), &games);
        assert_eq!(legs[0].pick, "First");
        assert_eq!(legs[1].pick, "Second");
    }

    #[test]
    fn test_unpredicted_games_skipped() {
        let games = vec![Game::new("1", "A", "B"), make_predicted("2", "C", "D", 1.0)];
        let legs = builder().select_game_legs(&select(&["1", "2"]), &games);
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].pick, "C");
    }

    #[test]
    fn test_prop_selection_skips_unavailable_and_applies_defaults() {
        let props = vec![
            make_market(
                Some("Auburn @ Alabama"),
                vec![
                    make_outcome("J. Milroe", "Over 225.5 Passing Yards", Some("-115"), Some(false)),
                    make_outcome("J. Milroe", "Over 1.5 Passing TDs", Some("+130"), None),
                ],
            ),
            make_market(None, vec![make_outcome("R. Williams", "Anytime TD", None, Some(true))]),
        ];
        let legs = builder().select_prop_legs(&props);
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].game, "Auburn @ Alabama");
        assert_eq!(legs[0].pick, "J. Milroe Over 1.5 Passing TDs");
        assert_eq!(legs[0].odds, "+130");
        assert_eq!(legs[1].game, "Player Prop");
        assert_eq!(legs[1].pick, "R. Williams Anytime TD");
        assert_eq!(legs[1].odds, "-110");
        assert!(legs.iter().all(|l| l.kind == LegKind::PlayerProp));
    }

    #[test]
    fn test_prop_selection_stops_at_limit() {
        let outcomes: Vec<_> = (0..5)
            .map(|i| make_outcome(&format!("P{i}"), "Over", Some("-105"), Some(true)))
            .collect();
        let legs = builder().select_prop_legs(&[make_market(Some("E"), outcomes)]);
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[1].pick, "P1 Over");
    }

    #[test]
    fn test_single_prop_padded() {
        let props = vec![make_market(Some("E"), vec![make_outcome("P", "Over", Some("-105"), None)])];
        let legs = builder().select_prop_legs(&props);
        assert_eq!(legs.len(), 2);
        assert!(!legs[0].is_placeholder());
        assert!(legs[1].is_placeholder());
    }

    #[test]
    fn test_no_props_yields_placeholders() {
        let games = vec![
            make_predicted("1", "A", "B", 6.0),
            make_predicted("2", "C", "D", 2.0),
        ];
        let parlay = builder().build(&select(&["1", "2"]), &games, &[]);
        assert_eq!(parlay.len(), 4);
        for leg in &parlay.legs[2..] {
            assert_eq!(leg, &ParlayLeg {
                game: "No props found".into(),
                pick: "N/A".into(),
                odds: "-110".into(),
                kind: LegKind::PlayerProp,
            });
        }
    }

    #[test]
    fn test_game_half_not_padded() {
        let games = vec![make_predicted("1", "A", "B", 6.0)];
        let parlay = builder().build(&select(&["1"]), &games, &[]);
        assert_eq!(parlay.count_of(LegKind::SpreadOrTotal), 1);
        assert_eq!(parlay.count_of(LegKind::PlayerProp), 2);

        let empty = builder().build(&HashSet::new(), &games, &[]);
        assert_eq!(empty.len(), 2);
        assert!(empty.iter().all(|l| l.is_placeholder()));
    }

    #[test]
    fn test_game_legs_precede_prop_legs() {
        let games = vec![
            make_predicted("1", "A", "B", 6.0),
            make_predicted("2", "C", "D", 2.0),
        ];
        let props = vec![make_market(Some("E"), vec![make_outcome("P", "Over", Some("-105"), None)])];
        let parlay = builder().build(&select(&["1", "2"]), &games, &props);
        let kinds: Vec<_> = parlay.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            [LegKind::SpreadOrTotal, LegKind::SpreadOrTotal, LegKind::PlayerProp, LegKind::PlayerProp]
        );
    }
}
