//! Odds feed handling: merging odds into games and spotting line movement.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::types::{Game, LineMovement, OddsSnapshot};

/// Attach to each game the first snapshot whose `GameId` matches. Games
/// without a match get an empty snapshot.
pub fn attach_odds(games: &mut [Game], odds_feed: &[OddsSnapshot]) {
    let mut by_game: HashMap<&str, &OddsSnapshot> = HashMap::with_capacity(odds_feed.len());
    for snap in odds_feed {
        if let Some(id) = snap.game_id.as_deref() {
            by_game.entry(id).or_insert(snap);
        }
    }

    let mut matched = 0usize;
    for game in games.iter_mut() {
        match by_game.get(game.game_id.as_str()) {
            Some(snap) => {
                game.odds = (*snap).clone();
                matched += 1;
            }
            None => {
                info!(game_id = %game.game_id, "No odds found for game");
                game.odds = OddsSnapshot::default();
            }
        }
    }

    debug!(games = games.len(), matched, "Odds attached");
}

/// Opening vs latest spread for one game. `None` unless there are at least
/// two snapshots, both carry a spread, and the spreads differ.
pub fn line_movement(game: &Game, snapshots: &[OddsSnapshot]) -> Option<LineMovement> {
    if snapshots.len() < 2 {
        return None;
    }
    let old_spread = snapshots.first()?.spread()?;
    let new_spread = snapshots.last()?.spread()?;
    if old_spread == new_spread {
        return None;
    }
    Some(LineMovement {
        game: game.matchup(),
        old_spread,
        new_spread,
    })
}

/// Line movements across a slate, in game order.
pub fn analyze_line_movement(
    games: &[Game],
    history: &HashMap<String, Vec<OddsSnapshot>>,
) -> Vec<LineMovement> {
    let moves: Vec<LineMovement> = games
        .iter()
        .filter_map(|g| {
            let snapshots = history.get(&g.game_id)?;
            line_movement(g, snapshots)
        })
        .collect();

    if !moves.is_empty() {
        info!(moved = moves.len(), games = games.len(), "Line movement detected");
    }
    moves
}
