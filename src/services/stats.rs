use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::models::{MatchStatus, PlayerId};
use crate::errors::EngineResult;
use crate::store::LeagueStore;

/// Per-player line of a session summary. Confirmed matches only.
#[derive(Debug, Clone)]
pub struct DailySummaryRow {
    pub player_id: PlayerId,
    pub name: String,
    pub games: i64,
    pub wins: i64,
    pub losses: i64,
    pub net_change: i64,
}

pub fn daily_summary(
    store: &mut dyn LeagueStore,
    date: NaiveDate,
) -> EngineResult<Vec<DailySummaryRow>> {
    let mut rows: HashMap<PlayerId, DailySummaryRow> = HashMap::new();

    for record in store.matches_by_date(date)? {
        if record.status != MatchStatus::Confirmed {
            continue;
        }
        let team1_won = record.team1_won();
        for (team, change, won) in [
            (&record.team1, record.change1, team1_won),
            (&record.team2, record.change2, !team1_won),
        ] {
            for id in team {
                let Some(player) = store.get_player(id)? else {
                    continue;
                };
                let row = rows.entry(id.clone()).or_insert_with(|| DailySummaryRow {
                    player_id: id.clone(),
                    name: player.name,
                    games: 0,
                    wins: 0,
                    losses: 0,
                    net_change: 0,
                });
                row.games += 1;
                row.net_change += change;
                if won {
                    row.wins += 1;
                } else {
                    row.losses += 1;
                }
            }
        }
    }

    let mut summary: Vec<DailySummaryRow> = rows.into_values().collect();
    summary.sort_by(|a, b| {
        b.net_change
            .cmp(&a.net_change)
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    Ok(summary)
}

/// Rank movement since before the latest session: positive means the player
/// climbed. Ranks are compared against scores with the latest session's
/// confirmed deltas backed out.
pub fn rank_changes(store: &mut dyn LeagueStore) -> EngineResult<HashMap<PlayerId, i64>> {
    let players = store.list_players(false)?;
    let current_rank: HashMap<PlayerId, i64> = rank_by(
        players.iter().map(|p| (p.id.clone(), p.score)).collect(),
    );

    let mut prev_scores: HashMap<PlayerId, i64> =
        players.iter().map(|p| (p.id.clone(), p.score)).collect();

    if let Some(latest) = store.list_match_dates()?.first().copied() {
        for record in store.matches_by_date(latest)? {
            if record.status != MatchStatus::Confirmed {
                continue;
            }
            for (team, change) in [
                (&record.team1, record.change1),
                (&record.team2, record.change2),
            ] {
                for id in team {
                    if let Some(score) = prev_scores.get_mut(id) {
                        *score -= change;
                    }
                }
            }
        }
    }

    let prev_rank = rank_by(prev_scores.into_iter().collect());

    Ok(current_rank
        .into_iter()
        .filter_map(|(id, rank)| prev_rank.get(&id).map(|prev| (id, prev - rank)))
        .collect())
}

fn rank_by(mut scores: Vec<(PlayerId, i64)>) -> HashMap<PlayerId, i64> {
    scores.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scores
        .into_iter()
        .enumerate()
        .map(|(idx, (id, _))| (id, idx as i64 + 1))
        .collect()
}
