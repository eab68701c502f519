use std::collections::{BTreeSet, HashMap};

use log::info;

use crate::config::settings::{LeagueRules, STARTING_SCORE};
use crate::domain::models::{MatchStatus, PlayerId};
use crate::domain::tier::tier_for_score;
use crate::errors::EngineResult;
use crate::rating::attendance;
use crate::rating::compute_deltas;
use crate::store::{LeagueStore, with_transaction};

/// Wins covered by the flat replay approximation of the catch-up boost.
const REPLAY_BOOST_MATCHES: i64 = 4;

#[derive(Debug, Clone)]
pub struct PlayerScoreChange {
    pub player_id: PlayerId,
    pub name: String,
    pub old_score: i64,
    pub new_score: i64,
    pub tier: String,
    pub matches: i64,
    pub wins: i64,
}

impl PlayerScoreChange {
    pub fn diff(&self) -> i64 {
        self.new_score - self.old_score
    }
}

#[derive(Debug, Clone)]
pub struct RecalculateReport {
    /// Players that took part in at least one match, largest |diff| first.
    pub changes: Vec<PlayerScoreChange>,
    pub matches_replayed: usize,
}

struct ReplayState {
    name: String,
    old_score: i64,
    new_score: i64,
    tier: String,
    match_count: i64,
    win_count: i64,
    streak: i64,
}

/// Rebuilds player scores from the full confirmed-match history.
///
/// Replays every confirmed match in (date, id) order from the starting
/// score, through the same delta formula the live ledger uses. The
/// per-player catch-up boost is approximated by a flat multiplier on each
/// player's first few wins, or ignored entirely.
pub struct RecalculateService<'a> {
    rules: &'a LeagueRules,
}

impl<'a> RecalculateService<'a> {
    pub fn new(rules: &'a LeagueRules) -> Self {
        Self { rules }
    }

    /// With `dry_run` nothing is written; the report shows what would change.
    pub fn recalculate_scores(
        &self,
        store: &mut dyn LeagueStore,
        ignore_boost: bool,
        dry_run: bool,
    ) -> EngineResult<RecalculateReport> {
        with_transaction(store, |store| {
            self.recalculate_inner(store, ignore_boost, dry_run)
        })
    }

    fn recalculate_inner(
        &self,
        store: &mut dyn LeagueStore,
        ignore_boost: bool,
        dry_run: bool,
    ) -> EngineResult<RecalculateReport> {
        let mut state: HashMap<PlayerId, ReplayState> = store
            .list_players(false)?
            .into_iter()
            .map(|p| {
                (
                    p.id,
                    ReplayState {
                        name: p.name,
                        old_score: p.score,
                        new_score: STARTING_SCORE,
                        tier: tier_for_score(&self.rules.tiers, STARTING_SCORE),
                        match_count: 0,
                        win_count: 0,
                        streak: 0,
                    },
                )
            })
            .collect();

        let mut dates = store.list_match_dates()?;
        dates.sort_unstable();

        let mut replayed = 0usize;
        for date in dates {
            for record in store.matches_by_date(date)? {
                if record.status != MatchStatus::Confirmed {
                    continue;
                }
                replayed += 1;

                let avg1 = replay_average(&state, &record.team1);
                let avg2 = replay_average(&state, &record.team2);
                let team1_won = record.team1_won();
                let margin = (record.score1 - record.score2).abs();
                let deltas =
                    compute_deltas(&self.rules.score, team1_won, margin, avg1, avg2);

                for id in &record.team1 {
                    replay_result(&mut state, id, team1_won, &deltas, ignore_boost, self.rules);
                }
                for id in &record.team2 {
                    replay_result(&mut state, id, !team1_won, &deltas, ignore_boost, self.rules);
                }
            }
        }

        if !dry_run {
            self.write_back(store, &state)?;
            info!("Recalculated scores for {} players", state.len());
        }

        let mut changes: Vec<PlayerScoreChange> = state
            .into_iter()
            .filter(|(_, s)| s.match_count > 0)
            .map(|(player_id, s)| PlayerScoreChange {
                player_id,
                name: s.name,
                old_score: s.old_score,
                new_score: s.new_score,
                tier: s.tier,
                matches: s.match_count,
                wins: s.win_count,
            })
            .collect();
        changes.sort_by(|a, b| b.diff().abs().cmp(&a.diff().abs()));

        Ok(RecalculateReport {
            changes,
            matches_replayed: replayed,
        })
    }

    fn write_back(
        &self,
        store: &mut dyn LeagueStore,
        state: &HashMap<PlayerId, ReplayState>,
    ) -> EngineResult<()> {
        for (id, replay) in state {
            let Some(mut player) = store.get_player(id)? else {
                continue;
            };
            player.score = replay.new_score;
            player.tier = replay.tier.clone();
            player.match_count = replay.match_count;
            player.win_count = replay.win_count;
            player.streak = replay.streak;
            store.upsert_player(&player)?;
        }
        Ok(())
    }

    /// Rebuilds attendance XP by replaying every session date in order.
    pub fn recalculate_xp(&self, store: &mut dyn LeagueStore) -> EngineResult<()> {
        with_transaction(store, |store| {
            for mut player in store.list_players(false)? {
                player.xp = 0;
                player.last_attendance = None;
                player.attendance_count = 0;
                player.consecutive_months = 0;
                store.upsert_player(&player)?;
            }

            let mut dates = store.list_match_dates()?;
            dates.sort_unstable();

            for date in dates {
                let mut attendees: BTreeSet<PlayerId> = BTreeSet::new();
                for record in store.matches_by_date(date)? {
                    attendees.extend(record.team1.iter().cloned());
                    attendees.extend(record.team2.iter().cloned());
                }
                for id in attendees {
                    attendance::record_attendance(store, &id, date)?;
                }
            }

            info!("Recalculated attendance XP");
            Ok(())
        })
    }
}

fn replay_average(state: &HashMap<PlayerId, ReplayState>, team: &[PlayerId]) -> f64 {
    let sum: i64 = team
        .iter()
        .filter_map(|id| state.get(id).map(|s| s.new_score))
        .sum();
    sum as f64 / team.len().max(1) as f64
}

fn replay_result(
    state: &mut HashMap<PlayerId, ReplayState>,
    player_id: &str,
    won: bool,
    deltas: &crate::rating::MatchDeltas,
    ignore_boost: bool,
    rules: &LeagueRules,
) {
    let Some(replay) = state.get_mut(player_id) else {
        return;
    };

    replay.match_count += 1;
    if won {
        let mut multiplier = 1.0;
        if !ignore_boost && replay.match_count <= REPLAY_BOOST_MATCHES {
            multiplier = crate::rating::boost::BOOST_MULTIPLIER;
        }
        replay.new_score += ((deltas.win_delta as f64) * multiplier).floor() as i64;
        replay.win_count += 1;
        replay.streak += 1;
    } else {
        replay.new_score += deltas.loss_delta;
        replay.streak = 0;
    }
    replay.tier = tier_for_score(&rules.tiers, replay.new_score);
}
