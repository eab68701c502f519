use chrono::{NaiveDate, NaiveDateTime};
use log::info;

use super::boost::boost_multiplier;
use crate::config::settings::{LeagueRules, ScoreRules};
use crate::domain::models::{MatchRecord, MatchStatus, PlayerId};
use crate::domain::tier::tier_for_score;
use crate::errors::{EngineError, EngineResult};
use crate::store::{LeagueStore, require_match};

/// Average-score gap above which the weaker team's win earns the underdog
/// bonus.
pub const UNDERDOG_GAP: f64 = 100.0;

/// Point deltas derived for one match result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchDeltas {
    pub win_delta: i64,
    pub loss_delta: i64,
}

/// Derive the win/loss deltas from the rule set, the margin and the
/// pre-match team averages. Pure; shared with the recalculation service.
pub fn compute_deltas(
    rules: &ScoreRules,
    team1_won: bool,
    margin: i64,
    avg1: f64,
    avg2: f64,
) -> MatchDeltas {
    let mut bonus = 0;
    if margin >= rules.big_win_margin {
        bonus += rules.big_win_bonus;
    }
    if team1_won && avg2 - avg1 >= UNDERDOG_GAP {
        bonus += rules.underdog_bonus;
    } else if !team1_won && avg1 - avg2 >= UNDERDOG_GAP {
        bonus += rules.underdog_bonus;
    }

    MatchDeltas {
        win_delta: rules.win + bonus,
        loss_delta: rules.loss,
    }
}

/// Owns every numeric mutation a confirmed match makes to player records,
/// and its exact inverse.
pub struct RatingLedger<'a> {
    rules: &'a LeagueRules,
}

impl<'a> RatingLedger<'a> {
    pub fn new(rules: &'a LeagueRules) -> Self {
        Self { rules }
    }

    /// Confirm a result and apply its score deltas.
    ///
    /// A currently confirmed match is rolled back first, so at most one
    /// live application of a delta exists per match. Runs inside the
    /// caller's transaction.
    pub fn apply(
        &self,
        store: &mut dyn LeagueStore,
        match_id: i64,
        score1: i64,
        score2: i64,
        submitted_by: Option<&str>,
        now: NaiveDateTime,
    ) -> EngineResult<MatchRecord> {
        let mut record = require_match(store, match_id)?;

        if score1 == score2 {
            return Err(EngineError::validation(format!(
                "tied score {score1}:{score2} cannot be confirmed"
            )));
        }
        if record.team1.is_empty() || record.team2.is_empty() {
            return Err(EngineError::validation(format!(
                "match {match_id} is missing a team"
            )));
        }

        if record.status == MatchStatus::Confirmed {
            record = self.rollback(store, match_id, now.date())?;
        }

        let avg1 = team_average(store, &record.team1)?;
        let avg2 = team_average(store, &record.team2)?;
        let team1_won = score1 > score2;
        let margin = (score1 - score2).abs();
        let deltas = compute_deltas(&self.rules.score, team1_won, margin, avg1, avg2);

        let today = now.date();
        let (winners, losers) = if team1_won {
            (&record.team1, &record.team2)
        } else {
            (&record.team2, &record.team1)
        };
        for id in winners {
            self.apply_win(store, id, deltas.win_delta, today)?;
        }
        for id in losers {
            self.apply_loss(store, id, deltas.loss_delta)?;
        }

        record.score1 = score1;
        record.score2 = score2;
        record.change1 = if team1_won { deltas.win_delta } else { deltas.loss_delta };
        record.change2 = if team1_won { deltas.loss_delta } else { deltas.win_delta };
        record.status = MatchStatus::Confirmed;
        record.submitted_by = submitted_by.map(str::to_string);
        record.submitted_at = submitted_by.map(|_| now);
        store.update_match(&record)?;

        info!(
            "Confirmed match {}: {}:{} (+{}/{})",
            match_id, score1, score2, deltas.win_delta, deltas.loss_delta
        );
        Ok(record)
    }

    /// Undo the stored deltas of a confirmed match and reset it to unscored.
    /// No-op on anything not confirmed, which makes re-derivation idempotent.
    ///
    /// The boost multiplier is recomputed at rollback time rather than
    /// replayed from the application: if the player's catch-up window closed
    /// in between, the reversal is inexact. Known divergence, kept from the
    /// system this ledger models.
    pub fn rollback(
        &self,
        store: &mut dyn LeagueStore,
        match_id: i64,
        today: NaiveDate,
    ) -> EngineResult<MatchRecord> {
        let mut record = require_match(store, match_id)?;
        if record.status != MatchStatus::Confirmed {
            return Ok(record);
        }

        let (winners, losers, win_change, loss_change) = if record.team1_won() {
            (&record.team1, &record.team2, record.change1, record.change2)
        } else {
            (&record.team2, &record.team1, record.change2, record.change1)
        };
        for id in winners {
            self.revert_win(store, id, win_change, today)?;
        }
        for id in losers {
            self.revert_loss(store, id, loss_change)?;
        }

        record.score1 = 0;
        record.score2 = 0;
        record.change1 = 0;
        record.change2 = 0;
        record.status = MatchStatus::Unscored;
        store.update_match(&record)?;

        info!("Rolled back match {match_id}");
        Ok(record)
    }

    fn apply_win(
        &self,
        store: &mut dyn LeagueStore,
        player_id: &str,
        win_delta: i64,
        today: NaiveDate,
    ) -> EngineResult<()> {
        // Ids without a player row contribute nothing and are skipped.
        let Some(mut player) = store.get_player(player_id)? else {
            return Ok(());
        };

        player.match_count += 1;
        let multiplier = boost_multiplier(store, &player, today)?;
        let gain = ((win_delta as f64) * multiplier).floor() as i64;
        player.score += gain;
        player.win_count += 1;
        player.streak += 1;
        if multiplier > 1.0 {
            player.boost_games += 1;
        }
        player.tier = tier_for_score(&self.rules.tiers, player.score);
        store.upsert_player(&player)?;
        Ok(())
    }

    fn apply_loss(
        &self,
        store: &mut dyn LeagueStore,
        player_id: &str,
        loss_delta: i64,
    ) -> EngineResult<()> {
        let Some(mut player) = store.get_player(player_id)? else {
            return Ok(());
        };

        player.match_count += 1;
        player.score += loss_delta;
        player.streak = 0;
        player.tier = tier_for_score(&self.rules.tiers, player.score);
        store.upsert_player(&player)?;
        Ok(())
    }

    fn revert_win(
        &self,
        store: &mut dyn LeagueStore,
        player_id: &str,
        change: i64,
        today: NaiveDate,
    ) -> EngineResult<()> {
        let Some(mut player) = store.get_player(player_id)? else {
            return Ok(());
        };

        player.match_count -= 1;
        let multiplier = boost_multiplier(store, &player, today)?;
        let effective = if multiplier > 1.0 {
            ((change as f64) * multiplier).floor() as i64
        } else {
            change
        };
        player.score -= effective;
        player.win_count -= 1;
        if player.streak > 0 {
            player.streak -= 1;
        }
        if multiplier > 1.0 {
            player.boost_games -= 1;
        }
        player.tier = tier_for_score(&self.rules.tiers, player.score);
        store.upsert_player(&player)?;
        Ok(())
    }

    fn revert_loss(
        &self,
        store: &mut dyn LeagueStore,
        player_id: &str,
        change: i64,
    ) -> EngineResult<()> {
        let Some(mut player) = store.get_player(player_id)? else {
            return Ok(());
        };

        player.match_count -= 1;
        player.score -= change;
        player.tier = tier_for_score(&self.rules.tiers, player.score);
        store.upsert_player(&player)?;
        Ok(())
    }
}

/// Mean score of a team's resolvable players. The divisor is the full team
/// size (floored at 1), so unresolvable ids drag the average down rather
/// than shrinking the sample.
pub fn team_average(store: &mut dyn LeagueStore, team: &[PlayerId]) -> EngineResult<f64> {
    let mut sum = 0i64;
    for id in team {
        if let Some(player) = store.get_player(id)? {
            sum += player.score;
        }
    }
    Ok(sum as f64 / team.len().max(1) as f64)
}
