use chrono::{Datelike, NaiveDate};

use crate::domain::models::Player;
use crate::errors::EngineResult;
use crate::store::LeagueStore;

/// Win-score multiplier granted to late-season joiners.
pub const BOOST_MULTIPLIER: f64 = 1.25;

/// Boost allowance accrues at four wins per elapsed season month.
const WINS_PER_MONTH: i64 = 4;

/// Catch-up multiplier for a win by `player`.
///
/// Players whose first match falls in the current season year get
/// `BOOST_MULTIPLIER` for their first `boost_cap` boosted wins; everyone
/// else gets 1.0. A player with no match history counts as first playing
/// this month.
pub fn boost_multiplier(
    store: &mut dyn LeagueStore,
    player: &Player,
    today: NaiveDate,
) -> EngineResult<f64> {
    let (year, month) =
        first_play_month(store, &player.id)?.unwrap_or((today.year(), today.month()));

    match boost_cap(year, month, today) {
        Some(cap) if player.boost_games < cap => Ok(BOOST_MULTIPLIER),
        _ => Ok(1.0),
    }
}

/// Number of boost-eligible wins for a first appearance in
/// (`first_year`, `first_month`), or `None` outside the current season year.
///
/// `catch_up` matches what an early joiner could have accumulated by now;
/// `limit` caps it by the months remaining, so a late joiner can never
/// overtake an early one.
pub fn boost_cap(first_year: i32, first_month: u32, today: NaiveDate) -> Option<i64> {
    if first_year != today.year() {
        return None;
    }
    let month = i64::from(first_month);
    let catch_up = (month - 1) * WINS_PER_MONTH;
    let limit = (13 - month) * WINS_PER_MONTH;
    Some(catch_up.min(limit))
}

/// (year, month) of the first session the player appears in, any status.
pub fn first_play_month(
    store: &mut dyn LeagueStore,
    player_id: &str,
) -> EngineResult<Option<(i32, u32)>> {
    let mut dates = store.list_match_dates()?;
    dates.sort_unstable();

    for date in dates {
        for record in store.matches_by_date(date)? {
            if record.involves(player_id) {
                return Ok(Some((date.year(), date.month())));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SqliteStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cap_grows_with_join_month_until_the_symmetric_limit() {
        let today = date(2025, 8, 7);
        // January joiner has had the whole season: nothing to catch up.
        assert_eq!(boost_cap(2025, 1, today), Some(0));
        // Mid-season joiner: catch-up and remaining-months limit meet at 24.
        assert_eq!(boost_cap(2025, 7, today), Some(24));
        // December joiner is limited by the four wins a month can hold.
        assert_eq!(boost_cap(2025, 12, today), Some(4));
    }

    #[test]
    fn cap_never_exceeds_remaining_month_allowance() {
        let today = date(2025, 8, 7);
        for month in 1..=12u32 {
            let cap = boost_cap(2025, month, today).unwrap();
            assert!(cap <= (13 - i64::from(month)) * 4);
        }
    }

    #[test]
    fn previous_season_first_play_gets_no_boost() {
        assert_eq!(boost_cap(2024, 7, date(2025, 8, 7)), None);
    }

    #[test]
    fn first_play_month_scans_history_ascending() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let team_a = vec!["p1".to_string()];
        let team_b = vec!["p2".to_string()];
        store.insert_match(date(2025, 5, 10), &team_a, &team_b, None).unwrap();
        store.insert_match(date(2025, 3, 8), &team_a, &team_b, None).unwrap();

        assert_eq!(first_play_month(&mut store, "p1").unwrap(), Some((2025, 3)));
        assert_eq!(first_play_month(&mut store, "ghost").unwrap(), None);
    }

    #[test]
    fn multiplier_respects_the_cap() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let today = date(2025, 7, 12);
        let team_a = vec!["p1".to_string()];
        let team_b = vec!["p2".to_string()];
        store.insert_match(today, &team_a, &team_b, None).unwrap();

        // cap for a July first play is 24
        let mut player = Player::new("p1", "One");
        player.boost_games = 23;
        assert_eq!(boost_multiplier(&mut store, &player, today).unwrap(), BOOST_MULTIPLIER);

        player.boost_games = 24;
        assert_eq!(boost_multiplier(&mut store, &player, today).unwrap(), 1.0);
    }
}
