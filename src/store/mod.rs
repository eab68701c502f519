use anyhow::Result;
use chrono::NaiveDate;

use crate::config::settings::{ScoreRules, TierRules};
use crate::domain::models::{MatchRecord, Player, PlayerId};
use crate::errors::{EngineError, EngineResult};

/// Storage port for the league engine.
///
/// One storage-agnostic interface, exactly one implementation
/// (`database::SqliteStore`). Every call is atomic on its own; multi-call
/// operations are grouped with [`with_transaction`].
pub trait LeagueStore {
    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;

    fn get_player(&mut self, id: &str) -> Result<Option<Player>>;
    fn list_players(&mut self, active_only: bool) -> Result<Vec<Player>>;
    fn upsert_player(&mut self, player: &Player) -> Result<()>;
    fn delete_player(&mut self, id: &str) -> Result<()>;

    fn get_match(&mut self, id: i64) -> Result<Option<MatchRecord>>;
    /// Matches of one session, in insertion (row id) order.
    fn matches_by_date(&mut self, date: NaiveDate) -> Result<Vec<MatchRecord>>;
    /// Distinct session dates, newest first.
    fn list_match_dates(&mut self) -> Result<Vec<NaiveDate>>;
    fn insert_match(
        &mut self,
        date: NaiveDate,
        team1: &[PlayerId],
        team2: &[PlayerId],
        group_name: Option<&str>,
    ) -> Result<i64>;
    fn update_match(&mut self, record: &MatchRecord) -> Result<()>;
    fn delete_match(&mut self, id: i64) -> Result<()>;

    fn get_score_rules(&mut self) -> Result<Option<ScoreRules>>;
    fn set_score_rules(&mut self, rules: &ScoreRules) -> Result<()>;
    fn get_tier_rules(&mut self) -> Result<Option<TierRules>>;
    fn set_tier_rules(&mut self, rules: &TierRules) -> Result<()>;
}

/// Run `f` inside a storage transaction: either every write in `f` lands, or
/// none do. Engine errors and storage failures both abort the transaction.
pub fn with_transaction<T>(
    store: &mut dyn LeagueStore,
    f: impl FnOnce(&mut dyn LeagueStore) -> EngineResult<T>,
) -> EngineResult<T> {
    store.begin()?;
    match f(store) {
        Ok(value) => {
            store.commit()?;
            Ok(value)
        }
        Err(err) => {
            // Abort failures are secondary to the original error.
            let _ = store.rollback();
            Err(err)
        }
    }
}

pub fn require_match(store: &mut dyn LeagueStore, id: i64) -> EngineResult<MatchRecord> {
    store
        .get_match(id)?
        .ok_or_else(|| EngineError::not_found(format!("match {id}")))
}

pub fn require_player(store: &mut dyn LeagueStore, id: &str) -> EngineResult<Player> {
    store
        .get_player(id)?
        .ok_or_else(|| EngineError::not_found(format!("player {id}")))
}
