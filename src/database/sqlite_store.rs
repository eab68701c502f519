use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::connection::{self, DbConn};
use super::{matches, players, rules, setup};
use crate::config::settings::{ScoreRules, TierRules};
use crate::domain::models::{MatchRecord, Player, PlayerId};
use crate::store::LeagueStore;

/// The single `LeagueStore` implementation, over one pooled SQLite
/// connection. `&mut self` throughout makes the single-logical-writer
/// assumption a compile-time property of this handle.
pub struct SqliteStore {
    conn: DbConn,
}

impl SqliteStore {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    pub fn open(database_path: &str) -> Result<Self> {
        let pool = connection::create_pool(database_path)?;
        let conn = connection::get_connection(&pool)?;
        Ok(Self { conn })
    }

    /// Fresh in-memory store with the schema applied. Test entry point.
    pub fn open_in_memory() -> Result<Self> {
        let pool = connection::create_memory_pool()?;
        let mut conn = connection::get_connection(&pool)?;
        setup::reset_database(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&mut self) -> &mut DbConn {
        &mut self.conn
    }

    pub fn reset_schema(&mut self) -> Result<()> {
        setup::reset_database(&mut self.conn)
    }
}

impl LeagueStore for SqliteStore {
    fn begin(&mut self) -> Result<()> {
        // IMMEDIATE takes the write lock up front, serializing concurrent
        // mutators at the storage layer.
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .context("Failed to begin transaction")
    }

    fn commit(&mut self) -> Result<()> {
        self.conn
            .execute_batch("COMMIT")
            .context("Failed to commit transaction")
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn
            .execute_batch("ROLLBACK")
            .context("Failed to roll back transaction")
    }

    fn get_player(&mut self, id: &str) -> Result<Option<Player>> {
        players::find_by_id(&mut self.conn, id)
    }

    fn list_players(&mut self, active_only: bool) -> Result<Vec<Player>> {
        players::list_all(&mut self.conn, active_only)
    }

    fn upsert_player(&mut self, player: &Player) -> Result<()> {
        players::upsert(&mut self.conn, player)
    }

    fn delete_player(&mut self, id: &str) -> Result<()> {
        players::delete(&mut self.conn, id)
    }

    fn get_match(&mut self, id: i64) -> Result<Option<MatchRecord>> {
        matches::find_by_id(&mut self.conn, id)
    }

    fn matches_by_date(&mut self, date: NaiveDate) -> Result<Vec<MatchRecord>> {
        matches::list_by_date(&mut self.conn, date)
    }

    fn list_match_dates(&mut self) -> Result<Vec<NaiveDate>> {
        matches::list_dates(&mut self.conn)
    }

    fn insert_match(
        &mut self,
        date: NaiveDate,
        team1: &[PlayerId],
        team2: &[PlayerId],
        group_name: Option<&str>,
    ) -> Result<i64> {
        matches::insert(&mut self.conn, date, team1, team2, group_name)
    }

    fn update_match(&mut self, record: &MatchRecord) -> Result<()> {
        matches::update(&mut self.conn, record)
    }

    fn delete_match(&mut self, id: i64) -> Result<()> {
        matches::delete(&mut self.conn, id)
    }

    fn get_score_rules(&mut self) -> Result<Option<ScoreRules>> {
        rules::get_score_rules(&mut self.conn)
    }

    fn set_score_rules(&mut self, score_rules: &ScoreRules) -> Result<()> {
        rules::set_score_rules(&mut self.conn, score_rules)
    }

    fn get_tier_rules(&mut self) -> Result<Option<TierRules>> {
        rules::get_tier_rules(&mut self.conn)
    }

    fn set_tier_rules(&mut self, tier_rules: &TierRules) -> Result<()> {
        rules::set_tier_rules(&mut self.conn, tier_rules)
    }
}
