use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{OptionalExtension, params};

use super::connection::DbConn;
use crate::domain::models::{MatchRecord, MatchStatus, PlayerId};

const MATCH_COLUMNS: &str = "id, date, group_name, team1_player1, team1_player2, team2_player1, team2_player2, score1, score2, change1, change2, status, submitted_by, submitted_at, approved_by, approved_at, dispute_reason";

pub fn insert(
    conn: &mut DbConn,
    date: NaiveDate,
    team1: &[PlayerId],
    team2: &[PlayerId],
    group_name: Option<&str>,
) -> Result<i64> {
    let sql = "INSERT INTO matches (date, group_name, team1_player1, team1_player2, team2_player1, team2_player2) \
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

    conn.execute(
        sql,
        params![
            date,
            group_name,
            team1.first(),
            team1.get(1),
            team2.first(),
            team2.get(1),
        ],
    )
    .context("Failed to insert match")?;

    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &mut DbConn, id: i64) -> Result<Option<MatchRecord>> {
    let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = ?1");

    conn.query_row(&sql, params![id], parse_match_row)
        .optional()
        .context("Failed to query match by id")
}

pub fn list_by_date(conn: &mut DbConn, date: NaiveDate) -> Result<Vec<MatchRecord>> {
    let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE date = ?1 ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date], parse_match_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn list_dates(conn: &mut DbConn) -> Result<Vec<NaiveDate>> {
    let sql = "SELECT DISTINCT date FROM matches ORDER BY date DESC";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn update(conn: &mut DbConn, record: &MatchRecord) -> Result<()> {
    let sql = "UPDATE matches SET date = ?1, group_name = ?2, \
               team1_player1 = ?3, team1_player2 = ?4, team2_player1 = ?5, team2_player2 = ?6, \
               score1 = ?7, score2 = ?8, change1 = ?9, change2 = ?10, status = ?11, \
               submitted_by = ?12, submitted_at = ?13, approved_by = ?14, approved_at = ?15, \
               dispute_reason = ?16 WHERE id = ?17";

    let updated = conn
        .execute(
            sql,
            params![
                record.date,
                record.group_name,
                record.team1.first(),
                record.team1.get(1),
                record.team2.first(),
                record.team2.get(1),
                record.score1,
                record.score2,
                record.change1,
                record.change2,
                record.status.as_str(),
                record.submitted_by,
                record.submitted_at,
                record.approved_by,
                record.approved_at,
                record.dispute_reason,
                record.id,
            ],
        )
        .context("Failed to update match")?;

    anyhow::ensure!(updated == 1, "No match row with id {}", record.id);
    Ok(())
}

pub fn delete(conn: &mut DbConn, id: i64) -> Result<()> {
    conn.execute("DELETE FROM matches WHERE id = ?1", params![id])
        .context("Failed to delete match")
        .map(|_| ())
}

fn parse_match_row(row: &rusqlite::Row) -> rusqlite::Result<MatchRecord> {
    let status: String = row.get(11)?;
    let team1 = collect_team(row.get(3)?, row.get(4)?);
    let team2 = collect_team(row.get(5)?, row.get(6)?);

    Ok(MatchRecord {
        id: row.get(0)?,
        date: row.get(1)?,
        group_name: row.get(2)?,
        team1,
        team2,
        score1: row.get(7)?,
        score2: row.get(8)?,
        change1: row.get(9)?,
        change2: row.get(10)?,
        status: MatchStatus::parse(&status).unwrap_or(MatchStatus::Unscored),
        submitted_by: row.get(12)?,
        submitted_at: row.get(13)?,
        approved_by: row.get(14)?,
        approved_at: row.get(15)?,
        dispute_reason: row.get(16)?,
    })
}

fn collect_team(first: Option<PlayerId>, second: Option<PlayerId>) -> Vec<PlayerId> {
    [first, second].into_iter().flatten().collect()
}
