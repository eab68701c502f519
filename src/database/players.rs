use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, params};

use super::connection::DbConn;
use crate::domain::models::{Player, Role};

const PLAYER_COLUMNS: &str = "player_id, name, score, tier, xp, is_active, join_date, match_count, win_count, streak, boost_games, last_attendance, attendance_count, consecutive_months, role";

pub fn find_by_id(conn: &mut DbConn, id: &str) -> Result<Option<Player>> {
    let sql = format!("SELECT {PLAYER_COLUMNS} FROM players WHERE player_id = ?1");

    conn.query_row(&sql, params![id], parse_player_row)
        .optional()
        .context("Failed to query player by id")
}

pub fn list_all(conn: &mut DbConn, active_only: bool) -> Result<Vec<Player>> {
    let sql = if active_only {
        format!("SELECT {PLAYER_COLUMNS} FROM players WHERE is_active = 1 ORDER BY score DESC")
    } else {
        format!("SELECT {PLAYER_COLUMNS} FROM players ORDER BY score DESC")
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_player_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn upsert(conn: &mut DbConn, player: &Player) -> Result<()> {
    let sql = "INSERT INTO players (player_id, name, score, tier, xp, is_active, join_date, match_count, win_count, streak, boost_games, last_attendance, attendance_count, consecutive_months, role) \
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15) \
               ON CONFLICT(player_id) DO UPDATE SET \
               name = excluded.name, score = excluded.score, tier = excluded.tier, xp = excluded.xp, \
               is_active = excluded.is_active, join_date = excluded.join_date, \
               match_count = excluded.match_count, win_count = excluded.win_count, \
               streak = excluded.streak, boost_games = excluded.boost_games, \
               last_attendance = excluded.last_attendance, attendance_count = excluded.attendance_count, \
               consecutive_months = excluded.consecutive_months, role = excluded.role";

    conn.execute(
        sql,
        params![
            player.id,
            player.name,
            player.score,
            player.tier,
            player.xp,
            player.is_active,
            player.join_date,
            player.match_count,
            player.win_count,
            player.streak,
            player.boost_games,
            player.last_attendance,
            player.attendance_count,
            player.consecutive_months,
            player.role.as_str(),
        ],
    )
    .context("Failed to upsert player")
    .map(|_| ())
}

pub fn delete(conn: &mut DbConn, id: &str) -> Result<()> {
    conn.execute("DELETE FROM players WHERE player_id = ?1", params![id])
        .context("Failed to delete player")
        .map(|_| ())
}

fn parse_player_row(row: &rusqlite::Row) -> rusqlite::Result<Player> {
    let role: String = row.get(14)?;
    Ok(Player {
        id: row.get(0)?,
        name: row.get(1)?,
        score: row.get(2)?,
        tier: row.get(3)?,
        xp: row.get(4)?,
        is_active: row.get(5)?,
        join_date: row.get(6)?,
        match_count: row.get(7)?,
        win_count: row.get(8)?,
        streak: row.get(9)?,
        boost_games: row.get(10)?,
        last_attendance: row.get(11)?,
        attendance_count: row.get(12)?,
        consecutive_months: row.get(13)?,
        role: Role::parse(&role),
    })
}
