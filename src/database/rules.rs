use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::params;

use super::connection::DbConn;
use crate::config::settings::{ScoreRules, TierRule, TierRules};

pub fn get_score_rules(conn: &mut DbConn) -> Result<Option<ScoreRules>> {
    let mut stmt = conn.prepare("SELECT key, value FROM score_rules")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<rusqlite::Result<HashMap<String, i64>>>()
        .context("Failed to load score rules")?;

    if rows.is_empty() {
        return Ok(None);
    }

    let defaults = ScoreRules::default();
    Ok(Some(ScoreRules {
        win: *rows.get("win").unwrap_or(&defaults.win),
        loss: *rows.get("loss").unwrap_or(&defaults.loss),
        underdog_bonus: *rows.get("underdog").unwrap_or(&defaults.underdog_bonus),
        big_win_bonus: *rows.get("big_win").unwrap_or(&defaults.big_win_bonus),
        big_win_margin: *rows.get("big_diff").unwrap_or(&defaults.big_win_margin),
        target_games: *rows.get("target_games").unwrap_or(&defaults.target_games),
    }))
}

pub fn set_score_rules(conn: &mut DbConn, rules: &ScoreRules) -> Result<()> {
    let entries = [
        ("win", rules.win),
        ("loss", rules.loss),
        ("underdog", rules.underdog_bonus),
        ("big_win", rules.big_win_bonus),
        ("big_diff", rules.big_win_margin),
        ("target_games", rules.target_games),
    ];

    for (key, value) in entries {
        upsert_score_rule(conn, key, value)?;
    }
    Ok(())
}

fn upsert_score_rule(conn: &mut DbConn, key: &str, value: i64) -> Result<()> {
    let sql = "INSERT INTO score_rules (key, value) VALUES (?1, ?2) \
               ON CONFLICT(key) DO UPDATE SET value = excluded.value";

    conn.execute(sql, params![key, value])
        .with_context(|| format!("Failed to store score rule '{key}'"))
        .map(|_| ())
}

pub fn get_tier_rules(conn: &mut DbConn) -> Result<Option<TierRules>> {
    let mut stmt = conn.prepare("SELECT tier_name, threshold FROM tier_rules")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(TierRule {
                name: row.get(0)?,
                min_score: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to load tier rules")?;

    if rows.is_empty() {
        return Ok(None);
    }

    Ok(Some(TierRules::new(rows)))
}

pub fn set_tier_rules(conn: &mut DbConn, rules: &TierRules) -> Result<()> {
    let sql = "INSERT INTO tier_rules (tier_name, threshold) VALUES (?1, ?2) \
               ON CONFLICT(tier_name) DO UPDATE SET threshold = excluded.threshold";

    for rule in rules.entries() {
        conn.execute(sql, params![rule.name, rule.min_score])
            .with_context(|| format!("Failed to store tier rule '{}'", rule.name))?;
    }
    Ok(())
}
