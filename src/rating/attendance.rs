use chrono::{Datelike, NaiveDate};
use log::info;

use crate::domain::models::PlayerId;
use crate::errors::EngineResult;
use crate::store::LeagueStore;

const BASE_XP: i64 = 100;
const CONSECUTIVE_MONTH_XP: i64 = 50;
const EVERY_THIRD_VISIT_XP: i64 = 200;

/// Award attendance XP to every session attendee. Independent of match
/// outcomes; at most one award per player per calendar month.
pub fn award_session(
    store: &mut dyn LeagueStore,
    session_date: NaiveDate,
    attendees: &[PlayerId],
) -> EngineResult<()> {
    for id in attendees {
        record_attendance(store, id, session_date)?;
    }
    info!(
        "Awarded attendance for {} ({} attendees)",
        session_date,
        attendees.len()
    );
    Ok(())
}

pub fn record_attendance(
    store: &mut dyn LeagueStore,
    player_id: &str,
    session_date: NaiveDate,
) -> EngineResult<()> {
    let Some(mut player) = store.get_player(player_id)? else {
        return Ok(());
    };

    let month_key = month_key(session_date);
    if player.last_attendance.as_deref() == Some(month_key.as_str()) {
        return Ok(());
    }

    let mut gain = BASE_XP;
    match player.last_attendance.as_deref().and_then(parse_month_key) {
        Some((last_year, last_month)) => {
            let months_apart = i64::from(session_date.year() - last_year) * 12
                + i64::from(session_date.month() as i32 - last_month as i32);
            if months_apart == 1 {
                player.consecutive_months += 1;
                gain += CONSECUTIVE_MONTH_XP;
            } else {
                player.consecutive_months = 1;
            }
        }
        None => player.consecutive_months = 1,
    }

    player.last_attendance = Some(month_key);
    player.attendance_count += 1;
    if player.attendance_count % 3 == 0 {
        gain += EVERY_THIRD_VISIT_XP;
    }
    player.xp += gain;

    store.upsert_player(&player)?;
    Ok(())
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

fn parse_month_key(key: &str) -> Option<(i32, u32)> {
    let (year, month) = key.split_once('-')?;
    Some((year.parse().ok()?, month.parse().ok()?))
}
