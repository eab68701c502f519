pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod rating;
pub mod scheduler;
pub mod services;
pub mod store;
pub mod workflow;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use log::info;

use crate::cli::{Cli, Command};
use crate::config::settings::LeagueRules;
use crate::database::SqliteStore;
use crate::scheduler::{BracketScheduler, PairingMode};
use crate::services::recalculate::RecalculateService;
use crate::store::LeagueStore;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

fn database_path() -> String {
    std::env::var("DATABASE_PATH").unwrap_or_else(|_| "doubles_league.db".to_string())
}

fn open_store() -> Result<SqliteStore> {
    SqliteStore::open(&database_path())
}

fn load_rules(store: &mut SqliteStore) -> Result<LeagueRules> {
    Ok(LeagueRules {
        score: store.get_score_rules()?.unwrap_or_default(),
        tiers: store.get_tier_rules()?.unwrap_or_default(),
    })
}

pub fn handle_init() -> Result<()> {
    let mut store = open_store()?;
    store.reset_schema()?;

    let rules = LeagueRules::default();
    store.set_score_rules(&rules.score)?;
    store.set_tier_rules(&rules.tiers)?;

    info!("Initialized league database at {}", database_path());
    Ok(())
}

pub fn handle_generate(date: NaiveDate, roster: &Path, mode: &str) -> Result<()> {
    let mode = PairingMode::parse(mode)
        .ok_or_else(|| anyhow::anyhow!("unknown pairing mode '{mode}'"))?;
    let attendees = read_roster(roster)?;

    let mut store = open_store()?;
    let rules = load_rules(&mut store)?;
    let scheduler = BracketScheduler::new(&rules);
    let groups = scheduler.generate(
        &mut store,
        date,
        &attendees,
        mode,
        &mut rand::thread_rng(),
    )?;

    for group in &groups {
        println!(
            "Group {}: {} players, {} matches",
            group.label.as_str().bold(),
            group.members.len(),
            group.match_ids.len()
        );
    }
    println!(
        "[{}] bracket ready: {} attendees, {} groups",
        date,
        attendees.len(),
        groups.len()
    );
    Ok(())
}

fn read_roster(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster file {}", path.display()))?;
    serde_json::from_str(&raw).context("Roster file must be a JSON array of player ids")
}

pub fn handle_standings() -> Result<()> {
    let mut store = open_store()?;
    let players = store.list_players(true)?;
    let movement = services::stats::rank_changes(&mut store)?;

    println!(
        "{}",
        format!("{:>4}  {:<20} {:>6}  {:<10} {:>6}", "rank", "name", "score", "tier", "streak").bold()
    );
    for (idx, player) in players.iter().enumerate() {
        let arrow = match movement.get(&player.id).copied().unwrap_or(0) {
            d if d > 0 => format!("▲{d}").green(),
            d if d < 0 => format!("▼{}", -d).red(),
            _ => "·".normal(),
        };
        println!(
            "{:>4}  {:<20} {:>6}  {:<10} {:>6}  {}",
            idx + 1,
            player.name,
            player.score,
            player.tier.cyan(),
            player.streak,
            arrow
        );
    }
    Ok(())
}

pub fn handle_summary(date: NaiveDate) -> Result<()> {
    let mut store = open_store()?;
    let rows = services::stats::daily_summary(&mut store, date)?;

    if rows.is_empty() {
        println!("No confirmed matches on {date}");
        return Ok(());
    }
    for row in rows {
        let delta = if row.net_change >= 0 {
            format!("+{}", row.net_change).green()
        } else {
            row.net_change.to_string().red()
        };
        println!(
            "{:<20} {}W {}L  {}",
            row.name, row.wins, row.losses, delta
        );
    }
    Ok(())
}

pub fn handle_recalculate(ignore_boost: bool, apply: bool) -> Result<()> {
    let mut store = open_store()?;
    let rules = load_rules(&mut store)?;
    let service = RecalculateService::new(&rules);

    let report = service.recalculate_scores(&mut store, ignore_boost, !apply)?;
    println!("Replayed {} confirmed matches", report.matches_replayed);
    for change in &report.changes {
        let diff = change.diff();
        let diff_str = if diff > 0 {
            format!("+{diff}").green()
        } else if diff < 0 {
            diff.to_string().red()
        } else {
            "±0".normal()
        };
        println!(
            "{:<20} {:>5} → {:>5} ({})  {:<10} {} matches, {} wins",
            change.name,
            change.old_score,
            change.new_score,
            diff_str,
            change.tier,
            change.matches,
            change.wins
        );
    }

    if apply {
        service.recalculate_xp(&mut store)?;
        println!("Scores and attendance XP rewritten.");
    } else {
        println!("Dry run; pass --apply to write the new scores.");
    }
    Ok(())
}

pub fn handle_completions(shell: clap_complete::Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}
