use anyhow::Result;

use doubles_league_ranking::cli::Command;
use doubles_league_ranking::{
    handle_completions, handle_generate, handle_init, handle_recalculate, handle_standings,
    handle_summary, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Init => handle_init(),
        Command::Generate { date, roster, mode } => handle_generate(*date, roster, mode),
        Command::Standings => handle_standings(),
        Command::Summary { date } => handle_summary(*date),
        Command::Recalculate {
            ignore_boost,
            apply,
        } => handle_recalculate(*ignore_boost, *apply),
        Command::Completions { shell } => handle_completions(*shell),
    }
}
