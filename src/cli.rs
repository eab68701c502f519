use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "doubles league rating backend")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Reset the database schema and seed the default rule set
    Init,
    /// Generate a session bracket from a roster file
    Generate {
        /// Session date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// JSON file holding the attendee player ids
        #[arg(long)]
        roster: PathBuf,
        /// Pairing mode: balanced or random
        #[arg(long, default_value = "balanced")]
        mode: String,
    },
    /// Print current standings with rank movement
    Standings,
    /// Per-player results for one session date
    Summary {
        /// Session date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },
    /// Replay all confirmed matches and rebuild scores from scratch
    Recalculate {
        /// Skip the catch-up multiplier during the replay
        #[arg(long)]
        ignore_boost: bool,
        /// Write the result back (default is a dry run)
        #[arg(long)]
        apply: bool,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}
