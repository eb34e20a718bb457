use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use fantatennis_core::results::tournament::TournamentKind;
use fantatennis_core::roster::pricing::Band;
use fantatennis_core::standings::leaderboard::SortKey;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fantasy tennis league: rosters, results and standings")]
pub struct Cli {
    /// SQLite database path (overrides `[database] path`)
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Seed or inspect the player directory
    Players {
        #[command(subcommand)]
        command: PlayersCommand,
    },
    /// Manage tournaments
    Tournament {
        #[command(subcommand)]
        command: TournamentCommand,
    },
    /// Build an owner's roster
    Roster {
        #[command(subcommand)]
        command: RosterCommand,
    },
    /// Import results and score tournaments
    Results {
        #[command(subcommand)]
        command: ResultsCommand,
    },
    /// Print the league standings
    Leaderboard {
        /// Ordering (defaults to `[leaderboard] default_sort`)
        #[arg(long)]
        sort: Option<SortKey>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum PlayersCommand {
    /// Upsert players from a CSV file with `id,ranking,name` columns
    Load { csv: PathBuf },
    /// List players with their band and cost
    List {
        #[arg(long)]
        band: Option<Band>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum TournamentCommand {
    /// Create a tournament
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        kind: TournamentKind,
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// List tournaments
    List,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum RosterCommand {
    /// Show the saved roster
    Show {
        #[arg(long)]
        owner: String,
    },
    /// Add or remove one player, then save
    Toggle {
        #[arg(long)]
        owner: String,
        /// Rank (1-3 digits) or full name
        #[arg(long)]
        player: String,
        #[arg(long)]
        team_name: Option<String>,
    },
    /// Remove every pick, then save
    Clear {
        #[arg(long)]
        owner: String,
    },
    /// Print the shareable picks summary
    Report {
        #[arg(long)]
        owner: String,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ResultsCommand {
    /// Import `<player>,<points>` lines from a file
    Import {
        #[arg(long)]
        tournament: i64,
        file: PathBuf,
    },
    /// Snapshot every roster for a tournament
    Lock {
        #[arg(long)]
        tournament: i64,
    },
    /// Score a locked tournament from its snapshot
    Compute {
        #[arg(long)]
        tournament: i64,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}
