// fantatennis entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Load config (copying defaults on first run)
// 3. Initialize tracing (stderr, so reports on stdout stay clean)
// 4. Open database
// 5. Dispatch the subcommand

mod cli;
mod commands;
mod output;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use fantatennis_core::config;
use fantatennis_core::db::Database;
use tracing::{debug, info};

use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config().context("failed to load configuration")?;
    init_tracing(&config.log_filter)?;
    debug!("Config loaded: league={}", config.league_name);

    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path.clone());
    ensure_parent_dir(&db_path)?;
    let db = Database::open(&db_path).context("failed to open database")?;
    info!("Database opened at {}", db_path);

    commands::run(cli.command, &config, &db)
}

/// Initialize tracing to stderr. `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

fn ensure_parent_dir(db_path: &str) -> anyhow::Result<()> {
    if db_path == ":memory:" {
        return Ok(());
    }
    match Path::new(db_path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display())),
        _ => Ok(()),
    }
}
