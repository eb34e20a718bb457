// Subcommand handlers. Each one reads what it needs from the database,
// runs the core operation, and writes a human-readable result to `out`.

use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use fantatennis_core::config::Config;
use fantatennis_core::db::Database;
use fantatennis_core::player::{self, PlayerDirectory};
use fantatennis_core::results::import::{self, TournamentId};
use fantatennis_core::results::tournament::TournamentKind;
use fantatennis_core::roster::pricing::{self, format_millions, Band};
use fantatennis_core::roster::selection::ToggleOutcome;
use fantatennis_core::roster::session::RosterSession;
use fantatennis_core::standings::aggregate::SelectionSnapshot;
use fantatennis_core::standings::leaderboard::{build_rows, rank, SortKey};
use fantatennis_core::store::ResultStore;
use tracing::{info, warn};

use crate::cli::{
    Command, OutputFormat, PlayersCommand, ResultsCommand, RosterCommand, TournamentCommand,
};
use crate::output;

/// Run `command`, printing to stdout.
pub fn run(command: Command, config: &Config, db: &Database) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(command, config, db, &mut out)
}

pub fn execute<W: Write>(
    command: Command,
    config: &Config,
    db: &Database,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Players { command } => match command {
            PlayersCommand::Load { csv } => load_players(db, &csv, out),
            PlayersCommand::List { band } => list_players(db, band, out),
        },
        Command::Tournament { command } => match command {
            TournamentCommand::Add {
                name,
                kind,
                start,
                end,
            } => add_tournament(db, &name, kind, start, end, out),
            TournamentCommand::List => list_tournaments(db, out),
        },
        Command::Roster { command } => match command {
            RosterCommand::Show { owner } => show_roster(db, &owner, out),
            RosterCommand::Toggle {
                owner,
                player,
                team_name,
            } => toggle_pick(db, &owner, &player, team_name.as_deref(), out),
            RosterCommand::Clear { owner } => clear_roster(db, &owner, out),
            RosterCommand::Report { owner } => roster_report(db, &owner, out),
        },
        Command::Results { command } => match command {
            ResultsCommand::Import { tournament, file } => {
                import_results(db, config, TournamentId(tournament), &file, out)
            }
            ResultsCommand::Lock { tournament } => {
                let id = TournamentId(tournament);
                let captured = db.snapshot_rosters(id)?;
                writeln!(out, "Locked tournament {id}: {captured} picks captured.")?;
                Ok(())
            }
            ResultsCommand::Compute { tournament } => {
                let id = TournamentId(tournament);
                let scored = db.compute_team_results(id)?;
                writeln!(out, "Scored {scored} teams for tournament {id}.")?;
                Ok(())
            }
        },
        Command::Leaderboard { sort, format } => {
            leaderboard(db, sort.unwrap_or(config.default_sort), format, out)
        }
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

fn load_players<W: Write>(db: &Database, csv: &Path, out: &mut W) -> Result<()> {
    let players = player::read_players_csv(csv)?;
    let written = db.upsert_players(&players)?;
    writeln!(out, "Loaded {written} players.")?;
    Ok(())
}

fn list_players<W: Write>(db: &Database, band: Option<Band>, out: &mut W) -> Result<()> {
    let directory = db.load_players()?;
    for p in directory.players() {
        let priced = pricing::band(p.rank).ok().zip(pricing::cost(p.rank).ok());
        match (priced, band) {
            (Some((b, _)), Some(wanted)) if b != wanted => continue,
            (None, Some(_)) => continue,
            _ => {}
        }
        let (band_label, cost) = match priced {
            Some((b, c)) => (b.to_string(), format_millions(c as i64)),
            None => ("-".to_string(), "-".to_string()),
        };
        writeln!(out, "{:>4}  {}  {:>6}  {}", p.rank, band_label, cost, p.name)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tournaments
// ---------------------------------------------------------------------------

fn add_tournament<W: Write>(
    db: &Database,
    name: &str,
    kind: TournamentKind,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    out: &mut W,
) -> Result<()> {
    let id = db.create_tournament(name, kind, start, end)?;
    writeln!(out, "Created tournament {id}: {name} ({kind})")?;
    Ok(())
}

fn list_tournaments<W: Write>(db: &Database, out: &mut W) -> Result<()> {
    let fmt_date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "?".into());
    for t in db.list_tournaments()? {
        let state = if t.is_locked() { "locked" } else { "open" };
        writeln!(
            out,
            "{:>4}  {:<8}  {} .. {}  {:<6}  {}",
            t.id,
            t.kind,
            fmt_date(t.start_date),
            fmt_date(t.end_date),
            state,
            t.name
        )?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

fn load_session(db: &Database, owner: &str, directory: &PlayerDirectory) -> Result<RosterSession> {
    Ok(RosterSession::load(owner, db, directory)?.unwrap_or_else(|| RosterSession::new(owner)))
}

fn show_roster<W: Write>(db: &Database, owner: &str, out: &mut W) -> Result<()> {
    let directory = db.load_players()?;
    let Some(session) = RosterSession::load(owner, db, &directory)? else {
        writeln!(out, "No saved team for {owner}.")?;
        return Ok(());
    };

    let snapshot = SelectionSnapshot::from_selection(session.selection());
    writeln!(out, "Team: {}", session.team_name())?;
    for p in &snapshot.players {
        let band = pricing::band(p.rank)?;
        let cost = pricing::cost(p.rank)?;
        writeln!(
            out,
            "  {band}  #{:<3} {:<24} {:>6}",
            p.rank,
            p.name,
            format_millions(cost as i64)
        )?;
    }
    let c = &snapshot.band_counts;
    writeln!(
        out,
        "Bands A/B/C/D: {}/{}/{}/{} (max {} each)",
        c.a,
        c.b,
        c.c,
        c.d,
        pricing::MAX_PER_BAND
    )?;
    writeln!(
        out,
        "Spent {} of {}, {} left",
        format_millions(snapshot.spent as i64),
        format_millions(pricing::BUDGET as i64),
        format_millions(snapshot.budget_left)
    )?;
    Ok(())
}

fn toggle_pick<W: Write>(
    db: &Database,
    owner: &str,
    key: &str,
    team_name: Option<&str>,
    out: &mut W,
) -> Result<()> {
    let directory = db.load_players()?;
    let mut session = load_session(db, owner, &directory)?;
    if let Some(name) = team_name {
        session.set_team_name(name);
    }

    let player = directory
        .resolve(key)
        .ok_or_else(|| anyhow!("player `{key}` not found"))?;
    let outcome = session.toggle(player)?;
    session.save(db)?;

    match outcome {
        ToggleOutcome::Added { band, cost } => writeln!(
            out,
            "Added {} to band {} for {}. Budget left: {}",
            player.name,
            band,
            format_millions(cost as i64),
            format_millions(session.selection().budget_remaining() as i64)
        )?,
        ToggleOutcome::Removed { band } => writeln!(
            out,
            "Removed {} from band {}. Budget left: {}",
            player.name,
            band,
            format_millions(session.selection().budget_remaining() as i64)
        )?,
    }
    Ok(())
}

fn clear_roster<W: Write>(db: &Database, owner: &str, out: &mut W) -> Result<()> {
    let directory = db.load_players()?;
    let Some(mut session) = RosterSession::load(owner, db, &directory)? else {
        writeln!(out, "No saved team for {owner}.")?;
        return Ok(());
    };
    session.clear();
    session.save(db)?;
    writeln!(out, "Cleared roster for {}.", session.team_name())?;
    Ok(())
}

fn roster_report<W: Write>(db: &Database, owner: &str, out: &mut W) -> Result<()> {
    let directory = db.load_players()?;
    let session = load_session(db, owner, &directory)?;
    writeln!(out, "{}", session.picks_report())?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

fn import_results<W: Write>(
    db: &Database,
    config: &Config,
    tournament: TournamentId,
    file: &Path,
    out: &mut W,
) -> Result<()> {
    let t = db
        .tournament(tournament)?
        .ok_or_else(|| anyhow!("tournament {tournament} does not exist"))?;
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let directory = db.load_players()?;

    let report = import::parse(&raw, tournament, &directory);
    for line in &report.lines {
        writeln!(out, "{line}")?;
    }

    let summary = db.upsert_results(&report.rows(), config.import_chunk_size)?;
    for failure in &summary.failed {
        warn!(
            "Result for player {} not stored: {}",
            failure.row.player_id, failure.reason
        );
        writeln!(
            out,
            "Not stored: player {} ({})",
            failure.row.player_id, failure.reason
        )?;
    }

    info!(
        "Import into {}: {} accepted, {} skipped, {} stored",
        t.name,
        report.accepted_count(),
        report.skipped_count(),
        summary.written
    );
    writeln!(out, "{}", report.summary())?;
    if t.is_locked() {
        writeln!(
            out,
            "{} is locked; run `results compute --tournament {}` to rescore.",
            t.name, tournament
        )?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

fn leaderboard<W: Write>(
    db: &Database,
    sort: SortKey,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let snapshot = db.load_snapshot()?;
    let rows = rank(build_rows(&snapshot), sort);
    output::write_leaderboard(&rows, format, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn config() -> Config {
        Config {
            league_name: "Test League".into(),
            db_path: ":memory:".into(),
            import_chunk_size: 2,
            default_sort: SortKey::PointsDesc,
            log_filter: "off".into(),
        }
    }

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "fantatennis-cli-{}-{}",
            std::process::id(),
            name
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn exec(db: &Database, args: &[&str]) -> Result<String> {
        let mut argv = vec!["fantatennis"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv)?;
        let mut buf = Vec::new();
        execute(cli.command, &config(), db, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    fn seeded_db() -> Database {
        let db = Database::open(":memory:").unwrap();
        let mut csv = String::from("id,ranking,name\n");
        for rank in 1..=100 {
            csv.push_str(&format!("{},{},Player {}\n", 500 + rank, rank, rank));
        }
        let path = temp_file("players.csv", &csv);
        let csv_arg = path.to_string_lossy().into_owned();
        assert_eq!(
            exec(&db, &["players", "load", &csv_arg]).unwrap(),
            "Loaded 100 players.\n"
        );
        let _ = std::fs::remove_file(path);
        db
    }

    #[test]
    fn list_players_filters_by_band() {
        let db = seeded_db();
        let text = exec(&db, &["players", "list", "--band", "B"]).unwrap();
        assert_eq!(text.lines().count(), 20);
        assert!(text.lines().next().unwrap().contains("Player 11"));
    }

    #[test]
    fn toggle_saves_and_report_reflects_it() {
        let db = seeded_db();
        let added = exec(
            &db,
            &["roster", "toggle", "--owner", "ana", "--player", "1", "--team-name", "Slice"],
        )
        .unwrap();
        assert!(added.starts_with("Added Player 1 to band A for 160M"));

        exec(&db, &["roster", "toggle", "--owner", "ana", "--player", "player 60"]).unwrap();
        let report = exec(&db, &["roster", "report", "--owner", "ana"]).unwrap();
        assert!(report.starts_with("Slice — My Picks"));
        assert!(report.contains("D (51–100): 60 Player 60 (20M)"));
        assert!(report.contains("Budget left: 320M"));

        let removed = exec(&db, &["roster", "toggle", "--owner", "ana", "--player", "1"]).unwrap();
        assert!(removed.starts_with("Removed Player 1 from band A"));
    }

    #[test]
    fn toggle_without_team_name_is_not_saved() {
        let db = seeded_db();
        assert!(exec(&db, &["roster", "toggle", "--owner", "bo", "--player", "5"]).is_err());
        let shown = exec(&db, &["roster", "show", "--owner", "bo"]).unwrap();
        assert_eq!(shown, "No saved team for bo.\n");
    }

    #[test]
    fn rejected_toggle_leaves_saved_roster_alone() {
        let db = seeded_db();
        for rank in ["1", "2", "3"] {
            exec(
                &db,
                &["roster", "toggle", "--owner", "cy", "--player", rank, "--team-name", "Aces"],
            )
            .unwrap();
        }
        let err = exec(&db, &["roster", "toggle", "--owner", "cy", "--player", "4"]).unwrap_err();
        assert!(err.to_string().contains("band A"), "{err}");

        let shown = exec(&db, &["roster", "show", "--owner", "cy"]).unwrap();
        assert!(shown.contains("Bands A/B/C/D: 3/0/0/0"));
    }

    #[test]
    fn full_season_flow() {
        let db = seeded_db();
        exec(
            &db,
            &["roster", "toggle", "--owner", "a", "--player", "1", "--team-name", "Zeta"],
        )
        .unwrap();
        exec(
            &db,
            &["roster", "toggle", "--owner", "b", "--player", "2", "--team-name", "Alpha"],
        )
        .unwrap();

        let created = exec(
            &db,
            &["tournament", "add", "--name", "Rome", "--kind", "ATP1000", "--start", "2025-05-07"],
        )
        .unwrap();
        assert_eq!(created, "Created tournament 1: Rome (ATP1000)\n");
        assert!(exec(&db, &["results", "lock", "--tournament", "1"])
            .unwrap()
            .contains("2 picks captured"));

        let results = temp_file("rome.txt", "1,300\nPlayer 2|300.4\n#note\nNobody,5\n,9\n");
        let file_arg = results.to_string_lossy().into_owned();
        let imported = exec(&db, &["results", "import", "--tournament", "1", &file_arg]).unwrap();
        let _ = std::fs::remove_file(results);
        assert!(imported.contains("Line 1: \"1,300\" -> player 501 = 300 pts"));
        assert!(imported.contains("Skip: \"Nobody,5\" (player not found)"));
        assert!(imported.contains("Imported 2 rows, skipped 2."));
        assert!(imported.contains("is locked"));

        exec(&db, &["results", "compute", "--tournament", "1"]).unwrap();

        let json = exec(&db, &["leaderboard", "--format", "json"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["teamName"], "Alpha");
        assert_eq!(value[1]["teamName"], "Zeta");
        assert_eq!(value[0]["totalPoints"], 300);
        assert_eq!(value[0]["breakdown"][0]["tournamentName"], "Rome");

        let csv = exec(&db, &["leaderboard", "--sort", "nameAsc", "--format", "csv"]).unwrap();
        assert!(csv.lines().nth(1).unwrap().starts_with("1,2,Alpha,300"));
    }

    #[test]
    fn import_into_unknown_tournament_fails() {
        let db = seeded_db();
        let file = temp_file("nowhere.txt", "1,10\n");
        let file_arg = file.to_string_lossy().into_owned();
        assert!(exec(&db, &["results", "import", "--tournament", "9", &file_arg]).is_err());
        let _ = std::fs::remove_file(file);
    }
}
