// Leaderboard and listing renderers. Everything here writes to a caller
// supplied writer so stdout stays free of log lines.

use std::io::Write;

use anyhow::{Context, Result};
use fantatennis_core::roster::pricing::format_millions;
use fantatennis_core::standings::leaderboard::LeaderboardRow;
use serde::Serialize;

use crate::cli::OutputFormat;

pub fn write_leaderboard<W: Write>(
    rows: &[LeaderboardRow],
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Table => out
            .write_all(render_table(rows).as_bytes())
            .context("failed to write leaderboard"),
        OutputFormat::Csv => write_csv(rows, out),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, rows)
                .context("failed to serialize leaderboard")?;
            writeln!(out).context("failed to write leaderboard")
        }
    }
}

/// Fixed-width text table, one line per team in ranked order.
pub fn render_table(rows: &[LeaderboardRow]) -> String {
    if rows.is_empty() {
        return "No teams yet.\n".to_string();
    }

    let name_width = rows
        .iter()
        .map(|r| r.team_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Team".len());

    let mut out = format!(
        "{:>3}  {:<name_width$}  {:>7}  {:>6}  {:>7}  {:>7}  {:<11}  Picks\n",
        "#", "Team", "Points", "Events", "Spent", "Left", "A/B/C/D"
    );
    for (i, r) in rows.iter().enumerate() {
        let bands = format!(
            "{}/{}/{}/{}",
            r.band_counts.a, r.band_counts.b, r.band_counts.c, r.band_counts.d
        );
        out.push_str(&format!(
            "{:>3}  {:<name_width$}  {:>7}  {:>6}  {:>7}  {:>7}  {:<11}  {}\n",
            i + 1,
            r.team_name,
            r.total_points,
            r.events_count,
            format_millions(r.spent as i64),
            format_millions(r.budget_left),
            bands,
            r.current_selection_summary,
        ));
    }
    out
}

#[derive(Serialize)]
struct CsvRow<'a> {
    position: usize,
    team_id: i64,
    team_name: &'a str,
    total_points: i64,
    events_count: usize,
    spent: u64,
    budget_left: i64,
    band_a: usize,
    band_b: usize,
    band_c: usize,
    band_d: usize,
    current_selection: &'a str,
}

fn write_csv<W: Write>(rows: &[LeaderboardRow], out: &mut W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for (i, r) in rows.iter().enumerate() {
        wtr.serialize(CsvRow {
            position: i + 1,
            team_id: r.team_id.0,
            team_name: &r.team_name,
            total_points: r.total_points,
            events_count: r.events_count,
            spent: r.spent,
            budget_left: r.budget_left,
            band_a: r.band_counts.a,
            band_b: r.band_counts.b,
            band_c: r.band_counts.c,
            band_d: r.band_counts.d,
            current_selection: &r.current_selection_summary,
        })
        .context("failed to write CSV row")?;
    }
    wtr.flush().context("failed to flush CSV output")?;
    Ok(())
}
