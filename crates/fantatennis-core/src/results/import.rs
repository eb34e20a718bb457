// Bulk tournament-result import.
//
// Operators paste one row per line: `<player key><sep><points>` where the
// separator is a comma, pipe, or tab. The player key is a rank (1-3 digits)
// or a full player name. Every non-ignored line is reported as accepted or
// skipped, and a bad line never stops the rest of the batch.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::player::{PlayerDirectory, PlayerId};

/// Opaque tournament identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TournamentId(pub i64);

impl fmt::Display for TournamentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One player's raw point award for one tournament. Unique per
/// `(tournament_id, player_id)`: storing the same pair again overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub tournament_id: TournamentId,
    pub player_id: PlayerId,
    pub raw_points: i64,
}

/// Why an input line was not imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("need 2 columns")]
    NeedTwoColumns,

    #[error("points not a number")]
    PointsNotANumber,

    #[error("player not found")]
    PlayerNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineStatus {
    Accepted(ResultRow),
    Skipped(SkipReason),
}

/// Audit entry for one non-ignored input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOutcome {
    /// 1-based line number in the submitted text.
    pub line_no: usize,
    /// The trimmed line as submitted.
    pub text: String,
    pub status: LineStatus,
}

impl fmt::Display for LineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            LineStatus::Accepted(row) => write!(
                f,
                "Line {}: \"{}\" -> player {} = {} pts",
                self.line_no, self.text, row.player_id, row.raw_points
            ),
            LineStatus::Skipped(reason) => {
                write!(f, "Skip: \"{}\" ({})", self.text, reason)
            }
        }
    }
}

/// Full result of parsing a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub lines: Vec<LineOutcome>,
}

impl ImportReport {
    /// Accepted rows, in input order.
    pub fn rows(&self) -> Vec<ResultRow> {
        self.lines
            .iter()
            .filter_map(|l| match l.status {
                LineStatus::Accepted(row) => Some(row),
                LineStatus::Skipped(_) => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &LineOutcome> {
        self.lines
            .iter()
            .filter(|l| matches!(l.status, LineStatus::Skipped(_)))
    }

    pub fn accepted_count(&self) -> usize {
        self.lines.len() - self.skipped_count()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }

    /// One-line summary: `Imported N rows, skipped M.`
    pub fn summary(&self) -> String {
        format!(
            "Imported {} rows, skipped {}.",
            self.accepted_count(),
            self.skipped_count()
        )
    }
}

/// Parse a bulk submission for `tournament` against `directory`.
///
/// Blank lines and lines starting with `#` are ignored and do not appear in
/// the report. Points are rounded to the nearest integer, halves upward, and
/// an empty points field counts as zero.
pub fn parse(raw: &str, tournament: TournamentId, directory: &PlayerDirectory) -> ImportReport {
    let mut report = ImportReport::default();

    for (idx, raw_line) in raw.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let status = match parse_line(line, tournament, directory) {
            Ok(row) => LineStatus::Accepted(row),
            Err(reason) => LineStatus::Skipped(reason),
        };
        report.lines.push(LineOutcome {
            line_no: idx + 1,
            text: line.to_string(),
            status,
        });
    }

    report
}

fn parse_line(
    line: &str,
    tournament: TournamentId,
    directory: &PlayerDirectory,
) -> Result<ResultRow, SkipReason> {
    let parts: Vec<&str> = line
        .split(|c| matches!(c, ',' | '|' | '\t'))
        .map(str::trim)
        .collect();
    if parts.len() < 2 {
        return Err(SkipReason::NeedTwoColumns);
    }

    let points = parse_points(parts[1]).ok_or(SkipReason::PointsNotANumber)?;
    let player = directory
        .resolve(parts[0])
        .ok_or(SkipReason::PlayerNotFound)?;

    Ok(ResultRow {
        tournament_id: tournament,
        player_id: player.id,
        raw_points: points,
    })
}

/// Largest point magnitude an import will accept. Keeps every team total
/// well inside `i64` and SQLite's integer range.
pub const MAX_POINTS: i64 = 1_000_000_000;

/// Parse a finite number and round it to an integer, halves toward positive
/// infinity. An empty field reads as zero.
fn parse_points(field: &str) -> Option<i64> {
    if field.is_empty() {
        return Some(0);
    }
    let value: f64 = field.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let mut rounded = value.round();
    // `round` sends halves away from zero; negative halves go up instead.
    if rounded - value == -0.5 {
        rounded += 1.0;
    }
    if rounded.abs() > MAX_POINTS as f64 {
        return None;
    }
    Some(rounded as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;

    const T1: TournamentId = TournamentId(1);

    fn directory() -> PlayerDirectory {
        PlayerDirectory::new(vec![
            Player { id: PlayerId(1), name: "Alice".into(), rank: 1 },
            Player { id: PlayerId(2), name: "Bob".into(), rank: 2 },
        ])
    }

    fn skip_reasons(report: &ImportReport) -> Vec<SkipReason> {
        report
            .skipped()
            .filter_map(|l| match l.status {
                LineStatus::Skipped(r) => Some(r),
                LineStatus::Accepted(_) => None,
            })
            .collect()
    }

    #[test]
    fn mixed_rank_and_name_submission() {
        let report = parse("1,2000\nBob,1500\n#comment\n,500", T1, &directory());
        assert_eq!(
            report.rows(),
            vec![
                ResultRow { tournament_id: T1, player_id: PlayerId(1), raw_points: 2000 },
                ResultRow { tournament_id: T1, player_id: PlayerId(2), raw_points: 1500 },
            ]
        );
        assert_eq!(report.accepted_count(), 2);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(skip_reasons(&report), vec![SkipReason::PlayerNotFound]);
        // The comment line is not reported at all.
        assert!(report.lines.iter().all(|l| !l.text.starts_with('#')));
        assert_eq!(report.summary(), "Imported 2 rows, skipped 1.");
    }

    #[test]
    fn blank_lines_ignored() {
        let report = parse("\n   \n\t\n1,10\n", T1, &directory());
        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.lines[0].line_no, 4);
    }

    #[test]
    fn pipe_and_tab_separators() {
        let report = parse("1|100\nbob\t200", T1, &directory());
        assert_eq!(report.accepted_count(), 2);
        assert_eq!(report.rows()[1].raw_points, 200);
    }

    #[test]
    fn single_column_needs_two() {
        let report = parse("Alice", T1, &directory());
        assert_eq!(skip_reasons(&report), vec![SkipReason::NeedTwoColumns]);
        assert_eq!(report.lines[0].to_string(), "Skip: \"Alice\" (need 2 columns)");
    }

    #[test]
    fn non_numeric_points_skipped() {
        let report = parse("1,lots\n1,inf\n2,NaN", T1, &directory());
        assert_eq!(report.accepted_count(), 0);
        assert_eq!(
            skip_reasons(&report),
            vec![SkipReason::PointsNotANumber; 3]
        );
    }

    #[test]
    fn empty_points_count_as_zero() {
        let report = parse("Bob,\n1,   ", T1, &directory());
        assert_eq!(report.skipped_count(), 0);
        assert!(report.rows().iter().all(|r| r.raw_points == 0));
        assert_eq!(report.accepted_count(), 2);
    }

    #[test]
    fn out_of_range_points_skipped() {
        let report = parse("Bob,1e20\n1,-1e20\n2,1000000000", T1, &directory());
        assert_eq!(
            skip_reasons(&report),
            vec![SkipReason::PointsNotANumber; 2]
        );
        assert_eq!(report.rows()[0].raw_points, MAX_POINTS);
    }

    #[test]
    fn points_checked_before_player() {
        // Both the key and the points are bad; the points reason is reported.
        let report = parse("Nobody,abc", T1, &directory());
        assert_eq!(skip_reasons(&report), vec![SkipReason::PointsNotANumber]);
    }

    #[test]
    fn points_rounded_half_up() {
        let report = parse("1,10.5\n2,-2.5\n1,0.49999999999999994\n2,-0.5\n1,-2.6", T1, &directory());
        let points: Vec<i64> = report.rows().iter().map(|r| r.raw_points).collect();
        assert_eq!(points, vec![11, -2, 0, 0, -3]);
    }

    #[test]
    fn extra_columns_ignored() {
        let report = parse("Alice,90,extra,stuff", T1, &directory());
        assert_eq!(report.rows()[0].raw_points, 90);
    }

    #[test]
    fn unknown_rank_not_found() {
        let report = parse("3,100\n0,100\n1000,100", T1, &directory());
        assert_eq!(skip_reasons(&report), vec![SkipReason::PlayerNotFound; 3]);
    }

    #[test]
    fn windows_line_endings() {
        let report = parse("1,10\r\n2,20\r\n", T1, &directory());
        assert_eq!(report.accepted_count(), 2);
    }

    #[test]
    fn same_line_twice_yields_two_rows_for_upsert() {
        // De-duplication is the store's job: both rows carry the same key.
        let report = parse("1,10\n1,20", T1, &directory());
        let rows = report.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].player_id, rows[1].player_id);
    }
}
