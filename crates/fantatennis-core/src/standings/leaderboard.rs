// Leaderboard assembly and ranking.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::aggregate::{aggregate, SelectionSnapshot, TeamResult};
use crate::player::{PlayerDirectory, PlayerId};
use crate::roster::selection::BandCounts;
use crate::store::{Team, TeamId};

/// Display name for teams saved without one.
pub const UNNAMED_TEAM: &str = "(unnamed)";

/// Leaderboard ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    /// Total points high to low, then team name.
    #[default]
    #[serde(rename = "pointsDesc")]
    PointsDesc,
    /// Team name A to Z.
    #[serde(rename = "nameAsc")]
    NameAsc,
    /// Amount spent high to low, then team name.
    #[serde(rename = "spentDesc")]
    SpentDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::PointsDesc => "pointsDesc",
            SortKey::NameAsc => "nameAsc",
            SortKey::SpentDesc => "spentDesc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key `{0}`, expected pointsDesc, nameAsc or spentDesc")]
pub struct ParseSortKeyError(pub String);

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pointsdesc" | "points" => Ok(SortKey::PointsDesc),
            "nameasc" | "name" => Ok(SortKey::NameAsc),
            "spentdesc" | "spent" => Ok(SortKey::SpentDesc),
            _ => Err(ParseSortKeyError(s.to_string())),
        }
    }
}

/// One ranked team. Recomputed on every view; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub team_id: TeamId,
    pub team_name: String,
    pub total_points: i64,
    pub events_count: usize,
    pub spent: u64,
    pub budget_left: i64,
    pub band_counts: BandCounts,
    pub current_selection_summary: String,
    pub breakdown: Vec<TeamResult>,
}

impl LeaderboardRow {
    /// Combine a team's realized points with its current picks.
    pub fn build(
        team: &Team,
        picks: &[PlayerId],
        results: &[TeamResult],
        directory: &PlayerDirectory,
    ) -> Self {
        let totals = aggregate(team.id, results);
        let selection = SelectionSnapshot::from_picks(picks, directory);
        let team_name = if team.name.is_empty() {
            UNNAMED_TEAM.to_string()
        } else {
            team.name.clone()
        };

        LeaderboardRow {
            team_id: team.id,
            team_name,
            total_points: totals.total_points,
            events_count: totals.breakdown.len(),
            spent: selection.spent,
            budget_left: selection.budget_left,
            band_counts: selection.band_counts,
            current_selection_summary: selection.summary(),
            breakdown: totals.breakdown,
        }
    }
}

/// Everything the leaderboard reads, captured at one point in time.
#[derive(Debug, Clone, Default)]
pub struct LeagueSnapshot {
    pub teams: Vec<Team>,
    pub picks: HashMap<TeamId, Vec<PlayerId>>,
    pub results: Vec<TeamResult>,
    pub directory: PlayerDirectory,
}

/// One row per team, in snapshot order.
pub fn build_rows(snapshot: &LeagueSnapshot) -> Vec<LeaderboardRow> {
    let mut results_by_team: HashMap<TeamId, Vec<TeamResult>> = HashMap::new();
    for r in &snapshot.results {
        results_by_team.entry(r.team_id).or_default().push(r.clone());
    }

    snapshot
        .teams
        .iter()
        .map(|team| {
            let picks = snapshot
                .picks
                .get(&team.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let results = results_by_team
                .get(&team.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            LeaderboardRow::build(team, picks, results, &snapshot.directory)
        })
        .collect()
}

/// Total order over rows for `key`.
///
/// Numeric keys always fall back to the team name (byte-wise, so case
/// matters). Rows that still tie are ordered by team id, so the result never
/// depends on input order.
pub fn compare(a: &LeaderboardRow, b: &LeaderboardRow, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::PointsDesc => b.total_points.cmp(&a.total_points),
        SortKey::SpentDesc => b.spent.cmp(&a.spent),
        SortKey::NameAsc => Ordering::Equal,
    };
    primary
        .then_with(|| a.team_name.cmp(&b.team_name))
        .then_with(|| a.team_id.cmp(&b.team_id))
}

/// Order rows by `key`.
pub fn rank(mut rows: Vec<LeaderboardRow>, key: SortKey) -> Vec<LeaderboardRow> {
    rows.sort_by(|a, b| compare(a, b, key));
    rows
}
