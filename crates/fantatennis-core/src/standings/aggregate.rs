// Per-team aggregation of realized tournament points and current spend.
//
// Historical points come only from team results, which were fixed when the
// tournament was scored. The spend figures come from the team's current
// picks. The two computations share no state, so editing a roster today
// cannot change yesterday's points.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::player::{Player, PlayerDirectory, PlayerId};
use crate::results::import::TournamentId;
use crate::roster::pricing::{self, BUDGET};
use crate::roster::selection::{BandCounts, RosterSelection};
use crate::store::TeamId;

/// A team's realized points from one tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamResult {
    pub team_id: TeamId,
    pub tournament_id: TournamentId,
    pub tournament_name: String,
    /// Missing points count as zero.
    pub points: Option<i64>,
    pub event_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamTotals {
    pub total_points: i64,
    /// Newest event first; same-day events by tournament name, descending.
    pub breakdown: Vec<TeamResult>,
}

/// Fold a team's results into a total and a display-ordered breakdown.
/// Rows belonging to other teams are ignored.
pub fn aggregate(team: TeamId, results: &[TeamResult]) -> TeamTotals {
    let mut breakdown: Vec<TeamResult> = results
        .iter()
        .filter(|r| r.team_id == team)
        .cloned()
        .collect();

    let total_points = breakdown
        .iter()
        .map(|r| r.points.unwrap_or(0))
        .fold(0i64, i64::saturating_add);

    // Undated events sort after every dated one.
    breakdown.sort_by(|a, b| {
        b.event_date
            .cmp(&a.event_date)
            .then_with(|| b.tournament_name.cmp(&a.tournament_name))
    });

    TeamTotals {
        total_points,
        breakdown,
    }
}

/// Spend and composition of a team's current picks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSnapshot {
    pub spent: u64,
    /// Negative only if persisted picks were saved under older prices.
    pub budget_left: i64,
    pub band_counts: BandCounts,
    /// Picks ordered by rank.
    pub players: Vec<Player>,
}

impl SelectionSnapshot {
    /// Build from persisted pick ids. Ids missing from the directory and
    /// players outside the priced range are left out.
    pub fn from_picks(player_ids: &[PlayerId], directory: &PlayerDirectory) -> Self {
        let mut players: Vec<Player> = Vec::with_capacity(player_ids.len());
        for &id in player_ids {
            match directory.get(id) {
                Some(p) if pricing::band(p.rank).is_ok() => players.push(p.clone()),
                Some(p) => warn!("Pick {} has unpriced rank {}; ignored", p.name, p.rank),
                None => warn!("Pick {} is not in the player directory; ignored", id),
            }
        }
        Self::from_players(players)
    }

    pub fn from_selection(selection: &RosterSelection) -> Self {
        Self::from_players(selection.players().into_iter().cloned().collect())
    }

    fn from_players(mut players: Vec<Player>) -> Self {
        players.sort_by_key(|p| p.rank);

        let mut spent = 0u64;
        let mut band_counts = BandCounts::default();
        for p in &players {
            if let (Ok(cost), Ok(band)) = (pricing::cost(p.rank), pricing::band(p.rank)) {
                spent += cost;
                band_counts.increment(band);
            }
        }

        SelectionSnapshot {
            spent,
            budget_left: BUDGET as i64 - spent as i64,
            band_counts,
            players,
        }
    }

    /// `#rank name` pairs joined by commas, e.g. `#1 Alice, #12 Bob`.
    pub fn summary(&self) -> String {
        self.players
            .iter()
            .map(|p| format!("#{} {}", p.rank, p.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
