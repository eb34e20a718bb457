// Persistence ports and an in-memory implementation.
//
// The roster session and the import pipeline only talk to these traits.
// `db::Database` is the SQLite implementation; `MemoryStore` backs tests and
// embedders that keep everything in process.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::player::PlayerId;
use crate::results::import::{ResultRow, TournamentId};

/// Default number of result rows written per store round-trip.
pub const DEFAULT_CHUNK_SIZE: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fantasy team: one per owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub owner: String,
    pub name: String,
}

/// A team as last saved, with its persisted picks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedTeam {
    pub team: Team,
    pub player_ids: Vec<PlayerId>,
}

/// A result row the store refused, with the store's reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub row: ResultRow,
    pub reason: String,
}

/// Outcome of a chunked upsert. Rows succeed or fail independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub written: usize,
    pub failed: Vec<RowFailure>,
}

/// Save/load capability for a single owner's roster.
pub trait RosterStore {
    /// Find or create the owner's team, set its name, and replace its picks
    /// with `player_ids` wholesale.
    fn save_team(&self, owner: &str, team_name: &str, player_ids: &[PlayerId]) -> Result<TeamId>;

    /// Load the owner's team and picks, if one was ever saved.
    fn load_team(&self, owner: &str) -> Result<Option<SavedTeam>>;
}

/// Write side of tournament results.
pub trait ResultStore {
    /// Upsert rows keyed by `(tournament_id, player_id)`, `chunk_size` rows
    /// per round-trip. Later rows for the same key overwrite earlier ones.
    fn upsert_results(&self, rows: &[ResultRow], chunk_size: usize) -> Result<UpsertSummary>;

    /// Stored rows for one tournament, ordered by player id.
    fn results_for(&self, tournament: TournamentId) -> Result<Vec<ResultRow>>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryInner {
    teams: Vec<SavedTeam>,
    results: BTreeMap<(TournamentId, PlayerId), i64>,
}

/// Process-local store implementing both ports.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }

    /// Every saved team, in creation order.
    pub fn teams(&self) -> Vec<SavedTeam> {
        self.inner().teams.clone()
    }
}

impl RosterStore for MemoryStore {
    fn save_team(&self, owner: &str, team_name: &str, player_ids: &[PlayerId]) -> Result<TeamId> {
        let mut inner = self.inner();
        if let Some(saved) = inner.teams.iter_mut().find(|t| t.team.owner == owner) {
            saved.team.name = team_name.to_string();
            saved.player_ids = player_ids.to_vec();
            return Ok(saved.team.id);
        }

        let id = TeamId(inner.teams.len() as i64 + 1);
        inner.teams.push(SavedTeam {
            team: Team {
                id,
                owner: owner.to_string(),
                name: team_name.to_string(),
            },
            player_ids: player_ids.to_vec(),
        });
        Ok(id)
    }

    fn load_team(&self, owner: &str) -> Result<Option<SavedTeam>> {
        Ok(self
            .inner()
            .teams
            .iter()
            .find(|t| t.team.owner == owner)
            .cloned())
    }
}

impl ResultStore for MemoryStore {
    fn upsert_results(&self, rows: &[ResultRow], chunk_size: usize) -> Result<UpsertSummary> {
        let mut summary = UpsertSummary::default();
        for chunk in rows.chunks(chunk_size.max(1)) {
            let mut inner = self.inner();
            for row in chunk {
                inner
                    .results
                    .insert((row.tournament_id, row.player_id), row.raw_points);
                summary.written += 1;
            }
        }
        Ok(summary)
    }

    fn results_for(&self, tournament: TournamentId) -> Result<Vec<ResultRow>> {
        Ok(self
            .inner()
            .results
            .iter()
            .filter(|((t, _), _)| *t == tournament)
            .map(|(&(tournament_id, player_id), &raw_points)| ResultRow {
                tournament_id,
                player_id,
                raw_points,
            })
            .collect())
    }
}
