// Tournaments that results are imported against.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::import::TournamentId;

/// Tournament tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TournamentKind {
    #[serde(rename = "ATP250")]
    Atp250,
    #[serde(rename = "ATP500")]
    Atp500,
    #[serde(rename = "ATP1000")]
    Atp1000,
    Major,
}

impl TournamentKind {
    pub const ALL: [TournamentKind; 4] = [
        TournamentKind::Atp250,
        TournamentKind::Atp500,
        TournamentKind::Atp1000,
        TournamentKind::Major,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentKind::Atp250 => "ATP250",
            TournamentKind::Atp500 => "ATP500",
            TournamentKind::Atp1000 => "ATP1000",
            TournamentKind::Major => "Major",
        }
    }
}

impl fmt::Display for TournamentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tournament kind `{0}`, expected ATP250, ATP500, ATP1000 or Major")]
pub struct ParseTournamentKindError(pub String);

impl FromStr for TournamentKind {
    type Err = ParseTournamentKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        TournamentKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(key))
            .ok_or_else(|| ParseTournamentKindError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub kind: TournamentKind,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Set once rosters are snapshotted for scoring.
    pub lock_at: Option<DateTime<Utc>>,
}

impl Tournament {
    pub fn is_locked(&self) -> bool {
        self.lock_at.is_some()
    }
}
