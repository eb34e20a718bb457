// Player identities and the read-only player directory.
//
// The directory is a season snapshot of the professional rankings. It is
// owned by whoever seeds it (CSV file, database) and handed to the roster
// engine and the results importer as already-resolved in-memory data.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Opaque player identifier assigned by the directory owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A professional player as listed in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Competitive rank, 1 = best.
    pub rank: u32,
}

/// Player lookup by id, rank, or case-insensitive name.
///
/// When two entries share a rank or a name, the later one wins for that key.
#[derive(Debug, Clone, Default)]
pub struct PlayerDirectory {
    players: Vec<Player>,
    by_id: HashMap<PlayerId, usize>,
    by_rank: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
}

impl PlayerDirectory {
    /// Build a directory. Players are kept in rank order for listing.
    pub fn new(mut players: Vec<Player>) -> Self {
        players.sort_by_key(|p| p.rank);

        let mut by_id = HashMap::with_capacity(players.len());
        let mut by_rank = HashMap::with_capacity(players.len());
        let mut by_name = HashMap::with_capacity(players.len());
        for (idx, p) in players.iter().enumerate() {
            by_id.insert(p.id, idx);
            by_rank.insert(p.rank, idx);
            by_name.insert(p.name.to_lowercase(), idx);
        }

        PlayerDirectory {
            players,
            by_id,
            by_rank,
            by_name,
        }
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.by_id.get(&id).map(|&idx| &self.players[idx])
    }

    pub fn by_rank(&self, rank: u32) -> Option<&Player> {
        self.by_rank.get(&rank).map(|&idx| &self.players[idx])
    }

    /// Exact name match, ignoring case.
    pub fn by_name(&self, name: &str) -> Option<&Player> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&idx| &self.players[idx])
    }

    /// Resolve an operator-supplied player key.
    ///
    /// A key of one to three ASCII digits is always a rank, even if some
    /// player is literally named "42". Anything else is a name.
    pub fn resolve(&self, key: &str) -> Option<&Player> {
        if is_rank_key(key) {
            key.parse::<u32>().ok().and_then(|rank| self.by_rank(rank))
        } else {
            self.by_name(key)
        }
    }

    /// All players, ordered by rank.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Whether `key` is treated as a rank lookup (`^\d{1,3}$`).
pub fn is_rank_key(key: &str) -> bool {
    (1..=3).contains(&key.len()) && key.bytes().all(|b| b.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// CSV seeding
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

/// Rankings CSV row: `id,ranking,name`. `rank` is accepted as an alias.
#[derive(Debug, Deserialize)]
struct RawPlayerRow {
    id: i64,
    #[serde(alias = "rank")]
    ranking: u32,
    name: String,
}

/// Read players from a rankings CSV file.
pub fn read_players_csv(path: &Path) -> Result<Vec<Player>, DirectoryError> {
    let display = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|source| DirectoryError::Io {
        path: display.clone(),
        source,
    })?;
    read_players_from(file).map_err(|source| DirectoryError::Csv {
        path: display,
        source,
    })
}

/// Read players from any CSV source with a header row.
pub fn read_players_from<R: std::io::Read>(reader: R) -> Result<Vec<Player>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut players = Vec::new();
    for row in rdr.deserialize::<RawPlayerRow>() {
        let row = row?;
        players.push(Player {
            id: PlayerId(row.id),
            name: row.name,
            rank: row.ranking,
        });
    }
    Ok(players)
}
