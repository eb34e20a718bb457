// Roster selection: band quotas and budget enforcement.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::pricing::{self, Band, PricingError, BUDGET, MAX_PER_BAND};
use crate::player::{Player, PlayerId};

/// Why a player could not be added. Rejections leave the selection untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("{name} has rank {rank}, outside the priced range 1-100")]
    InvalidRank { name: String, rank: u32 },

    #[error("band {band} is full (max {max})")]
    BandFull { band: Band, max: usize },

    #[error("not enough budget: costs {cost}, {remaining} remaining")]
    InsufficientBudget { cost: u64, remaining: u64 },

    #[error("{name} is listed more than once")]
    AlreadySelected { name: String },
}

/// Result of a successful toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added { band: Band, cost: u64 },
    Removed { band: Band },
}

/// Number of selected players per band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCounts {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "B")]
    pub b: usize,
    #[serde(rename = "C")]
    pub c: usize,
    #[serde(rename = "D")]
    pub d: usize,
}

impl BandCounts {
    pub fn get(&self, band: Band) -> usize {
        match band {
            Band::A => self.a,
            Band::B => self.b,
            Band::C => self.c,
            Band::D => self.d,
        }
    }

    pub fn increment(&mut self, band: Band) {
        match band {
            Band::A => self.a += 1,
            Band::B => self.b += 1,
            Band::C => self.c += 1,
            Band::D => self.d += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.a + self.b + self.c + self.d
    }
}

/// A team's current picks, partitioned by band.
///
/// Invariants after every operation: no band holds more than
/// `MAX_PER_BAND` players, and the summed cost never exceeds `BUDGET`.
/// Every mutation takes `&mut self`, so a toggle is never observed half-done.
/// Deserializing replays every stored player through the same checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredSelection")]
pub struct RosterSelection {
    bands: BTreeMap<Band, Vec<Player>>,
}

/// Wire shape of a selection before the band and budget checks run.
#[derive(Deserialize)]
struct StoredSelection {
    bands: BTreeMap<Band, Vec<Player>>,
}

impl TryFrom<StoredSelection> for RosterSelection {
    type Error = RosterError;

    fn try_from(stored: StoredSelection) -> Result<Self, Self::Error> {
        let mut selection = RosterSelection::new();
        for player in stored.bands.values().flatten() {
            if selection.contains(player.id) {
                return Err(RosterError::AlreadySelected {
                    name: player.name.clone(),
                });
            }
            selection.add(player)?;
        }
        Ok(selection)
    }
}

impl Default for RosterSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl RosterSelection {
    /// An empty selection with all four bands present.
    pub fn new() -> Self {
        RosterSelection {
            bands: Band::ALL.iter().map(|&b| (b, Vec::new())).collect(),
        }
    }

    /// Remove the player if selected, otherwise try to add them.
    ///
    /// Adding checks, in order: the rank is priced, the band has room,
    /// and the cost fits in the remaining budget.
    pub fn toggle(&mut self, player: &Player) -> Result<ToggleOutcome, RosterError> {
        if let Some(band) = self.band_of(player.id) {
            if let Some(list) = self.bands.get_mut(&band) {
                list.retain(|p| p.id != player.id);
            }
            return Ok(ToggleOutcome::Removed { band });
        }
        self.add(player)
    }

    /// Add a player who is not yet selected.
    pub(crate) fn add(&mut self, player: &Player) -> Result<ToggleOutcome, RosterError> {
        let invalid = |_: PricingError| RosterError::InvalidRank {
            name: player.name.clone(),
            rank: player.rank,
        };
        let band = pricing::band(player.rank).map_err(invalid)?;
        let cost = pricing::cost(player.rank).map_err(invalid)?;

        if self.band(band).len() >= MAX_PER_BAND {
            return Err(RosterError::BandFull {
                band,
                max: MAX_PER_BAND,
            });
        }

        let remaining = self.budget_remaining();
        if cost > remaining {
            return Err(RosterError::InsufficientBudget { cost, remaining });
        }

        self.bands.entry(band).or_default().push(player.clone());
        Ok(ToggleOutcome::Added { band, cost })
    }

    /// Empty every band.
    pub fn clear(&mut self) {
        for list in self.bands.values_mut() {
            list.clear();
        }
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.band_of(id).is_some()
    }

    fn band_of(&self, id: PlayerId) -> Option<Band> {
        self.bands
            .iter()
            .find(|(_, list)| list.iter().any(|p| p.id == id))
            .map(|(&band, _)| band)
    }

    /// Players selected in one band, in selection order.
    pub fn band(&self, band: Band) -> &[Player] {
        self.bands.get(&band).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All selected players ordered by rank.
    pub fn players(&self) -> Vec<&Player> {
        let mut all: Vec<&Player> = self.bands.values().flatten().collect();
        all.sort_by_key(|p| p.rank);
        all
    }

    /// Ids of every selected player, ordered by rank. This is the full
    /// replace-all payload for persistence.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players().into_iter().map(|p| p.id).collect()
    }

    /// Sum of the costs of every selected player.
    pub fn spent(&self) -> u64 {
        self.bands
            .values()
            .flatten()
            .filter_map(|p| pricing::cost(p.rank).ok())
            .sum()
    }

    pub fn budget_remaining(&self) -> u64 {
        BUDGET.saturating_sub(self.spent())
    }

    pub fn band_counts(&self) -> BandCounts {
        let mut counts = BandCounts::default();
        for (&band, list) in &self.bands {
            for _ in list {
                counts.increment(band);
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.bands.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
