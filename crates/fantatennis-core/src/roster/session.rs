// Session-scoped roster state for one owner.
//
// Holds the in-progress selection and team name between cloud saves. The
// persistence capability is passed in on save/load rather than reached
// through global storage.

use std::fmt::Write as _;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::pricing::{self, Band};
use super::selection::{RosterError, RosterSelection, ToggleOutcome};
use crate::player::{Player, PlayerDirectory, PlayerId};
use crate::store::{RosterStore, TeamId};

/// Why a persisted pick was not restored into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The id is not in the current player directory.
    UnknownPlayer,
    /// The engine refused the pick (band full, over budget, unpriced rank).
    Rejected(RosterError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedPick {
    pub player_id: PlayerId,
    pub reason: DropReason,
}

/// One owner's working roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSession {
    owner: String,
    team_name: String,
    selection: RosterSelection,
}

impl RosterSession {
    pub fn new(owner: impl Into<String>) -> Self {
        RosterSession {
            owner: owner.into(),
            team_name: String::new(),
            selection: RosterSelection::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    pub fn set_team_name(&mut self, name: &str) {
        self.team_name = name.trim().to_string();
    }

    pub fn selection(&self) -> &RosterSelection {
        &self.selection
    }

    pub fn toggle(&mut self, player: &Player) -> Result<ToggleOutcome, RosterError> {
        let outcome = self.selection.toggle(player);
        match &outcome {
            Ok(ToggleOutcome::Added { band, cost }) => debug!(
                "{}: added {} (band {}, {})",
                self.owner,
                player.name,
                band,
                pricing::format_millions(*cost as i64)
            ),
            Ok(ToggleOutcome::Removed { .. }) => {
                debug!("{}: removed {}", self.owner, player.name)
            }
            Err(e) => debug!("{}: rejected {}: {}", self.owner, player.name, e),
        }
        outcome
    }

    pub fn clear(&mut self) {
        self.selection.clear();
    }

    /// Persist the team name and the full selection (replace-all).
    pub fn save<S: RosterStore + ?Sized>(&self, store: &S) -> Result<TeamId> {
        ensure!(!self.team_name.is_empty(), "enter a team name before saving");
        let ids = self.selection.player_ids();
        let team_id = store
            .save_team(&self.owner, &self.team_name, &ids)
            .with_context(|| format!("failed to save roster for {}", self.owner))?;
        info!(
            "Saved team '{}' ({}) with {} picks",
            self.team_name,
            team_id,
            ids.len()
        );
        Ok(team_id)
    }

    /// Load the owner's saved team. Returns `None` if nothing was saved yet.
    pub fn load<S: RosterStore + ?Sized>(
        owner: &str,
        store: &S,
        directory: &PlayerDirectory,
    ) -> Result<Option<Self>> {
        let Some(saved) = store
            .load_team(owner)
            .with_context(|| format!("failed to load roster for {owner}"))?
        else {
            return Ok(None);
        };

        let (session, dropped) =
            Self::restore(owner, &saved.team.name, &saved.player_ids, directory);
        for d in &dropped {
            warn!(
                "Dropped saved pick {} for {}: {:?}",
                d.player_id, owner, d.reason
            );
        }
        Ok(Some(session))
    }

    /// Rebuild a session from persisted picks.
    ///
    /// Picks are replayed in the given order through the engine's add path,
    /// so the band and budget limits hold even for stale or tampered data.
    pub fn restore(
        owner: &str,
        team_name: &str,
        player_ids: &[PlayerId],
        directory: &PlayerDirectory,
    ) -> (Self, Vec<DroppedPick>) {
        let mut session = RosterSession::new(owner);
        session.set_team_name(team_name);
        let mut dropped = Vec::new();

        for &id in player_ids {
            if session.selection.contains(id) {
                continue;
            }
            let Some(player) = directory.get(id) else {
                dropped.push(DroppedPick {
                    player_id: id,
                    reason: DropReason::UnknownPlayer,
                });
                continue;
            };
            if let Err(e) = session.selection.add(player) {
                dropped.push(DroppedPick {
                    player_id: id,
                    reason: DropReason::Rejected(e),
                });
            }
        }

        (session, dropped)
    }

    /// Plain-text summary of the picks, one line per band.
    pub fn picks_report(&self) -> String {
        let mut out = String::new();
        if self.team_name.is_empty() {
            out.push_str("My Picks\n");
        } else {
            let _ = writeln!(out, "{} — My Picks", self.team_name);
        }

        for band in Band::ALL {
            let (lo, hi) = band.rank_range();
            let list: Vec<String> = self
                .selection
                .band(band)
                .iter()
                .map(|p| {
                    let cost = pricing::cost(p.rank).unwrap_or(0);
                    format!(
                        "{} {} ({})",
                        p.rank,
                        p.name,
                        pricing::format_millions(cost as i64)
                    )
                })
                .collect();
            let list = if list.is_empty() {
                "—".to_string()
            } else {
                list.join(", ")
            };
            let _ = writeln!(out, "{band} ({lo}–{hi}): {list}");
        }

        let spent = self.selection.spent() as i64;
        let left = self.selection.budget_remaining() as i64;
        let _ = writeln!(out, "Total spent: {}", pricing::format_millions(spent));
        let _ = write!(out, "Budget left: {}", pricing::format_millions(left));
        out
    }
}
