// SQLite persistence layer for players, tournaments, rosters and results.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::player::{Player, PlayerDirectory, PlayerId};
use crate::results::import::{ResultRow, TournamentId};
use crate::results::tournament::{Tournament, TournamentKind};
use crate::standings::aggregate::TeamResult;
use crate::standings::leaderboard::LeagueSnapshot;
use crate::store::{
    ResultStore, RosterStore, RowFailure, SavedTeam, Team, TeamId, UpsertSummary,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed implementation of the roster and result stores, plus the
/// tournament lock/score batch step and the leaderboard read side.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                id      INTEGER PRIMARY KEY,
                ranking INTEGER NOT NULL,
                name    TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_players_ranking ON players(ranking);

            CREATE TABLE IF NOT EXISTS tournaments (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                tournament_type TEXT NOT NULL,
                start_date      TEXT,
                end_date        TEXT,
                lock_at         TEXT
            );

            CREATE TABLE IF NOT EXISTS teams (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL UNIQUE,
                name     TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS roster_picks (
                team_id   INTEGER NOT NULL REFERENCES teams(id),
                player_id INTEGER NOT NULL REFERENCES players(id),
                PRIMARY KEY (team_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS roster_snapshots (
                tournament_id INTEGER NOT NULL REFERENCES tournaments(id),
                team_id       INTEGER NOT NULL REFERENCES teams(id),
                player_id     INTEGER NOT NULL REFERENCES players(id),
                PRIMARY KEY (tournament_id, team_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS player_results (
                tournament_id INTEGER NOT NULL REFERENCES tournaments(id),
                player_id     INTEGER NOT NULL REFERENCES players(id),
                raw_points    INTEGER NOT NULL,
                PRIMARY KEY (tournament_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS team_results (
                team_id       INTEGER NOT NULL REFERENCES teams(id),
                tournament_id INTEGER NOT NULL REFERENCES tournaments(id),
                points        INTEGER,
                PRIMARY KEY (team_id, tournament_id)
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Insert or update players by id in a single transaction. Returns the
    /// number of rows written.
    pub fn upsert_players(&self, players: &[Player]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin player transaction")?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO players (id, ranking, name) VALUES (?1, ?2, ?3)
                     ON CONFLICT(id) DO UPDATE SET
                        ranking = excluded.ranking,
                        name    = excluded.name",
                )
                .context("failed to prepare player upsert")?;
            for p in players {
                stmt.execute(params![p.id.0, p.rank, p.name])
                    .with_context(|| format!("failed to upsert player {}", p.id))?;
            }
        }
        tx.commit().context("failed to commit players")?;
        info!("Upserted {} players", players.len());
        Ok(players.len())
    }

    /// Every stored player, indexed for lookup.
    pub fn load_players(&self) -> Result<PlayerDirectory> {
        let conn = self.conn();
        query_players(&conn).map(PlayerDirectory::new)
    }

    // ------------------------------------------------------------------
    // Tournaments
    // ------------------------------------------------------------------

    pub fn create_tournament(
        &self,
        name: &str,
        kind: TournamentKind,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<TournamentId> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                bail!("tournament end date {end} is before start date {start}");
            }
        }
        let conn = self.conn();
        let id: i64 = conn
            .query_row(
                "INSERT INTO tournaments (name, tournament_type, start_date, end_date)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id",
                params![
                    name,
                    kind.as_str(),
                    start_date.map(|d| d.format(DATE_FORMAT).to_string()),
                    end_date.map(|d| d.format(DATE_FORMAT).to_string()),
                ],
                |row| row.get(0),
            )
            .context("failed to create tournament")?;
        info!("Created tournament {} ({}) as {}", name, kind, id);
        Ok(TournamentId(id))
    }

    /// All tournaments, earliest start first; undated ones last.
    pub fn list_tournaments(&self) -> Result<Vec<Tournament>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, name, tournament_type, start_date, end_date, lock_at
                 FROM tournaments
                 ORDER BY start_date IS NULL, start_date, id",
            )
            .context("failed to prepare list_tournaments query")?;
        let tournaments = stmt
            .query_map([], map_tournament)
            .context("failed to query tournaments")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map tournament rows")?;
        Ok(tournaments)
    }

    pub fn tournament(&self, id: TournamentId) -> Result<Option<Tournament>> {
        let conn = self.conn();
        query_tournament(&conn, id)
    }

    /// Lock a tournament: copy every team's current picks into the
    /// tournament's roster snapshot and stamp `lock_at`. Returns the number
    /// of picks captured. A tournament can only be locked once.
    pub fn snapshot_rosters(&self, tournament: TournamentId) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin lock transaction")?;

        let Some(t) = query_tournament(&tx, tournament)? else {
            bail!("tournament {tournament} does not exist");
        };
        if t.is_locked() {
            bail!("tournament {} ({}) is already locked", t.name, tournament);
        }

        let captured = tx
            .execute(
                "INSERT INTO roster_snapshots (tournament_id, team_id, player_id)
                 SELECT ?1, team_id, player_id FROM roster_picks",
                params![tournament.0],
            )
            .context("failed to snapshot rosters")?;
        tx.execute(
            "UPDATE tournaments SET lock_at = ?2 WHERE id = ?1",
            params![tournament.0, Utc::now().to_rfc3339()],
        )
        .context("failed to stamp lock time")?;
        tx.commit().context("failed to commit lock")?;

        info!("Locked {} with {} roster picks", t.name, captured);
        Ok(captured)
    }

    /// Score a locked tournament: sum the raw points of each team's
    /// snapshotted players and upsert the totals into `team_results`.
    /// Safe to re-run after further result imports. Returns the number of
    /// teams scored.
    pub fn compute_team_results(&self, tournament: TournamentId) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin scoring transaction")?;

        let Some(t) = query_tournament(&tx, tournament)? else {
            bail!("tournament {tournament} does not exist");
        };
        if !t.is_locked() {
            bail!("tournament {} ({}) must be locked before scoring", t.name, tournament);
        }

        let scored = tx
            .execute(
                "INSERT INTO team_results (team_id, tournament_id, points)
                 SELECT s.team_id, s.tournament_id, COALESCE(SUM(r.raw_points), 0)
                 FROM roster_snapshots s
                 LEFT JOIN player_results r
                   ON r.tournament_id = s.tournament_id AND r.player_id = s.player_id
                 WHERE s.tournament_id = ?1
                 GROUP BY s.team_id, s.tournament_id
                 ON CONFLICT(team_id, tournament_id) DO UPDATE SET
                    points = excluded.points",
                params![tournament.0],
            )
            .context("failed to compute team results")?;
        tx.commit().context("failed to commit team results")?;

        info!("Scored {} teams for {}", scored, t.name);
        Ok(scored)
    }

    // ------------------------------------------------------------------
    // Leaderboard read side
    // ------------------------------------------------------------------

    pub fn teams(&self) -> Result<Vec<Team>> {
        let conn = self.conn();
        query_teams(&conn)
    }

    /// Team results joined with their tournament's name and start date.
    pub fn team_results(&self) -> Result<Vec<TeamResult>> {
        let conn = self.conn();
        query_team_results(&conn)
    }

    /// Everything the leaderboard needs, read under one lock.
    pub fn load_snapshot(&self) -> Result<LeagueSnapshot> {
        let conn = self.conn();
        let teams = query_teams(&conn)?;

        let mut picks: HashMap<TeamId, Vec<PlayerId>> = HashMap::new();
        {
            let mut stmt = conn
                .prepare("SELECT team_id, player_id FROM roster_picks ORDER BY team_id, rowid")
                .context("failed to prepare roster_picks query")?;
            let rows = stmt
                .query_map([], |row| Ok((TeamId(row.get(0)?), PlayerId(row.get(1)?))))
                .context("failed to query roster picks")?;
            for row in rows {
                let (team, player) = row.context("failed to read roster pick row")?;
                picks.entry(team).or_default().push(player);
            }
        }

        let results = query_team_results(&conn)?;
        let directory = PlayerDirectory::new(query_players(&conn)?);
        debug!(
            "Loaded snapshot: {} teams, {} team results, {} players",
            teams.len(),
            results.len(),
            directory.len()
        );

        Ok(LeagueSnapshot {
            teams,
            picks,
            results,
            directory,
        })
    }
}

impl RosterStore for Database {
    fn save_team(&self, owner: &str, team_name: &str, player_ids: &[PlayerId]) -> Result<TeamId> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin save transaction")?;

        let team_id: i64 = tx
            .query_row(
                "INSERT INTO teams (owner_id, name) VALUES (?1, ?2)
                 ON CONFLICT(owner_id) DO UPDATE SET name = excluded.name
                 RETURNING id",
                params![owner, team_name],
                |row| row.get(0),
            )
            .context("failed to upsert team")?;

        tx.execute("DELETE FROM roster_picks WHERE team_id = ?1", params![team_id])
            .context("failed to clear roster picks")?;
        {
            let mut stmt = tx
                .prepare("INSERT INTO roster_picks (team_id, player_id) VALUES (?1, ?2)")
                .context("failed to prepare roster pick insert")?;
            for id in player_ids {
                stmt.execute(params![team_id, id.0])
                    .with_context(|| format!("failed to save pick {id}"))?;
            }
        }

        tx.commit().context("failed to commit team save")?;
        Ok(TeamId(team_id))
    }

    fn load_team(&self, owner: &str) -> Result<Option<SavedTeam>> {
        let conn = self.conn();
        let team = conn
            .query_row(
                "SELECT id, owner_id, name FROM teams WHERE owner_id = ?1",
                params![owner],
                map_team,
            )
            .optional()
            .context("failed to query team")?;
        let Some(team) = team else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare("SELECT player_id FROM roster_picks WHERE team_id = ?1 ORDER BY rowid")
            .context("failed to prepare load_team query")?;
        let player_ids = stmt
            .query_map(params![team.id.0], |row| Ok(PlayerId(row.get(0)?)))
            .context("failed to query roster picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map roster pick rows")?;

        Ok(Some(SavedTeam { team, player_ids }))
    }
}

impl ResultStore for Database {
    fn upsert_results(&self, rows: &[ResultRow], chunk_size: usize) -> Result<UpsertSummary> {
        let mut summary = UpsertSummary::default();
        let mut conn = self.conn();

        for (n, chunk) in rows.chunks(chunk_size.max(1)).enumerate() {
            let tx = conn
                .transaction()
                .context("failed to begin results transaction")?;
            {
                let mut stmt = tx
                    .prepare(
                        "INSERT INTO player_results (tournament_id, player_id, raw_points)
                         VALUES (?1, ?2, ?3)
                         ON CONFLICT(tournament_id, player_id) DO UPDATE SET
                            raw_points = excluded.raw_points",
                    )
                    .context("failed to prepare result upsert")?;
                for row in chunk {
                    // A failed statement leaves the transaction usable.
                    match stmt.execute(params![row.tournament_id.0, row.player_id.0, row.raw_points]) {
                        Ok(_) => summary.written += 1,
                        Err(e) => summary.failed.push(RowFailure {
                            row: *row,
                            reason: e.to_string(),
                        }),
                    }
                }
            }
            tx.commit().context("failed to commit results chunk")?;
            debug!("Results chunk {} done ({} rows)", n + 1, chunk.len());
        }

        info!(
            "Upserted {} result rows, {} failed",
            summary.written,
            summary.failed.len()
        );
        Ok(summary)
    }

    fn results_for(&self, tournament: TournamentId) -> Result<Vec<ResultRow>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT tournament_id, player_id, raw_points FROM player_results
                 WHERE tournament_id = ?1 ORDER BY player_id",
            )
            .context("failed to prepare results_for query")?;
        let rows = stmt
            .query_map(params![tournament.0], |row| {
                Ok(ResultRow {
                    tournament_id: TournamentId(row.get(0)?),
                    player_id: PlayerId(row.get(1)?),
                    raw_points: row.get(2)?,
                })
            })
            .context("failed to query player results")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map player result rows")?;
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

fn query_players(conn: &Connection) -> Result<Vec<Player>> {
    let mut stmt = conn
        .prepare("SELECT id, ranking, name FROM players ORDER BY ranking, id")
        .context("failed to prepare load_players query")?;
    let players = stmt
        .query_map([], |row| {
            Ok(Player {
                id: PlayerId(row.get(0)?),
                rank: row.get(1)?,
                name: row.get(2)?,
            })
        })
        .context("failed to query players")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map player rows")?;
    Ok(players)
}

fn query_teams(conn: &Connection) -> Result<Vec<Team>> {
    let mut stmt = conn
        .prepare("SELECT id, owner_id, name FROM teams ORDER BY id")
        .context("failed to prepare teams query")?;
    let teams = stmt
        .query_map([], map_team)
        .context("failed to query teams")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map team rows")?;
    Ok(teams)
}

fn query_team_results(conn: &Connection) -> Result<Vec<TeamResult>> {
    let mut stmt = conn
        .prepare(
            "SELECT tr.team_id, tr.tournament_id, t.name, tr.points, t.start_date
             FROM team_results tr
             JOIN tournaments t ON t.id = tr.tournament_id
             ORDER BY tr.team_id, tr.tournament_id",
        )
        .context("failed to prepare team_results query")?;
    let results = stmt
        .query_map([], |row| {
            Ok(TeamResult {
                team_id: TeamId(row.get(0)?),
                tournament_id: TournamentId(row.get(1)?),
                tournament_name: row.get(2)?,
                points: row.get(3)?,
                event_date: parse_date(4, row.get(4)?)?,
            })
        })
        .context("failed to query team results")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map team result rows")?;
    Ok(results)
}

fn query_tournament(conn: &Connection, id: TournamentId) -> Result<Option<Tournament>> {
    conn.query_row(
        "SELECT id, name, tournament_type, start_date, end_date, lock_at
         FROM tournaments WHERE id = ?1",
        params![id.0],
        map_tournament,
    )
    .optional()
    .context("failed to query tournament")
}

fn map_team(row: &rusqlite::Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: TeamId(row.get(0)?),
        owner: row.get(1)?,
        name: row.get(2)?,
    })
}

fn map_tournament(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tournament> {
    let kind: String = row.get(2)?;
    let kind = kind
        .parse::<TournamentKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    let lock_at = row
        .get::<_, Option<String>>(5)?
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))
        })
        .transpose()?;

    Ok(Tournament {
        id: TournamentId(row.get(0)?),
        name: row.get(1)?,
        kind,
        start_date: parse_date(3, row.get(3)?)?,
        end_date: parse_date(4, row.get(4)?)?,
        lock_at,
    })
}

fn parse_date(idx: usize, text: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    text.map(|s| {
        NaiveDate::parse_from_str(&s, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::import;
    use crate::standings::leaderboard::{build_rows, rank, SortKey};

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> Database {
        let db = Database::open(":memory:").expect("in-memory database should open");
        let players = (1..=100)
            .map(|rank| Player {
                id: PlayerId(rank as i64),
                name: format!("Player {rank}"),
                rank,
            })
            .collect::<Vec<_>>();
        db.upsert_players(&players).unwrap();
        db
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn row(t: TournamentId, p: i64, pts: i64) -> ResultRow {
        ResultRow {
            tournament_id: t,
            player_id: PlayerId(p),
            raw_points: pts,
        }
    }

    fn rome(db: &Database) -> TournamentId {
        db.create_tournament(
            "Rome",
            TournamentKind::Atp1000,
            Some(date("2025-05-07")),
            Some(date("2025-05-18")),
        )
        .unwrap()
    }

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for t in [
            "players",
            "tournaments",
            "teams",
            "roster_picks",
            "roster_snapshots",
            "player_results",
            "team_results",
        ] {
            assert!(tables.contains(&t.to_string()), "missing table {t}");
        }
    }

    #[test]
    fn players_round_trip_and_reseed() {
        let db = test_db();
        let dir = db.load_players().unwrap();
        assert_eq!(dir.len(), 100);
        assert_eq!(dir.by_rank(7).unwrap().name, "Player 7");

        // Rankings move between seeds; ids stay put.
        db.upsert_players(&[
            Player { id: PlayerId(1), name: "Player 1".into(), rank: 2 },
            Player { id: PlayerId(2), name: "Player 2".into(), rank: 1 },
        ])
        .unwrap();
        let dir = db.load_players().unwrap();
        assert_eq!(dir.by_rank(1).unwrap().id, PlayerId(2));
        assert_eq!(dir.get(PlayerId(1)).unwrap().rank, 2);
    }

    #[test]
    fn save_team_replaces_picks() {
        let db = test_db();
        let id = db
            .save_team("owner-1", "Baseliners", &[PlayerId(1), PlayerId(55)])
            .unwrap();
        let again = db.save_team("owner-1", "Net Rushers", &[PlayerId(12)]).unwrap();
        assert_eq!(id, again);

        let saved = db.load_team("owner-1").unwrap().unwrap();
        assert_eq!(saved.team.name, "Net Rushers");
        assert_eq!(saved.player_ids, vec![PlayerId(12)]);
        assert_eq!(db.teams().unwrap().len(), 1);
    }

    #[test]
    fn load_team_keeps_pick_order() {
        let db = test_db();
        let ids = [PlayerId(70), PlayerId(3), PlayerId(40)];
        db.save_team("o", "T", &ids).unwrap();
        assert_eq!(db.load_team("o").unwrap().unwrap().player_ids, ids.to_vec());
    }

    #[test]
    fn load_team_unknown_owner_is_none() {
        let db = test_db();
        assert!(db.load_team("nobody").unwrap().is_none());
    }

    #[test]
    fn save_team_with_unknown_player_rolls_back() {
        let db = test_db();
        db.save_team("o", "Before", &[PlayerId(1)]).unwrap();
        assert!(db.save_team("o", "After", &[PlayerId(2), PlayerId(9999)]).is_err());

        let saved = db.load_team("o").unwrap().unwrap();
        assert_eq!(saved.team.name, "Before");
        assert_eq!(saved.player_ids, vec![PlayerId(1)]);
    }

    #[test]
    fn same_line_imported_twice_stores_one_row() {
        let db = test_db();
        let t = rome(&db);
        let dir = db.load_players().unwrap();

        let report = import::parse("1,2000", t, &dir);
        db.upsert_results(&report.rows(), 250).unwrap();
        db.upsert_results(&report.rows(), 250).unwrap();

        assert_eq!(db.results_for(t).unwrap(), vec![row(t, 1, 2000)]);
    }

    #[test]
    fn later_import_overwrites_points() {
        let db = test_db();
        let t = rome(&db);
        db.upsert_results(&[row(t, 1, 100)], 250).unwrap();
        db.upsert_results(&[row(t, 1, 250)], 250).unwrap();
        assert_eq!(db.results_for(t).unwrap(), vec![row(t, 1, 250)]);
    }

    #[test]
    fn failed_rows_do_not_affect_neighbours() {
        for chunk_size in [1, 2, 250] {
            let fresh = test_db();
            let t = rome(&fresh);
            let rows = vec![
                row(t, 1, 10),
                row(t, 9999, 20), // not a stored player
                row(t, 3, 30),
                row(TournamentId(77), 4, 40), // not a stored tournament
                row(t, 5, 50),
            ];
            let summary = fresh.upsert_results(&rows, chunk_size).unwrap();
            assert_eq!(summary.written, 3, "chunk size {chunk_size}");
            assert_eq!(summary.failed.len(), 2);
            assert_eq!(summary.failed[0].row.player_id, PlayerId(9999));
            assert_eq!(
                fresh.results_for(t).unwrap(),
                vec![row(t, 1, 10), row(t, 3, 30), row(t, 5, 50)]
            );
        }
    }

    #[test]
    fn tournaments_listed_by_start_date() {
        let db = test_db();
        db.create_tournament("Undated", TournamentKind::Atp250, None, None)
            .unwrap();
        db.create_tournament(
            "Paris",
            TournamentKind::Major,
            Some(date("2025-05-25")),
            Some(date("2025-06-08")),
        )
        .unwrap();
        rome(&db);

        let list = db.list_tournaments().unwrap();
        let names: Vec<&str> = list.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Rome", "Paris", "Undated"]);
        assert_eq!(list[1].kind, TournamentKind::Major);
        assert_eq!(list[1].end_date, Some(date("2025-06-08")));
        assert!(!list[0].is_locked());
    }

    #[test]
    fn end_before_start_rejected() {
        let db = test_db();
        assert!(db
            .create_tournament(
                "Backwards",
                TournamentKind::Atp500,
                Some(date("2025-02-10")),
                Some(date("2025-02-01")),
            )
            .is_err());
    }

    #[test]
    fn lock_then_score() {
        let db = test_db();
        let t = rome(&db);
        let a = db.save_team("a", "Aces", &[PlayerId(1), PlayerId(60)]).unwrap();
        let b = db.save_team("b", "Volley", &[PlayerId(2)]).unwrap();

        assert_eq!(db.snapshot_rosters(t).unwrap(), 3);
        assert!(db.tournament(t).unwrap().unwrap().is_locked());

        db.upsert_results(&[row(t, 1, 1000), row(t, 60, 45)], 250).unwrap();
        assert_eq!(db.compute_team_results(t).unwrap(), 2);

        let results = db.team_results().unwrap();
        let points = |team: TeamId| {
            results
                .iter()
                .find(|r| r.team_id == team)
                .and_then(|r| r.points)
        };
        assert_eq!(points(a), Some(1045));
        // Team b's player has no result row yet.
        assert_eq!(points(b), Some(0));
        assert_eq!(results[0].tournament_name, "Rome");
        assert_eq!(results[0].event_date, Some(date("2025-05-07")));
    }

    #[test]
    fn rescoring_picks_up_late_results() {
        let db = test_db();
        let t = rome(&db);
        let a = db.save_team("a", "Aces", &[PlayerId(1)]).unwrap();
        db.snapshot_rosters(t).unwrap();
        db.compute_team_results(t).unwrap();

        db.upsert_results(&[row(t, 1, 500)], 250).unwrap();
        db.compute_team_results(t).unwrap();

        let results = db.team_results().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].team_id, a);
        assert_eq!(results[0].points, Some(500));
    }

    #[test]
    fn roster_change_after_lock_does_not_change_points() {
        let db = test_db();
        let t = rome(&db);
        db.save_team("a", "Aces", &[PlayerId(1)]).unwrap();
        db.snapshot_rosters(t).unwrap();

        // Swap in a player who scored more, after the lock.
        db.save_team("a", "Aces", &[PlayerId(2)]).unwrap();
        db.upsert_results(&[row(t, 1, 100), row(t, 2, 900)], 250).unwrap();
        db.compute_team_results(t).unwrap();

        let snapshot = db.load_snapshot().unwrap();
        let rows = build_rows(&snapshot);
        assert_eq!(rows[0].total_points, 100);
        assert_eq!(rows[0].current_selection_summary, "#2 Player 2");
    }

    #[test]
    fn lock_twice_rejected() {
        let db = test_db();
        let t = rome(&db);
        db.snapshot_rosters(t).unwrap();
        assert!(db.snapshot_rosters(t).is_err());
    }

    #[test]
    fn score_before_lock_rejected() {
        let db = test_db();
        let t = rome(&db);
        assert!(db.compute_team_results(t).is_err());
        assert!(db.compute_team_results(TournamentId(999)).is_err());
    }

    #[test]
    fn load_snapshot_feeds_leaderboard() {
        let db = test_db();
        let t = rome(&db);
        db.save_team("a", "Zeta", &[PlayerId(1)]).unwrap();
        db.save_team("b", "Alpha", &[PlayerId(2)]).unwrap();
        db.save_team("c", "", &[]).unwrap();
        db.snapshot_rosters(t).unwrap();
        db.upsert_results(&[row(t, 1, 300), row(t, 2, 300)], 250).unwrap();
        db.compute_team_results(t).unwrap();

        let snapshot = db.load_snapshot().unwrap();
        assert_eq!(snapshot.teams.len(), 3);
        assert_eq!(snapshot.picks.get(&TeamId(1)), Some(&vec![PlayerId(1)]));

        let ranked = rank(build_rows(&snapshot), SortKey::PointsDesc);
        let names: Vec<&str> = ranked.iter().map(|r| r.team_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta", "(unnamed)"]);
        assert_eq!(ranked[0].spent, 160_000_000);
        assert_eq!(ranked[2].events_count, 0);
    }

    #[test]
    fn foreign_keys_enforced() {
        let db = test_db();
        let conn = db.conn();
        let result = conn.execute(
            "INSERT INTO roster_picks (team_id, player_id) VALUES (42, 1)",
            [],
        );
        assert!(result.is_err());
    }
}
