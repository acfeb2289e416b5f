// SQLite persistence layer for injury and injured-reserve state.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row, Transaction};

use crate::injury::types::{BodyPart, GameContext, Injury, InjurySeverity, InjuryType};

/// Column list shared by every injury SELECT so row mapping stays in one place.
const INJURY_COLS: &str = "id, player_id, player_name, team_id, position, injury_type, body_part, \
     severity, weeks_out, actual_weeks_out, week_occurred, season, occurred_during, game_id, \
     play_description, is_active, on_ir, ir_placement_date, ir_return_date";

/// SQLite-backed persistence for injuries, IR slot tracking, and key-value
/// simulation state. Every table is scoped by `dynasty_id` for multi-tenant
/// isolation.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
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
            CREATE TABLE IF NOT EXISTS injuries (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                dynasty_id       TEXT NOT NULL,
                player_id        TEXT NOT NULL,
                player_name      TEXT NOT NULL,
                team_id          TEXT NOT NULL,
                position         TEXT NOT NULL,
                injury_type      TEXT NOT NULL,
                body_part        TEXT NOT NULL,
                severity         TEXT NOT NULL,
                weeks_out        INTEGER NOT NULL,
                actual_weeks_out INTEGER,
                week_occurred    INTEGER NOT NULL,
                season           INTEGER NOT NULL,
                occurred_during  TEXT NOT NULL,
                game_id          TEXT,
                play_description TEXT,
                is_active        INTEGER NOT NULL DEFAULT 1,
                on_ir            INTEGER NOT NULL DEFAULT 0,
                ir_placement_date TEXT,
                ir_return_date   TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_injuries_player
                ON injuries(dynasty_id, player_id);
            CREATE INDEX IF NOT EXISTS idx_injuries_team
                ON injuries(dynasty_id, team_id, season);

            CREATE TABLE IF NOT EXISTS ir_slots (
                dynasty_id        TEXT NOT NULL,
                team_id           TEXT NOT NULL,
                season            INTEGER NOT NULL,
                return_slots_used INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (dynasty_id, team_id, season)
            );

            CREATE TABLE IF NOT EXISTS sim_state (
                dynasty_id TEXT NOT NULL,
                key        TEXT NOT NULL,
                value      TEXT NOT NULL,
                PRIMARY KEY (dynasty_id, key)
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
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Run `f` inside a single exclusive transaction. The connection mutex is
    /// held for the whole scope, so no other writer can interleave. Any error
    /// from `f` rolls back every mutation made inside the scope.
    pub fn with_exclusive<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        let out = f(&tx)?;
        tx.commit().context("failed to commit transaction")?;
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Injuries
    // ------------------------------------------------------------------

    /// Persist a new injury row and return its id.
    pub fn insert_injury(&self, dynasty_id: &str, injury: &Injury) -> Result<i64> {
        let conn = self.conn();
        let id: i64 = conn
            .query_row(
                "INSERT INTO injuries
                    (dynasty_id, player_id, player_name, team_id, position, injury_type,
                     body_part, severity, weeks_out, actual_weeks_out, week_occurred, season,
                     occurred_during, game_id, play_description, is_active, on_ir,
                     ir_placement_date, ir_return_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                         ?16, ?17, ?18, ?19)
                 RETURNING id",
                params![
                    dynasty_id,
                    injury.player_id,
                    injury.player_name,
                    injury.team_id,
                    injury.position,
                    injury.injury_type.display_str(),
                    injury.body_part.display_str(),
                    injury.severity.display_str(),
                    injury.weeks_out,
                    injury.actual_weeks_out,
                    injury.week_occurred,
                    injury.season,
                    injury.occurred_during.display_str(),
                    injury.game_id,
                    injury.play_description,
                    injury.is_active,
                    injury.on_ir,
                    injury.ir_placement_date,
                    injury.ir_return_date,
                ],
                |row| row.get(0),
            )
            .context("failed to insert injury")?;
        Ok(id)
    }

    /// Load an injury by id. Returns `None` if no such row exists in this
    /// dynasty.
    pub fn get_injury(&self, dynasty_id: &str, injury_id: i64) -> Result<Option<Injury>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {INJURY_COLS} FROM injuries WHERE dynasty_id = ?1 AND id = ?2"
            ))
            .context("failed to prepare get_injury query")?;
        let mut rows = stmt
            .query_map(params![dynasty_id, injury_id], injury_from_row)
            .context("failed to query injury")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("failed to map injury row")?)),
            None => Ok(None),
        }
    }

    /// Whether the player currently has any active injury.
    pub fn has_active_injury(&self, dynasty_id: &str, player_id: &str) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM injuries
                     WHERE dynasty_id = ?1 AND player_id = ?2 AND is_active = 1)",
                params![dynasty_id, player_id],
                |row| row.get(0),
            )
            .context("failed to check active injury")?;
        Ok(exists)
    }

    /// The player's current active IR injury, if any.
    pub fn ir_injury_for_player(
        &self,
        dynasty_id: &str,
        player_id: &str,
    ) -> Result<Option<Injury>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {INJURY_COLS} FROM injuries
                 WHERE dynasty_id = ?1 AND player_id = ?2 AND is_active = 1 AND on_ir = 1"
            ))
            .context("failed to prepare ir_injury_for_player query")?;
        let mut rows = stmt
            .query_map(params![dynasty_id, player_id], injury_from_row)
            .context("failed to query IR injury")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("failed to map injury row")?)),
            None => Ok(None),
        }
    }

    /// All active injuries for a team in a season, newest first.
    pub fn active_injuries_for_team(
        &self,
        dynasty_id: &str,
        team_id: &str,
        season: u32,
    ) -> Result<Vec<Injury>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {INJURY_COLS} FROM injuries
                 WHERE dynasty_id = ?1 AND team_id = ?2 AND season = ?3 AND is_active = 1
                 ORDER BY week_occurred DESC, id DESC"
            ))
            .context("failed to prepare active_injuries_for_team query")?;
        let injuries = stmt
            .query_map(params![dynasty_id, team_id, season], injury_from_row)
            .context("failed to query team injuries")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map team injury rows")?;
        Ok(injuries)
    }

    /// Active, non-IR injuries whose estimated return week has arrived.
    /// Read-only: callers clear each injury explicitly.
    pub fn recoverable_injuries(
        &self,
        dynasty_id: &str,
        season: u32,
        current_week: u32,
    ) -> Result<Vec<Injury>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {INJURY_COLS} FROM injuries
                 WHERE dynasty_id = ?1 AND season = ?2 AND is_active = 1 AND on_ir = 0
                   AND week_occurred + weeks_out <= ?3
                 ORDER BY id"
            ))
            .context("failed to prepare recoverable_injuries query")?;
        let injuries = stmt
            .query_map(params![dynasty_id, season, current_week], injury_from_row)
            .context("failed to query recoverable injuries")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map recoverable injury rows")?;
        Ok(injuries)
    }

    /// Deactivate an injury and record the actual weeks missed. Returns
    /// `false` if the row does not exist in this dynasty.
    pub fn clear_injury(
        &self,
        dynasty_id: &str,
        injury_id: i64,
        actual_weeks_out: u32,
    ) -> Result<bool> {
        let conn = self.conn();
        let updated = conn
            .execute(
                "UPDATE injuries SET is_active = 0, actual_weeks_out = ?3
                 WHERE dynasty_id = ?1 AND id = ?2",
                params![dynasty_id, injury_id, actual_weeks_out],
            )
            .context("failed to clear injury")?;
        Ok(updated > 0)
    }

    /// Flag an injury as placed on injured reserve.
    pub fn mark_on_ir(
        &self,
        dynasty_id: &str,
        injury_id: i64,
        placement_date: &str,
    ) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE injuries SET on_ir = 1, ir_placement_date = ?3
             WHERE dynasty_id = ?1 AND id = ?2",
            params![dynasty_id, injury_id, placement_date],
        )
        .context("failed to mark injury on IR")?;
        Ok(())
    }

    /// IR-return slots already consumed by a team this season. Zero when no
    /// tracking row exists yet.
    pub fn ir_slots_used(&self, dynasty_id: &str, team_id: &str, season: u32) -> Result<u32> {
        let conn = self.conn();
        let used: Option<u32> = conn
            .query_row(
                "SELECT return_slots_used FROM ir_slots
                 WHERE dynasty_id = ?1 AND team_id = ?2 AND season = ?3",
                params![dynasty_id, team_id, season],
                |row| row.get(0),
            )
            .optional_row()
            .context("failed to read IR slot usage")?;
        Ok(used.unwrap_or(0))
    }

    // ------------------------------------------------------------------
    // Key-value simulation state
    // ------------------------------------------------------------------

    /// Persist an arbitrary JSON value under `key` for this dynasty. Uses
    /// INSERT OR REPLACE so repeated saves overwrite the previous value.
    pub fn save_state(
        &self,
        dynasty_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<()> {
        let conn = self.conn();
        let json_str = serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO sim_state (dynasty_id, key, value) VALUES (?1, ?2, ?3)",
            params![dynasty_id, key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`. Returns `None` if the key
    /// does not exist for this dynasty.
    pub fn load_state(&self, dynasty_id: &str, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT value FROM sim_state WHERE dynasty_id = ?1 AND key = ?2",
                params![dynasty_id, key],
                |row| row.get(0),
            )
            .optional_row()
            .context("failed to query sim state")?;
        match json_str {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).context("failed to deserialize state value")?,
            )),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction-scoped operations used by the atomic batch IR activation
// ---------------------------------------------------------------------------

/// The player's active IR injury inside an open transaction.
pub fn tx_ir_injury_for_player(
    tx: &Transaction<'_>,
    dynasty_id: &str,
    player_id: &str,
) -> Result<Option<Injury>> {
    let mut stmt = tx
        .prepare(&format!(
            "SELECT {INJURY_COLS} FROM injuries
             WHERE dynasty_id = ?1 AND player_id = ?2 AND is_active = 1 AND on_ir = 1"
        ))
        .context("failed to prepare tx IR injury query")?;
    let mut rows = stmt
        .query_map(params![dynasty_id, player_id], injury_from_row)
        .context("failed to query IR injury in transaction")?;
    match rows.next() {
        Some(row) => Ok(Some(row.context("failed to map injury row")?)),
        None => Ok(None),
    }
}

/// Record an IR activation: stamp the return date and deactivate the injury.
pub fn tx_mark_activated(
    tx: &Transaction<'_>,
    dynasty_id: &str,
    injury_id: i64,
    return_date: &str,
) -> Result<()> {
    tx.execute(
        "UPDATE injuries SET is_active = 0, ir_return_date = ?3, actual_weeks_out = weeks_out
         WHERE dynasty_id = ?1 AND id = ?2",
        params![dynasty_id, injury_id, return_date],
    )
    .context("failed to mark IR activation")?;
    Ok(())
}

/// Consume one IR-return slot for a team, creating the tracking row on first
/// use.
pub fn tx_increment_ir_slots(
    tx: &Transaction<'_>,
    dynasty_id: &str,
    team_id: &str,
    season: u32,
) -> Result<()> {
    tx.execute(
        "INSERT INTO ir_slots (dynasty_id, team_id, season, return_slots_used)
         VALUES (?1, ?2, ?3, 1)
         ON CONFLICT(dynasty_id, team_id, season)
            DO UPDATE SET return_slots_used = return_slots_used + 1",
        params![dynasty_id, team_id, season],
    )
    .context("failed to increment IR slot usage")?;
    Ok(())
}

/// IR-return slots used, inside an open transaction.
pub fn tx_ir_slots_used(
    tx: &Transaction<'_>,
    dynasty_id: &str,
    team_id: &str,
    season: u32,
) -> Result<u32> {
    let used: Option<u32> = tx
        .query_row(
            "SELECT return_slots_used FROM ir_slots
             WHERE dynasty_id = ?1 AND team_id = ?2 AND season = ?3",
            params![dynasty_id, team_id, season],
            |row| row.get(0),
        )
        .optional_row()
        .context("failed to read IR slot usage in transaction")?;
    Ok(used.unwrap_or(0))
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Map an injury SELECT row (in `INJURY_COLS` order) to the entity.
fn injury_from_row(row: &Row<'_>) -> rusqlite::Result<Injury> {
    let type_str: String = row.get(5)?;
    let part_str: String = row.get(6)?;
    let sev_str: String = row.get(7)?;
    let ctx_str: String = row.get(12)?;

    let injury_type = InjuryType::from_str_type(&type_str)
        .ok_or_else(|| bad_column(5, &type_str))?;
    let body_part = BodyPart::from_str_part(&part_str).ok_or_else(|| bad_column(6, &part_str))?;
    let severity =
        InjurySeverity::from_str_sev(&sev_str).ok_or_else(|| bad_column(7, &sev_str))?;
    let occurred_during =
        GameContext::from_str_ctx(&ctx_str).ok_or_else(|| bad_column(12, &ctx_str))?;

    Ok(Injury {
        id: Some(row.get(0)?),
        player_id: row.get(1)?,
        player_name: row.get(2)?,
        team_id: row.get(3)?,
        position: row.get(4)?,
        injury_type,
        body_part,
        severity,
        weeks_out: row.get(8)?,
        actual_weeks_out: row.get(9)?,
        week_occurred: row.get(10)?,
        season: row.get(11)?,
        occurred_during,
        game_id: row.get(13)?,
        play_description: row.get(14)?,
        is_active: row.get(15)?,
        on_ir: row.get(16)?,
        ir_placement_date: row.get(17)?,
        ir_return_date: row.get(18)?,
    })
}

fn bad_column(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("unrecognized stored value: {value}").into(),
    )
}

/// Adapter turning rusqlite's `QueryReturnedNoRows` into `None` so single-row
/// lookups read cleanly.
trait OptionalRow<T> {
    fn optional_row(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalRow<T> for rusqlite::Result<T> {
    fn optional_row(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Test dynasty used across all db tests.
    const DYN: &str = "dynasty_test";

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    /// Helper: build a sample active injury.
    fn sample_injury(player_id: &str, weeks_out: u32) -> Injury {
        Injury {
            id: None,
            player_id: player_id.to_string(),
            player_name: format!("Player {player_id}"),
            team_id: "team_1".to_string(),
            position: "RB".to_string(),
            injury_type: InjuryType::HamstringStrain,
            body_part: BodyPart::Hamstring,
            severity: InjurySeverity::Moderate,
            weeks_out,
            actual_weeks_out: None,
            week_occurred: 3,
            season: 2025,
            occurred_during: GameContext::Game,
            game_id: Some("game_17".to_string()),
            play_description: None,
            is_active: true,
            on_ir: false,
            ir_placement_date: None,
            ir_return_date: None,
        }
    }

    // ------------------------------------------------------------------
    // Schema / open
    // ------------------------------------------------------------------

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

        assert!(tables.contains(&"injuries".to_string()));
        assert!(tables.contains(&"ir_slots".to_string()));
        assert!(tables.contains(&"sim_state".to_string()));
    }

    // ------------------------------------------------------------------
    // Injury round trips
    // ------------------------------------------------------------------

    #[test]
    fn insert_and_get_injury_round_trip() {
        let db = test_db();
        let id = db.insert_injury(DYN, &sample_injury("p1", 3)).unwrap();
        assert!(id > 0);

        let loaded = db.get_injury(DYN, id).unwrap().expect("row should exist");
        assert_eq!(loaded.id, Some(id));
        assert_eq!(loaded.player_id, "p1");
        assert_eq!(loaded.position, "RB");
        assert_eq!(loaded.injury_type, InjuryType::HamstringStrain);
        assert_eq!(loaded.body_part, BodyPart::Hamstring);
        assert_eq!(loaded.severity, InjurySeverity::Moderate);
        assert_eq!(loaded.weeks_out, 3);
        assert_eq!(loaded.week_occurred, 3);
        assert_eq!(loaded.occurred_during, GameContext::Game);
        assert_eq!(loaded.game_id.as_deref(), Some("game_17"));
        assert!(loaded.is_active);
        assert!(!loaded.on_ir);
    }

    #[test]
    fn get_injury_missing_returns_none() {
        let db = test_db();
        assert!(db.get_injury(DYN, 999).unwrap().is_none());
    }

    #[test]
    fn injuries_are_dynasty_scoped() {
        let db = test_db();
        let id = db.insert_injury("dyn_a", &sample_injury("p1", 3)).unwrap();

        assert!(db.get_injury("dyn_b", id).unwrap().is_none());
        assert!(db.has_active_injury("dyn_a", "p1").unwrap());
        assert!(!db.has_active_injury("dyn_b", "p1").unwrap());
    }

    #[test]
    fn has_active_injury_tracks_clear() {
        let db = test_db();
        let id = db.insert_injury(DYN, &sample_injury("p1", 3)).unwrap();
        assert!(db.has_active_injury(DYN, "p1").unwrap());

        assert!(db.clear_injury(DYN, id, 2).unwrap());
        assert!(!db.has_active_injury(DYN, "p1").unwrap());

        let cleared = db.get_injury(DYN, id).unwrap().unwrap();
        assert!(!cleared.is_active);
        assert_eq!(cleared.actual_weeks_out, Some(2));
    }

    #[test]
    fn clear_injury_missing_row_returns_false() {
        let db = test_db();
        assert!(!db.clear_injury(DYN, 42, 1).unwrap());
    }

    // ------------------------------------------------------------------
    // Recovery sweep
    // ------------------------------------------------------------------

    #[test]
    fn recoverable_injuries_respects_return_week() {
        let db = test_db();
        // Occurred week 3, out 3 weeks -> recoverable at week 6.
        db.insert_injury(DYN, &sample_injury("p1", 3)).unwrap();

        assert!(db.recoverable_injuries(DYN, 2025, 5).unwrap().is_empty());
        let due = db.recoverable_injuries(DYN, 2025, 6).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].player_id, "p1");
    }

    #[test]
    fn recoverable_injuries_excludes_ir_rows() {
        let db = test_db();
        let id = db.insert_injury(DYN, &sample_injury("p1", 4)).unwrap();
        db.mark_on_ir(DYN, id, "2025-10-01").unwrap();

        assert!(db.recoverable_injuries(DYN, 2025, 18).unwrap().is_empty());
    }

    #[test]
    fn recoverable_injuries_does_not_mutate() {
        let db = test_db();
        db.insert_injury(DYN, &sample_injury("p1", 3)).unwrap();
        let _ = db.recoverable_injuries(DYN, 2025, 10).unwrap();
        // Still active until explicitly cleared.
        assert!(db.has_active_injury(DYN, "p1").unwrap());
    }

    // ------------------------------------------------------------------
    // IR flags
    // ------------------------------------------------------------------

    #[test]
    fn mark_on_ir_sets_flag_and_date() {
        let db = test_db();
        let id = db.insert_injury(DYN, &sample_injury("p1", 5)).unwrap();
        db.mark_on_ir(DYN, id, "2025-10-01").unwrap();

        let injury = db.get_injury(DYN, id).unwrap().unwrap();
        assert!(injury.on_ir);
        assert_eq!(injury.ir_placement_date.as_deref(), Some("2025-10-01"));

        let found = db.ir_injury_for_player(DYN, "p1").unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn ir_injury_for_player_ignores_non_ir_injuries() {
        let db = test_db();
        db.insert_injury(DYN, &sample_injury("p1", 5)).unwrap();
        assert!(db.ir_injury_for_player(DYN, "p1").unwrap().is_none());
    }

    #[test]
    fn active_injuries_for_team_filters_by_team_and_season() {
        let db = test_db();
        db.insert_injury(DYN, &sample_injury("p1", 3)).unwrap();
        let mut other_team = sample_injury("p2", 3);
        other_team.team_id = "team_2".to_string();
        db.insert_injury(DYN, &other_team).unwrap();
        let mut other_season = sample_injury("p3", 3);
        other_season.season = 2024;
        db.insert_injury(DYN, &other_season).unwrap();

        let injuries = db.active_injuries_for_team(DYN, "team_1", 2025).unwrap();
        assert_eq!(injuries.len(), 1);
        assert_eq!(injuries[0].player_id, "p1");
    }

    // ------------------------------------------------------------------
    // IR slot tracking
    // ------------------------------------------------------------------

    #[test]
    fn ir_slots_default_to_zero() {
        let db = test_db();
        assert_eq!(db.ir_slots_used(DYN, "team_1", 2025).unwrap(), 0);
    }

    #[test]
    fn ir_slots_increment_inside_transaction() {
        let db = test_db();
        db.with_exclusive(|tx| {
            tx_increment_ir_slots(tx, DYN, "team_1", 2025)?;
            tx_increment_ir_slots(tx, DYN, "team_1", 2025)?;
            assert_eq!(tx_ir_slots_used(tx, DYN, "team_1", 2025)?, 2);
            Ok(())
        })
        .unwrap();
        assert_eq!(db.ir_slots_used(DYN, "team_1", 2025).unwrap(), 2);
        // Scoped per team and season.
        assert_eq!(db.ir_slots_used(DYN, "team_2", 2025).unwrap(), 0);
        assert_eq!(db.ir_slots_used(DYN, "team_1", 2026).unwrap(), 0);
    }

    #[test]
    fn with_exclusive_rolls_back_on_error() {
        let db = test_db();
        let id = db.insert_injury(DYN, &sample_injury("p1", 5)).unwrap();
        db.mark_on_ir(DYN, id, "2025-10-01").unwrap();

        let result: Result<()> = db.with_exclusive(|tx| {
            tx_mark_activated(tx, DYN, id, "2025-11-01")?;
            tx_increment_ir_slots(tx, DYN, "team_1", 2025)?;
            anyhow::bail!("boom")
        });
        assert!(result.is_err());

        // Both mutations rolled back.
        let injury = db.get_injury(DYN, id).unwrap().unwrap();
        assert!(injury.is_active);
        assert!(injury.ir_return_date.is_none());
        assert_eq!(db.ir_slots_used(DYN, "team_1", 2025).unwrap(), 0);
    }

    #[test]
    fn tx_mark_activated_stamps_return_date() {
        let db = test_db();
        let id = db.insert_injury(DYN, &sample_injury("p1", 5)).unwrap();
        db.mark_on_ir(DYN, id, "2025-10-01").unwrap();

        db.with_exclusive(|tx| tx_mark_activated(tx, DYN, id, "2025-11-05"))
            .unwrap();

        let injury = db.get_injury(DYN, id).unwrap().unwrap();
        assert!(!injury.is_active);
        assert_eq!(injury.ir_return_date.as_deref(), Some("2025-11-05"));
        assert_eq!(injury.actual_weeks_out, Some(5));
    }

    // ------------------------------------------------------------------
    // Key-value simulation state
    // ------------------------------------------------------------------

    #[test]
    fn save_and_load_state_round_trip() {
        let db = test_db();
        let value = json!({"week": 7, "phase": "regular"});

        db.save_state(DYN, "season_clock", &value).unwrap();
        assert_eq!(db.load_state(DYN, "season_clock").unwrap(), Some(value));
    }

    #[test]
    fn load_state_returns_none_for_missing_key() {
        let db = test_db();
        assert!(db.load_state(DYN, "nonexistent").unwrap().is_none());
    }

    #[test]
    fn state_is_dynasty_scoped() {
        let db = test_db();
        db.save_state("dyn_a", "week", &json!(4)).unwrap();
        assert!(db.load_state("dyn_b", "week").unwrap().is_none());
    }
}
