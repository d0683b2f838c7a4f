use std::fmt;
use std::path::Path;

use contracts::{Command, CommandResult, EngineConfig, Event, GameState};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedCommandEntry {
    pub command: Command,
    pub result: CommandResult,
    pub at_secs: f64,
}

#[derive(Debug)]
pub enum PersistenceError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
    NotAttached,
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Serde(err) => write!(f, "serde error: {err}"),
            Self::NotAttached => write!(f, "sqlite store is not attached"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// One save slot per profile plus append-only command and event journals.
/// The save slot is overwritten on every flush; journals only grow.
#[derive(Debug)]
pub struct SqliteSaveStore {
    conn: Connection,
}

impl SqliteSaveStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    pub fn persist_delta(
        &mut self,
        config: &EngineConfig,
        state: &GameState,
        state_hash: u64,
        commands: &[PersistedCommandEntry],
        events: &[Event],
    ) -> Result<(), PersistenceError> {
        let tx = self.conn.transaction()?;

        upsert_profile(&tx, config, state)?;

        let state_json = serde_json::to_string(state)?;
        tx.execute(
            "INSERT INTO saves (
                profile_id,
                schema_version,
                clock_secs,
                state_hash,
                state_json,
                updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(profile_id) DO UPDATE SET
                schema_version = excluded.schema_version,
                clock_secs = excluded.clock_secs,
                state_hash = excluded.state_hash,
                state_json = excluded.state_json,
                updated_at = excluded.updated_at",
            params![
                state.profile_id.as_str(),
                state.schema_version.as_str(),
                state.clock_secs,
                format!("{state_hash:016x}"),
                state_json,
                clock_stamp(state.clock_secs),
            ],
        )?;

        for entry in commands {
            let command_json = serde_json::to_string(&entry.command)?;
            let result_json = serde_json::to_string(&entry.result)?;
            tx.execute(
                "INSERT OR IGNORE INTO commands (
                    profile_id,
                    command_id,
                    at_secs,
                    applied,
                    command_json,
                    result_json,
                    created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.command.profile_id.as_str(),
                    entry.command.command_id.as_str(),
                    entry.at_secs,
                    if entry.result.applied { 1_i64 } else { 0_i64 },
                    command_json,
                    result_json,
                    clock_stamp(entry.at_secs),
                ],
            )?;
        }

        for event in events {
            let payload_json = serde_json::to_string(event)?;
            tx.execute(
                "INSERT OR IGNORE INTO events (
                    profile_id,
                    event_id,
                    sequence,
                    at_secs,
                    event_type,
                    payload_json
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    event.profile_id.as_str(),
                    event.event_id.as_str(),
                    i64::try_from(event.sequence).unwrap_or(i64::MAX),
                    event.at_secs,
                    format!("{:?}", event.event_type),
                    payload_json,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// The persisted state document for a profile, if a save slot exists.
    pub fn load_state(&self, profile_id: &str) -> Result<Option<GameState>, PersistenceError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT state_json FROM saves WHERE profile_id = ?1",
                params![profile_id],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(raw) => Ok(Some(serde_json::from_str::<GameState>(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn load_command_journal(
        &self,
        profile_id: &str,
    ) -> Result<Vec<PersistedCommandEntry>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            "SELECT command_json, result_json, at_secs
             FROM commands
             WHERE profile_id = ?1
             ORDER BY at_secs ASC, command_id ASC",
        )?;

        let rows = stmt.query_map(params![profile_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (command_json, result_json, at_secs) = row?;
            entries.push(PersistedCommandEntry {
                command: serde_json::from_str::<Command>(&command_json)?,
                result: serde_json::from_str::<CommandResult>(&result_json)?,
                at_secs,
            });
        }

        Ok(entries)
    }

    pub fn load_events_since(
        &self,
        profile_id: &str,
        from_sequence: u64,
    ) -> Result<Vec<Event>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            "SELECT payload_json FROM events
             WHERE profile_id = ?1 AND sequence >= ?2
             ORDER BY sequence ASC",
        )?;

        let rows = stmt.query_map(
            params![profile_id, i64::try_from(from_sequence).unwrap_or(i64::MAX)],
            |row| row.get::<_, String>(0),
        )?;

        let mut events = Vec::new();
        for row in rows {
            events.push(serde_json::from_str::<Event>(&row?)?);
        }

        Ok(events)
    }

    /// The sequence the next journaled event for this profile must use.
    /// Zero when the journal is empty.
    pub fn load_next_event_sequence(&self, profile_id: &str) -> Result<u64, PersistenceError> {
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(sequence) FROM events WHERE profile_id = ?1",
            params![profile_id],
            |row| row.get(0),
        )?;
        Ok(max.map_or(0, |value| value.unsigned_abs() + 1))
    }

    fn configure(&mut self) -> Result<(), PersistenceError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS profiles (
                profile_id TEXT PRIMARY KEY,
                schema_version TEXT NOT NULL,
                config_json TEXT NOT NULL,
                seed TEXT NOT NULL,
                tick_period_ms INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS saves (
                profile_id TEXT PRIMARY KEY,
                schema_version TEXT NOT NULL,
                clock_secs REAL NOT NULL,
                state_hash TEXT NOT NULL,
                state_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS commands (
                profile_id TEXT NOT NULL,
                command_id TEXT NOT NULL,
                at_secs REAL NOT NULL,
                applied INTEGER NOT NULL,
                command_json TEXT NOT NULL,
                result_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (profile_id, command_id)
            );

            CREATE TABLE IF NOT EXISTS events (
                profile_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                sequence INTEGER NOT NULL,
                at_secs REAL NOT NULL,
                event_type TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                PRIMARY KEY (profile_id, event_id),
                UNIQUE (profile_id, sequence)
            );

            CREATE INDEX IF NOT EXISTS idx_events_profile_sequence ON events(profile_id, sequence);
            CREATE INDEX IF NOT EXISTS idx_events_profile_type ON events(profile_id, event_type);
            CREATE INDEX IF NOT EXISTS idx_commands_profile_at ON commands(profile_id, at_secs);
            ",
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO schema_migrations(version, name, applied_at)
             VALUES(1, 'initial_v1', 'clock-000000000.0')",
            [],
        )?;

        Ok(())
    }
}

fn upsert_profile(
    tx: &rusqlite::Transaction<'_>,
    config: &EngineConfig,
    state: &GameState,
) -> Result<(), PersistenceError> {
    let config_json = serde_json::to_string(config)?;

    tx.execute(
        "INSERT INTO profiles (
            profile_id,
            schema_version,
            config_json,
            seed,
            tick_period_ms,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(profile_id) DO UPDATE SET
            schema_version = excluded.schema_version,
            config_json = excluded.config_json,
            seed = excluded.seed,
            tick_period_ms = excluded.tick_period_ms,
            updated_at = excluded.updated_at",
        params![
            config.profile_id.as_str(),
            config.schema_version.as_str(),
            config_json,
            config.seed.to_string(),
            i64::try_from(config.tick_period_ms).unwrap_or(i64::MAX),
            "clock-000000000.0",
            clock_stamp(state.clock_secs),
        ],
    )?;

    Ok(())
}

fn clock_stamp(clock_secs: f64) -> String {
    format!("clock-{clock_secs:011.1}")
}
