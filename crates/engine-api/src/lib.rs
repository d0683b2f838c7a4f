//! In-process API facade with command validation, SQLite save slots, and the
//! HTTP serving shell.

mod persistence;
mod server;

use std::path::Path;

use contracts::{
    ApiError, Command, CommandPayload, CommandResult, CommandType, EngineConfig, EngineStatus,
    ErrorCode, Event, GameState, SCHEMA_VERSION_V1,
};
use engine_core::{GameWorld, StarterCatalog, StepMetrics};
use persistence::SqliteSaveStore;
pub use persistence::{PersistedCommandEntry, PersistenceError};
pub use server::{serve, ServerError};

/// Idle regeneration is autosaved at this cadence; applied commands and
/// completions save immediately.
const IDLE_AUTOSAVE_SECS: f64 = 30.0;

/// In-memory journal tail kept after the persisted prefix is compacted
/// away. Older entries stay readable through the SQLite journals.
const RETAINED_LOG_ENTRIES: usize = 1024;

#[derive(Debug)]
struct PersistenceState {
    store: SqliteSaveStore,
    persisted_command_count: usize,
    persisted_event_count: usize,
}

/// Owns one engine and funnels every mutation through transport validation.
/// Domain rejections come back as applied=false results; transport failures
/// (wrong schema, wrong profile, malformed payload) never reach the engine.
#[derive(Debug)]
pub struct EngineApi {
    engine: GameWorld,
    command_log: Vec<PersistedCommandEntry>,
    persistence: Option<PersistenceState>,
    last_persistence_error: Option<String>,
    last_saved_clock_secs: f64,
}

impl EngineApi {
    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            engine: GameWorld::new(config, Box::new(StarterCatalog)),
            command_log: Vec::new(),
            persistence: None,
            last_persistence_error: None,
            last_saved_clock_secs: 0.0,
        }
    }

    /// Attach a save database and resume the profile's save slot if one is
    /// present. A missing or unparseable slot falls back to the fresh state
    /// the facade already holds; only infrastructure failures propagate.
    /// Returns whether a save slot was resumed.
    pub fn attach_sqlite_store(&mut self, path: impl AsRef<Path>) -> Result<bool, PersistenceError> {
        let store = SqliteSaveStore::open(path)?;

        let profile_id = self.engine.config().profile_id.clone();
        let resumed = match store.load_state(&profile_id) {
            Ok(Some(state)) => {
                let config = self.engine.config().clone();
                self.engine = GameWorld::from_state(config, Box::new(StarterCatalog), state);
                // New events must not reuse ids earlier sessions journaled.
                self.engine
                    .resume_event_sequence(store.load_next_event_sequence(&profile_id)?);
                self.last_saved_clock_secs = self.engine.clock_secs();
                true
            }
            Ok(None) => false,
            Err(PersistenceError::Serde(err)) => {
                self.last_persistence_error = Some(format!("save slot did not parse: {err}"));
                false
            }
            Err(err) => return Err(err),
        };

        self.persistence = Some(PersistenceState {
            store,
            persisted_command_count: 0,
            persisted_event_count: 0,
        });
        Ok(resumed)
    }

    pub fn flush_persistence_checked(&mut self) -> Result<(), PersistenceError> {
        {
            let Some(state) = self.persistence.as_mut() else {
                return Err(PersistenceError::NotAttached);
            };

            let new_commands = &self.command_log[state.persisted_command_count..];
            let new_events = &self.engine.events()[state.persisted_event_count..];

            state.store.persist_delta(
                self.engine.config(),
                self.engine.state(),
                self.engine.state_hash(),
                new_commands,
                new_events,
            )?;

            state.persisted_command_count = self.command_log.len();
            state.persisted_event_count = self.engine.events().len();
        }

        self.compact_journal_tails();
        self.last_saved_clock_secs = self.engine.clock_secs();
        self.last_persistence_error = None;
        Ok(())
    }

    /// Everything up to the persisted watermark is in SQLite, so only a
    /// bounded tail stays in memory for the query surface.
    fn compact_journal_tails(&mut self) {
        if self.command_log.len() > RETAINED_LOG_ENTRIES {
            let drop_count = self.command_log.len() - RETAINED_LOG_ENTRIES;
            self.command_log.drain(..drop_count);
        }

        let events = self.engine.events();
        if events.len() > RETAINED_LOG_ENTRIES {
            let min_sequence = events[events.len() - RETAINED_LOG_ENTRIES].sequence;
            self.engine.prune_events_before(min_sequence);
        }

        if let Some(state) = self.persistence.as_mut() {
            state.persisted_command_count = self.command_log.len();
            state.persisted_event_count = self.engine.events().len();
        }
    }

    pub fn last_persistence_error(&self) -> Option<&str> {
        self.last_persistence_error.as_deref()
    }

    pub fn profile_id(&self) -> &str {
        &self.engine.config().profile_id
    }

    pub fn config(&self) -> &EngineConfig {
        self.engine.config()
    }

    /// Validate and apply one command. `Err` is a transport failure and the
    /// engine never saw the command; `Ok` carries the engine's own verdict,
    /// applied or rejected.
    pub fn submit_command(&mut self, command: Command) -> Result<CommandResult, ApiError> {
        if let Some(error) = self.validate_command(&command) {
            return Err(error);
        }

        let result = self.engine.apply_command(&command);
        self.command_log.push(PersistedCommandEntry {
            command,
            result: result.clone(),
            at_secs: self.engine.clock_secs(),
        });

        if result.applied {
            self.flush_persistence_if_enabled();
        }
        Ok(result)
    }

    /// Advance the simulated clock. Completions save immediately; regen-only
    /// advances are coalesced into a periodic autosave so idle ticking does
    /// not thrash the save slot while a restart still keeps recent regen.
    pub fn advance(&mut self, dt_secs: f64) -> StepMetrics {
        let metrics = self.engine.advance(dt_secs);
        if metrics.advanced_secs <= 0.0 {
            return metrics;
        }

        let idle_save_due =
            self.engine.clock_secs() - self.last_saved_clock_secs >= IDLE_AUTOSAVE_SECS;
        if metrics.completed_missions > 0 || idle_save_due {
            self.flush_persistence_if_enabled();
        }
        metrics
    }

    pub fn state(&self) -> &GameState {
        self.engine.state()
    }

    pub fn snapshot(&self) -> GameState {
        self.engine.snapshot()
    }

    pub fn status(&self) -> EngineStatus {
        self.engine.status()
    }

    pub fn events(&self) -> &[Event] {
        self.engine.events()
    }

    pub fn command_log(&self) -> &[PersistedCommandEntry] {
        &self.command_log
    }

    /// Re-read the persisted command journal, including entries written by
    /// earlier sessions of this profile.
    pub fn load_persisted_commands(&self) -> Result<Vec<PersistedCommandEntry>, PersistenceError> {
        let Some(state) = self.persistence.as_ref() else {
            return Err(PersistenceError::NotAttached);
        };

        state.store.load_command_journal(self.profile_id())
    }

    /// Re-read the persisted event journal from `from_sequence` onward,
    /// including entries written by earlier sessions of this profile.
    pub fn load_persisted_events(&self, from_sequence: u64) -> Result<Vec<Event>, PersistenceError> {
        let Some(state) = self.persistence.as_ref() else {
            return Err(PersistenceError::NotAttached);
        };

        state
            .store
            .load_events_since(self.profile_id(), from_sequence)
    }

    fn flush_persistence_if_enabled(&mut self) {
        if self.persistence.is_none() {
            return;
        }

        if let Err(err) = self.flush_persistence_checked() {
            self.last_persistence_error = Some(err.to_string());
        }
    }

    fn validate_command(&self, command: &Command) -> Option<ApiError> {
        if command.schema_version != SCHEMA_VERSION_V1 {
            return Some(ApiError::new(
                ErrorCode::ContractVersionUnsupported,
                "Unsupported schema_version",
                Some(format!(
                    "got={} expected={}",
                    command.schema_version, SCHEMA_VERSION_V1
                )),
            ));
        }

        if command.profile_id != self.engine.config().profile_id {
            return Some(ApiError::new(
                ErrorCode::ProfileNotFound,
                "command.profile_id does not match the loaded profile",
                None,
            ));
        }

        if command.command_id.is_empty() {
            return Some(ApiError::new(
                ErrorCode::InvalidCommand,
                "command_id must not be empty",
                None,
            ));
        }

        if !command_type_matches_payload(command.command_type, &command.payload) {
            return Some(ApiError::new(
                ErrorCode::InvalidCommand,
                "command_type does not match payload variant",
                None,
            ));
        }

        None
    }
}

fn command_type_matches_payload(command_type: CommandType, payload: &CommandPayload) -> bool {
    matches!(
        (command_type, payload),
        (
            CommandType::StartMission,
            CommandPayload::StartMission { .. }
        ) | (
            CommandType::CompleteMission,
            CommandPayload::CompleteMission { .. }
        ) | (
            CommandType::UpgradeSquad,
            CommandPayload::UpgradeSquad { .. }
        ) | (
            CommandType::EquipArtifact,
            CommandPayload::EquipArtifact { .. }
        ) | (CommandType::UnlockZone, CommandPayload::UnlockZone { .. })
            | (CommandType::PerformPrestige, CommandPayload::PerformPrestige)
    )
}
