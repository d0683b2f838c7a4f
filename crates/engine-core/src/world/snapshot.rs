use super::*;

impl GameWorld {
    /// The latest committed state document; presentation re-reads this
    /// after every command instead of observing return values.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Owned copy of the state document, suitable for the save slot.
    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    pub fn state_hash(&self) -> u64 {
        self.state_hash
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            profile_id: self.state.profile_id.clone(),
            clock_secs: self.state.clock_secs,
            energy: self.state.player.energy,
            active_mission_count: self.state.active_mission_count(),
            prestige_count: self.state.player.prestige_count,
            event_count: self.event_log.len(),
            state_hash: format!("{:016x}", self.state_hash),
        }
    }
}
