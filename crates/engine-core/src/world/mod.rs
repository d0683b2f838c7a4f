mod commands;
mod events;
mod init;
mod missions;
mod prestige;
mod progression;
mod snapshot;
mod step;

use contracts::{
    Command, CommandPayload, CommandResult, EngineConfig, EngineStatus, Event, EventType,
    GameState, MissionState, RejectReason, SCHEMA_VERSION_V1,
};
use serde_json::json;

use crate::catalog::Catalog;
use crate::economy;
use crate::rng::DropRng;

/// What one `advance` call did; read back by the shell for save cadence
/// and by tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepMetrics {
    pub advanced_secs: f64,
    pub completed_missions: u64,
    pub energy_regenerated: f64,
}

/// The single logical owner of the game state. All mutation funnels
/// through [`GameWorld::apply_command`] and [`GameWorld::advance`]; both
/// take `&mut self`, so the shell's mutex is the serialization point.
#[derive(Debug)]
pub struct GameWorld {
    config: EngineConfig,
    state: GameState,
    catalog: Box<dyn Catalog>,
    rng: DropRng,
    event_log: Vec<Event>,
    next_event_sequence: u64,
    state_hash: u64,
    last_step_metrics: StepMetrics,
}

fn mix_state_hash(state_hash: u64, sequence: u64, salt: u64) -> u64 {
    let mut hash = state_hash ^ sequence.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    hash ^= salt.wrapping_mul(0x517C_C1B7_2722_0A95);
    hash.rotate_left(17)
}

#[cfg(test)]
mod tests;
