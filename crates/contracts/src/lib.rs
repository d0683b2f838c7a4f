//! v1 cross-boundary contracts for the expedition engine, API, and persistence.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SCHEMA_VERSION_V1: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub schema_version: String,
    pub profile_id: String,
    #[serde(with = "serde_u64_string")]
    pub seed: u64,
    /// Scheduler period hint for the serving shell; correctness does not
    /// depend on it (regeneration and completion scale with elapsed time).
    pub tick_period_ms: u64,
    pub notes: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            profile_id: "profile_local_001".to_string(),
            seed: 1337,
            tick_period_ms: 1_000,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    Exploration,
    Combat,
    Mining,
    Diplomacy,
}

impl MissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exploration => "exploration",
            Self::Combat => "combat",
            Self::Mining => "mining",
            Self::Diplomacy => "diplomacy",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SquadKind {
    Explorers,
    Commandos,
    Miners,
    Diplomats,
    Versatile,
}

/// Ordered from most common to rarest; the derived `Ord` follows tier order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    /// Equip slot cap for the rarity; `None` means unbounded.
    pub fn slot_cap(self) -> Option<usize> {
        match self {
            Self::Mythic => Some(3),
            Self::Legendary => Some(6),
            Self::Epic => Some(12),
            Self::Rare | Self::Common => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Rare => "Rare",
            Self::Epic => "Epic",
            Self::Legendary => "Legendary",
            Self::Mythic => "Mythic",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Danger {
    Safe,
    Risky,
    Dangerous,
    Deadly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    CreditBonus,
    MissionSpeed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactEffect {
    pub kind: EffectKind,
    pub percent: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    pub description: String,
    pub effects: Vec<ArtifactEffect>,
    pub equipped: bool,
}

impl Artifact {
    /// Summed percent across effects of the given kind.
    pub fn effect_percent(&self, kind: EffectKind) -> i64 {
        self.effects
            .iter()
            .filter(|effect| effect.kind == kind)
            .map(|effect| effect.percent)
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissionRewards {
    pub credits: u64,
    pub reputation: u64,
    pub fragments: u64,
    /// Probability of an artifact drop on completion, in [0, 1].
    pub artifact_chance: f64,
}

/// Tagged mission state: an active mission always knows its squad and start
/// time, so `status == active ⇔ assigned squad and start time set` holds by
/// construction. The transient `completed` status folds straight back to
/// `Available` inside completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MissionState {
    Available,
    Active {
        squad_id: String,
        started_at_secs: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mission {
    pub id: String,
    pub kind: MissionKind,
    pub name: String,
    pub duration_secs: u64,
    pub zone: String,
    pub danger: Danger,
    pub tier: u8,
    pub rewards: MissionRewards,
    pub state: MissionState,
}

impl Mission {
    pub fn is_active(&self) -> bool {
        matches!(self.state, MissionState::Active { .. })
    }

    pub fn assigned_squad(&self) -> Option<&str> {
        match &self.state {
            MissionState::Active { squad_id, .. } => Some(squad_id),
            MissionState::Available => None,
        }
    }

    /// Derived progress in [0, 1] at the given engine clock; 0 when idle.
    pub fn progress(&self, now_secs: f64) -> f64 {
        match &self.state {
            MissionState::Active {
                started_at_secs, ..
            } => {
                let elapsed = (now_secs - started_at_secs).max(0.0);
                (elapsed / self.duration_secs as f64).min(1.0)
            }
            MissionState::Available => 0.0,
        }
    }

    /// Derived remaining seconds at the given engine clock; full duration
    /// when idle.
    pub fn remaining_secs(&self, now_secs: f64) -> f64 {
        match &self.state {
            MissionState::Active {
                started_at_secs, ..
            } => {
                let elapsed = (now_secs - started_at_secs).max(0.0);
                (self.duration_secs as f64 - elapsed).max(0.0)
            }
            MissionState::Available => self.duration_secs as f64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Squad {
    pub id: String,
    pub name: String,
    pub kind: SquadKind,
    pub level: u32,
    pub is_available: bool,
    /// Per-mission-kind bonus percentages; presentation/balancing data.
    #[serde(default)]
    pub bonuses: BTreeMap<MissionKind, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub danger: Danger,
    pub unlocked: bool,
    pub unlock_cost: u64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerStats {
    pub credits: u64,
    pub reputation: u64,
    pub fragments: u64,
    pub energy: f64,
    pub max_energy: u32,
    pub prestige_count: u32,
    pub prestige_multiplier: f64,
}

/// The single authoritative state document; this is exactly the shape the
/// save slot serializes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub schema_version: String,
    pub profile_id: String,
    /// Simulated engine clock, in seconds since profile creation.
    pub clock_secs: f64,
    pub player: PlayerStats,
    pub missions: Vec<Mission>,
    pub squads: Vec<Squad>,
    pub artifacts: Vec<Artifact>,
    pub zones: Vec<Zone>,
    /// Monotonic counter backing deterministic dropped-artifact ids.
    #[serde(default)]
    pub next_artifact_serial: u64,
}

impl GameState {
    /// Derived active-mission view, in mission-collection order. That order
    /// is also the deterministic completion order for simultaneously
    /// expiring missions.
    pub fn active_missions(&self) -> impl Iterator<Item = &Mission> {
        self.missions.iter().filter(|mission| mission.is_active())
    }

    pub fn active_mission_count(&self) -> usize {
        self.active_missions().count()
    }

    pub fn equipped_count(&self, rarity: Rarity) -> usize {
        self.artifacts
            .iter()
            .filter(|artifact| artifact.equipped && artifact.rarity == rarity)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineStatus {
    pub schema_version: String,
    pub profile_id: String,
    pub clock_secs: f64,
    pub energy: f64,
    pub active_mission_count: usize,
    pub prestige_count: u32,
    pub event_count: usize,
    pub state_hash: String,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "profile_id={} clock={:.1}s energy={:.2} active={} prestige={}",
            self.profile_id,
            self.clock_secs,
            self.energy,
            self.active_mission_count,
            self.prestige_count
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    StartMission,
    CompleteMission,
    UpgradeSquad,
    EquipArtifact,
    UnlockZone,
    PerformPrestige,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandPayload {
    StartMission {
        mission_id: String,
        squad_id: String,
    },
    CompleteMission {
        mission_id: String,
    },
    UpgradeSquad {
        squad_id: String,
    },
    EquipArtifact {
        artifact_id: String,
    },
    UnlockZone {
        zone_id: String,
    },
    PerformPrestige,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Command {
    pub schema_version: String,
    pub command_id: String,
    pub profile_id: String,
    pub command_type: CommandType,
    pub payload: CommandPayload,
}

impl Command {
    pub fn new(
        command_id: impl Into<String>,
        profile_id: impl Into<String>,
        command_type: CommandType,
        payload: CommandPayload,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            command_id: command_id.into(),
            profile_id: profile_id.into(),
            command_type,
            payload,
        }
    }
}

/// Why a command left state unchanged. These are domain rejections, not
/// transport failures; none of them are fatal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    InsufficientEnergy,
    MissionNotAvailable,
    SquadUnavailable,
    InsufficientCredits,
    SlotCapacityExceeded,
    InsufficientReputation,
    EntityNotFound,
    PrestigeThresholdNotMet,
    ZoneAlreadyUnlocked,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InsufficientEnergy => "insufficient energy",
            Self::MissionNotAvailable => "mission is not available",
            Self::SquadUnavailable => "squad is not available",
            Self::InsufficientCredits => "insufficient credits",
            Self::SlotCapacityExceeded => "equip slot capacity exceeded",
            Self::InsufficientReputation => "insufficient reputation",
            Self::EntityNotFound => "referenced entity does not exist",
            Self::PrestigeThresholdNotMet => "prestige threshold not met",
            Self::ZoneAlreadyUnlocked => "zone is already unlocked",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandResult {
    pub schema_version: String,
    pub command_id: String,
    pub profile_id: String,
    pub applied: bool,
    pub rejection: Option<RejectReason>,
}

impl CommandResult {
    pub fn applied(command: &Command) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            command_id: command.command_id.clone(),
            profile_id: command.profile_id.clone(),
            applied: true,
            rejection: None,
        }
    }

    pub fn rejected(command: &Command, reason: RejectReason) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            command_id: command.command_id.clone(),
            profile_id: command.profile_id.clone(),
            applied: false,
            rejection: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ProfileNotFound,
    InvalidCommand,
    InvalidQuery,
    ContractVersionUnsupported,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    MissionStarted,
    MissionCompleted,
    ArtifactDropped,
    SquadUpgraded,
    ArtifactEquipped,
    ArtifactUnequipped,
    ZoneUnlocked,
    PrestigePerformed,
    CommandRejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub schema_version: String,
    pub profile_id: String,
    pub at_secs: f64,
    pub event_id: String,
    pub sequence: u64,
    pub event_type: EventType,
    pub details: Option<Value>,
}

pub mod serde_u64_string {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u64>().map_err(D::Error::custom)
    }
}
