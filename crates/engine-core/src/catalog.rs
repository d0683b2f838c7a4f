//! Content Catalog boundary: pure, deterministic generators for the initial
//! mission, squad, artifact, and zone tables. Consumed at first boot and at
//! every prestige reset.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{
    Artifact, ArtifactEffect, Danger, EffectKind, Mission, MissionKind, MissionRewards,
    MissionState, Rarity, Squad, SquadKind, Zone,
};

pub trait Catalog: fmt::Debug + Send + Sync {
    fn missions(&self) -> Vec<Mission>;
    fn squads(&self) -> Vec<Squad>;
    fn artifacts(&self) -> Vec<Artifact>;
    fn zones(&self) -> Vec<Zone>;
}

/// The shipped starter content. Exactly one zone is unlocked at cost 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct StarterCatalog;

impl Catalog for StarterCatalog {
    fn missions(&self) -> Vec<Mission> {
        vec![
            mission(
                "mission-1",
                MissionKind::Exploration,
                "Survey Nearby Nebula",
                120,
                "Starter Zone",
                Danger::Safe,
                1,
                MissionRewards {
                    credits: 500,
                    reputation: 100,
                    fragments: 5,
                    artifact_chance: 0.3,
                },
            ),
            mission(
                "mission-2",
                MissionKind::Combat,
                "Clear Pirate Outpost",
                180,
                "Starter Zone",
                Danger::Safe,
                1,
                MissionRewards {
                    credits: 800,
                    reputation: 150,
                    fragments: 8,
                    artifact_chance: 0.35,
                },
            ),
            mission(
                "mission-3",
                MissionKind::Mining,
                "Asteroid Field Extraction",
                240,
                "Starter Zone",
                Danger::Safe,
                1,
                MissionRewards {
                    credits: 1_200,
                    reputation: 80,
                    fragments: 12,
                    artifact_chance: 0.25,
                },
            ),
            mission(
                "mission-4",
                MissionKind::Diplomacy,
                "Negotiate Trade Agreement",
                300,
                "Starter Zone",
                Danger::Safe,
                1,
                MissionRewards {
                    credits: 600,
                    reputation: 250,
                    fragments: 10,
                    artifact_chance: 0.4,
                },
            ),
            mission(
                "mission-5",
                MissionKind::Exploration,
                "Deep Space Reconnaissance",
                600,
                "Outer Rim",
                Danger::Risky,
                2,
                MissionRewards {
                    credits: 2_500,
                    reputation: 500,
                    fragments: 25,
                    artifact_chance: 0.5,
                },
            ),
            mission(
                "mission-6",
                MissionKind::Combat,
                "Eliminate Alien Threat",
                900,
                "Outer Rim",
                Danger::Dangerous,
                3,
                MissionRewards {
                    credits: 4_000,
                    reputation: 800,
                    fragments: 40,
                    artifact_chance: 0.65,
                },
            ),
        ]
    }

    fn squads(&self) -> Vec<Squad> {
        vec![
            squad(
                "squad-1",
                "Alpha Explorers",
                SquadKind::Explorers,
                MissionKind::Exploration,
                25,
            ),
            squad(
                "squad-2",
                "Delta Commandos",
                SquadKind::Commandos,
                MissionKind::Combat,
                30,
            ),
            squad(
                "squad-3",
                "Gamma Miners",
                SquadKind::Miners,
                MissionKind::Mining,
                35,
            ),
        ]
    }

    fn artifacts(&self) -> Vec<Artifact> {
        vec![
            Artifact {
                id: "artifact-starter-1".to_string(),
                name: "Basic Scanner".to_string(),
                rarity: Rarity::Common,
                description: "A standard issue scanner that provides basic bonuses".to_string(),
                effects: vec![ArtifactEffect {
                    kind: EffectKind::CreditBonus,
                    percent: 5,
                }],
                equipped: false,
            },
            Artifact {
                id: "artifact-starter-2".to_string(),
                name: "Navigation Computer".to_string(),
                rarity: Rarity::Rare,
                description: "Reduces mission time and increases efficiency".to_string(),
                effects: vec![ArtifactEffect {
                    kind: EffectKind::MissionSpeed,
                    percent: 15,
                }],
                equipped: false,
            },
        ]
    }

    fn zones(&self) -> Vec<Zone> {
        vec![
            Zone {
                id: "zone-1".to_string(),
                name: "Starter Zone".to_string(),
                danger: Danger::Safe,
                unlocked: true,
                unlock_cost: 0,
                description: "A safe region of space perfect for beginners".to_string(),
            },
            Zone {
                id: "zone-2".to_string(),
                name: "Outer Rim".to_string(),
                danger: Danger::Risky,
                unlocked: false,
                unlock_cost: 5_000,
                description: "More dangerous but with greater rewards".to_string(),
            },
            Zone {
                id: "zone-3".to_string(),
                name: "Nebula of Chaos".to_string(),
                danger: Danger::Dangerous,
                unlocked: false,
                unlock_cost: 50_000,
                description: "A treacherous area filled with mysteries".to_string(),
            },
            Zone {
                id: "zone-4".to_string(),
                name: "The Void".to_string(),
                danger: Danger::Deadly,
                unlocked: false,
                unlock_cost: 500_000,
                description: "Only the most skilled expeditions survive here".to_string(),
            },
        ]
    }
}

#[allow(clippy::too_many_arguments)]
fn mission(
    id: &str,
    kind: MissionKind,
    name: &str,
    duration_secs: u64,
    zone: &str,
    danger: Danger,
    tier: u8,
    rewards: MissionRewards,
) -> Mission {
    Mission {
        id: id.to_string(),
        kind,
        name: name.to_string(),
        duration_secs,
        zone: zone.to_string(),
        danger,
        tier,
        rewards,
        state: MissionState::Available,
    }
}

fn squad(id: &str, name: &str, kind: SquadKind, bonus_kind: MissionKind, bonus: i64) -> Squad {
    let mut bonuses = BTreeMap::new();
    bonuses.insert(bonus_kind, bonus);
    Squad {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        level: 1,
        is_available: true,
        bonuses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_starter_zone_is_unlocked_at_cost_zero() {
        let zones = StarterCatalog.zones();
        let unlocked = zones.iter().filter(|zone| zone.unlocked).collect::<Vec<_>>();
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].unlock_cost, 0);
        assert_eq!(unlocked[0].name, "Starter Zone");
    }

    #[test]
    fn mission_ids_are_unique_and_all_available() {
        let missions = StarterCatalog.missions();
        let mut ids = missions.iter().map(|m| m.id.as_str()).collect::<Vec<_>>();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), missions.len());
        assert!(missions.iter().all(|m| !m.is_active()));
    }

    #[test]
    fn generators_are_deterministic() {
        assert_eq!(StarterCatalog.missions(), StarterCatalog.missions());
        assert_eq!(StarterCatalog.squads(), StarterCatalog.squads());
        assert_eq!(StarterCatalog.artifacts(), StarterCatalog.artifacts());
        assert_eq!(StarterCatalog.zones(), StarterCatalog.zones());
    }
}
