use contracts::{Command, CommandPayload, CommandType, EngineConfig, Rarity};
use engine_core::economy;
use engine_core::{GameWorld, StarterCatalog};
use proptest::prelude::*;

fn seeded_world(seed: u64) -> GameWorld {
    let mut config = EngineConfig::default();
    config.seed = seed;
    GameWorld::new(config, Box::new(StarterCatalog))
}

fn start(mission_id: &str, squad_id: &str) -> Command {
    Command::new(
        format!("cmd_{mission_id}_{squad_id}"),
        "profile_local_001",
        CommandType::StartMission,
        CommandPayload::StartMission {
            mission_id: mission_id.to_string(),
            squad_id: squad_id.to_string(),
        },
    )
}

#[test]
fn squad_bonus_is_continuous_across_tier_breaks() {
    // The piecewise bonus must not jump backwards at the tier boundaries.
    let mut previous = 0;
    for level in 1..=60 {
        let bonus = economy::squad_efficiency_bonus(level);
        assert!(bonus >= previous, "level {level} regressed");
        previous = bonus;
    }
    assert_eq!(economy::squad_efficiency_bonus(10), 20);
    assert_eq!(economy::squad_efficiency_bonus(25), 65);
}

#[test]
fn rarity_roll_covers_the_whole_unit_interval() {
    assert_eq!(economy::rarity_for_roll(0.0), Rarity::Mythic);
    assert_eq!(economy::rarity_for_roll(0.004_999), Rarity::Mythic);
    assert_eq!(economy::rarity_for_roll(0.005), Rarity::Legendary);
    assert_eq!(economy::rarity_for_roll(0.049_999), Rarity::Legendary);
    assert_eq!(economy::rarity_for_roll(0.05), Rarity::Epic);
    assert_eq!(economy::rarity_for_roll(0.2), Rarity::Rare);
    assert_eq!(economy::rarity_for_roll(0.5), Rarity::Common);
    assert_eq!(economy::rarity_for_roll(0.999_999), Rarity::Common);
}

proptest! {
    #[test]
    fn upgrade_cost_is_strictly_increasing(level in 1_u32..200) {
        prop_assert!(economy::upgrade_cost(level + 1) > economy::upgrade_cost(level));
    }

    #[test]
    fn prestige_multiplier_grows_from_one(count in 0_u32..100) {
        let current = economy::prestige_multiplier(count);
        prop_assert!(current >= 1.0);
        prop_assert!(economy::prestige_multiplier(count + 1) > current);
    }

    #[test]
    fn same_seed_same_history(seed in 1_u64..10_000) {
        let mut world_a = seeded_world(seed);
        let mut world_b = seeded_world(seed);

        for (mission, squad) in [("mission-1", "squad-1"), ("mission-2", "squad-2")] {
            world_a.apply_command(&start(mission, squad));
            world_b.apply_command(&start(mission, squad));
        }
        world_a.advance(1_000.0);
        world_b.advance(1_000.0);

        prop_assert_eq!(world_a.snapshot(), world_b.snapshot());
        prop_assert_eq!(world_a.state_hash(), world_b.state_hash());
        prop_assert_eq!(world_a.events(), world_b.events());
    }

    #[test]
    fn energy_never_goes_negative_under_start_spam(attempts in 1_usize..40, seed in 1_u64..1_000) {
        let mut world = seeded_world(seed);
        let missions = ["mission-1", "mission-2", "mission-3", "mission-4", "mission-5", "mission-6"];
        let squads = ["squad-1", "squad-2", "squad-3"];

        for attempt in 0..attempts {
            let mission = missions[attempt % missions.len()];
            let squad = squads[attempt % squads.len()];
            world.apply_command(&start(mission, squad));
            world.advance(30.0);
            prop_assert!(world.state().player.energy >= 0.0);
            prop_assert!(world.state().player.energy <= f64::from(world.state().player.max_energy));
        }
    }

    #[test]
    fn active_missions_never_share_a_squad(steps in 1_usize..60, seed in 1_u64..1_000) {
        let mut world = seeded_world(seed);
        let missions = ["mission-1", "mission-2", "mission-3", "mission-4", "mission-5", "mission-6"];
        let squads = ["squad-1", "squad-2", "squad-3"];

        for step in 0..steps {
            world.apply_command(&start(missions[step % missions.len()], squads[(step * 7) % squads.len()]));
            world.advance(45.0);

            let mut assigned = world
                .state()
                .active_missions()
                .filter_map(|mission| mission.assigned_squad())
                .collect::<Vec<_>>();
            assigned.sort_unstable();
            let unique = {
                let mut copy = assigned.clone();
                copy.dedup();
                copy
            };
            prop_assert_eq!(&assigned, &unique);

            // A reserved squad is exactly one referenced by an active mission.
            for squad in &world.state().squads {
                let referenced = assigned.contains(&squad.id.as_str());
                prop_assert_eq!(squad.is_available, !referenced);
            }
        }
    }

    #[test]
    fn slot_caps_hold_under_arbitrary_equip_toggles(toggles in prop::collection::vec(0_usize..6, 1..80)) {
        let mut world = seeded_world(99);
        // Run a batch of completions so the drop table has a chance to add
        // equippables beyond the two starter artifacts.
        for _ in 0..12 {
            world.apply_command(&start("mission-1", "squad-1"));
            world.advance(120.0);
            world.advance(3_600.0);
        }

        let artifact_ids = world
            .state()
            .artifacts
            .iter()
            .map(|artifact| artifact.id.clone())
            .collect::<Vec<_>>();

        for toggle in toggles {
            let id = &artifact_ids[toggle % artifact_ids.len()];
            world.apply_command(&Command::new(
                format!("cmd_toggle_{id}"),
                "profile_local_001",
                CommandType::EquipArtifact,
                CommandPayload::EquipArtifact { artifact_id: id.clone() },
            ));

            for rarity in [Rarity::Epic, Rarity::Legendary, Rarity::Mythic] {
                if let Some(cap) = rarity.slot_cap() {
                    prop_assert!(world.state().equipped_count(rarity) <= cap);
                }
            }
        }
    }

    #[test]
    fn advance_in_slices_matches_one_big_advance(slices in 1_u32..24, seed in 1_u64..1_000) {
        let total = 7_200.0;
        let mut whole = seeded_world(seed);
        let mut sliced = seeded_world(seed);
        whole.apply_command(&start("mission-1", "squad-1"));
        sliced.apply_command(&start("mission-1", "squad-1"));

        whole.advance(total);
        for _ in 0..slices {
            sliced.advance(total / f64::from(slices));
        }

        let a = whole.state();
        let b = sliced.state();
        prop_assert_eq!(a.player.credits, b.player.credits);
        prop_assert_eq!(a.player.reputation, b.player.reputation);
        prop_assert_eq!(a.artifacts.len(), b.artifacts.len());
        prop_assert!((a.player.energy - b.player.energy).abs() < 1e-6);
    }
}
