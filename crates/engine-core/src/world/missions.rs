use super::*;

use contracts::{Artifact, ArtifactEffect, EffectKind};

impl GameWorld {
    /// Dispatch a squad on a mission: costs 1 energy, marks the mission
    /// active at the current clock, and reserves the squad. No two active
    /// missions can share a squad because dispatch flips `is_available`.
    pub(super) fn start_mission(
        &mut self,
        mission_id: &str,
        squad_id: &str,
    ) -> Result<(), RejectReason> {
        if self.state.player.energy < 1.0 {
            return Err(RejectReason::InsufficientEnergy);
        }

        let mission = self
            .state
            .missions
            .iter()
            .find(|mission| mission.id == mission_id)
            .ok_or(RejectReason::EntityNotFound)?;
        if mission.is_active() {
            return Err(RejectReason::MissionNotAvailable);
        }

        let squad = self
            .state
            .squads
            .iter()
            .find(|squad| squad.id == squad_id)
            .ok_or(RejectReason::EntityNotFound)?;
        if !squad.is_available {
            return Err(RejectReason::SquadUnavailable);
        }

        let started_at_secs = self.state.clock_secs;
        self.state.player.energy -= 1.0;
        if let Some(mission) = self
            .state
            .missions
            .iter_mut()
            .find(|mission| mission.id == mission_id)
        {
            mission.state = MissionState::Active {
                squad_id: squad_id.to_string(),
                started_at_secs,
            };
        }
        if let Some(squad) = self
            .state
            .squads
            .iter_mut()
            .find(|squad| squad.id == squad_id)
        {
            squad.is_available = false;
        }

        self.push_event(
            EventType::MissionStarted,
            Some(json!({
                "mission_id": mission_id,
                "squad_id": squad_id,
                "started_at_secs": started_at_secs,
            })),
        );
        Ok(())
    }

    /// Roll out a mission's rewards and fold it back to `Available`.
    /// Idempotent against double invocation: a mission that is no longer
    /// active is rejected without touching anything.
    pub(super) fn complete_mission(&mut self, mission_id: &str) -> Result<(), RejectReason> {
        let mission = self
            .state
            .missions
            .iter()
            .find(|mission| mission.id == mission_id)
            .ok_or(RejectReason::EntityNotFound)?;
        let squad_id = match &mission.state {
            MissionState::Active { squad_id, .. } => squad_id.clone(),
            MissionState::Available => return Err(RejectReason::MissionNotAvailable),
        };
        let rewards = mission.rewards.clone();

        let prestige_mult = self.state.player.prestige_multiplier;
        let artifact_mult = economy::equipped_credit_multiplier(&self.state.artifacts);
        let credits = economy::scaled_credits(rewards.credits, prestige_mult, artifact_mult);
        let reputation = economy::scaled_reputation(rewards.reputation, prestige_mult);

        // Drop roll first, rarity roll second; exactly one draw each, only
        // when the drop happens for the rarity.
        let dropped = if self.rng.next_unit() < rewards.artifact_chance {
            let rarity = economy::rarity_for_roll(self.rng.next_unit());
            Some(self.mint_artifact(rarity))
        } else {
            None
        };

        self.state.player.credits = self.state.player.credits.saturating_add(credits);
        self.state.player.reputation = self.state.player.reputation.saturating_add(reputation);
        self.state.player.fragments = self.state.player.fragments.saturating_add(rewards.fragments);

        if let Some(mission) = self
            .state
            .missions
            .iter_mut()
            .find(|mission| mission.id == mission_id)
        {
            mission.state = MissionState::Available;
        }
        if let Some(squad) = self
            .state
            .squads
            .iter_mut()
            .find(|squad| squad.id == squad_id)
        {
            squad.is_available = true;
        }

        self.push_event(
            EventType::MissionCompleted,
            Some(json!({
                "mission_id": mission_id,
                "squad_id": squad_id,
                "credits_awarded": credits,
                "reputation_awarded": reputation,
                "fragments_awarded": rewards.fragments,
            })),
        );

        if let Some(artifact) = dropped {
            self.push_event(
                EventType::ArtifactDropped,
                Some(json!({
                    "mission_id": mission_id,
                    "artifact_id": artifact.id,
                    "rarity": artifact.rarity,
                })),
            );
            self.state.artifacts.push(artifact);
        }

        Ok(())
    }

    fn mint_artifact(&mut self, rarity: contracts::Rarity) -> Artifact {
        let serial = self.state.next_artifact_serial;
        self.state.next_artifact_serial = serial.saturating_add(1);
        Artifact {
            id: format!("artifact-{serial:05}"),
            name: format!("{} Artifact", rarity.display_name()),
            rarity,
            description: "A mysterious artifact recovered during an expedition".to_string(),
            effects: vec![ArtifactEffect {
                kind: EffectKind::CreditBonus,
                percent: economy::dropped_effect_percent(rarity),
            }],
            equipped: false,
        }
    }
}
