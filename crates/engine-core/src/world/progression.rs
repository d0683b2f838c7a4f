use super::*;

impl GameWorld {
    pub(super) fn upgrade_squad(&mut self, squad_id: &str) -> Result<(), RejectReason> {
        let level = self
            .state
            .squads
            .iter()
            .find(|squad| squad.id == squad_id)
            .map(|squad| squad.level)
            .ok_or(RejectReason::EntityNotFound)?;

        let cost = economy::upgrade_cost(level);
        if self.state.player.credits < cost {
            return Err(RejectReason::InsufficientCredits);
        }

        self.state.player.credits -= cost;
        if let Some(squad) = self
            .state
            .squads
            .iter_mut()
            .find(|squad| squad.id == squad_id)
        {
            squad.level += 1;
        }

        self.push_event(
            EventType::SquadUpgraded,
            Some(json!({
                "squad_id": squad_id,
                "new_level": level + 1,
                "cost": cost,
            })),
        );
        Ok(())
    }

    /// Toggle equipped state. Equipping is gated by the rarity's slot cap;
    /// unequipping is always allowed.
    pub(super) fn equip_artifact(&mut self, artifact_id: &str) -> Result<(), RejectReason> {
        let (rarity, was_equipped) = self
            .state
            .artifacts
            .iter()
            .find(|artifact| artifact.id == artifact_id)
            .map(|artifact| (artifact.rarity, artifact.equipped))
            .ok_or(RejectReason::EntityNotFound)?;

        if !was_equipped {
            if let Some(cap) = rarity.slot_cap() {
                if self.state.equipped_count(rarity) >= cap {
                    return Err(RejectReason::SlotCapacityExceeded);
                }
            }
        }

        if let Some(artifact) = self
            .state
            .artifacts
            .iter_mut()
            .find(|artifact| artifact.id == artifact_id)
        {
            artifact.equipped = !was_equipped;
        }

        let event_type = if was_equipped {
            EventType::ArtifactUnequipped
        } else {
            EventType::ArtifactEquipped
        };
        self.push_event(
            event_type,
            Some(json!({ "artifact_id": artifact_id, "rarity": rarity })),
        );
        Ok(())
    }

    pub(super) fn unlock_zone(&mut self, zone_id: &str) -> Result<(), RejectReason> {
        let zone = self
            .state
            .zones
            .iter()
            .find(|zone| zone.id == zone_id)
            .ok_or(RejectReason::EntityNotFound)?;
        if zone.unlocked {
            return Err(RejectReason::ZoneAlreadyUnlocked);
        }
        let cost = zone.unlock_cost;
        if self.state.player.reputation < cost {
            return Err(RejectReason::InsufficientReputation);
        }

        self.state.player.reputation -= cost;
        if let Some(zone) = self.state.zones.iter_mut().find(|zone| zone.id == zone_id) {
            zone.unlocked = true;
        }

        self.push_event(
            EventType::ZoneUnlocked,
            Some(json!({ "zone_id": zone_id, "cost": cost })),
        );
        Ok(())
    }
}
