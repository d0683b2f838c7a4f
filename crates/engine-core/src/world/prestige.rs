use super::*;

impl GameWorld {
    /// Reset-with-carryover: trades all current progress for a permanent
    /// quadratic multiplier. Missions, squads, and zones regenerate from
    /// the catalog; legendary and mythic artifacts survive and the starter
    /// artifact set is appended.
    pub(super) fn perform_prestige(&mut self) -> Result<(), RejectReason> {
        if self.state.player.reputation < economy::PRESTIGE_THRESHOLD {
            return Err(RejectReason::PrestigeThresholdNotMet);
        }

        let new_count = self.state.player.prestige_count + 1;
        let kept = self
            .state
            .artifacts
            .iter()
            .filter(|artifact| artifact.rarity >= contracts::Rarity::Legendary)
            .count();

        self.regenerate_from_catalog(new_count);

        self.push_event(
            EventType::PrestigePerformed,
            Some(json!({
                "prestige_count": new_count,
                "prestige_multiplier": self.state.player.prestige_multiplier,
                "artifacts_carried_over": kept,
            })),
        );
        Ok(())
    }
}
