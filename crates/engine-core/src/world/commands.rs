use super::*;

impl GameWorld {
    /// Apply one user command synchronously. Rejections leave the state
    /// document untouched (the state hash does not move); the only trace
    /// is a `CommandRejected` entry in the event log.
    pub fn apply_command(&mut self, command: &Command) -> CommandResult {
        let outcome = match &command.payload {
            CommandPayload::StartMission {
                mission_id,
                squad_id,
            } => self.start_mission(mission_id, squad_id),
            CommandPayload::CompleteMission { mission_id } => self.complete_mission(mission_id),
            CommandPayload::UpgradeSquad { squad_id } => self.upgrade_squad(squad_id),
            CommandPayload::EquipArtifact { artifact_id } => self.equip_artifact(artifact_id),
            CommandPayload::UnlockZone { zone_id } => self.unlock_zone(zone_id),
            CommandPayload::PerformPrestige => self.perform_prestige(),
        };

        match outcome {
            Ok(()) => {
                self.state_hash =
                    mix_state_hash(self.state_hash, self.next_event_sequence, 0xC0DE);
                CommandResult::applied(command)
            }
            Err(reason) => {
                self.push_event(
                    EventType::CommandRejected,
                    Some(json!({
                        "command_id": command.command_id,
                        "command_type": command.command_type,
                        "reason": reason,
                    })),
                );
                CommandResult::rejected(command, reason)
            }
        }
    }
}
