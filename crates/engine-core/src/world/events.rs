use super::*;

impl GameWorld {
    pub fn events(&self) -> &[Event] {
        &self.event_log
    }

    /// Continue a resumed session's id sequence past what earlier
    /// sessions already journaled, so event ids stay unique per profile.
    pub fn resume_event_sequence(&mut self, next_sequence: u64) {
        self.next_event_sequence = self.next_event_sequence.max(next_sequence);
    }

    /// Drop retained events with a sequence below `min_sequence`. The
    /// caller must have persisted them first; the id sequence keeps
    /// counting from where it was.
    pub fn prune_events_before(&mut self, min_sequence: u64) {
        self.event_log.retain(|event| event.sequence >= min_sequence);
    }

    pub(super) fn push_event(
        &mut self,
        event_type: EventType,
        details: Option<serde_json::Value>,
    ) -> String {
        let sequence = self.next_event_sequence;
        self.next_event_sequence = self.next_event_sequence.saturating_add(1);
        let event_id = format!("evt_{sequence:06}");
        self.event_log.push(Event {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            profile_id: self.state.profile_id.clone(),
            at_secs: self.state.clock_secs,
            event_id: event_id.clone(),
            sequence,
            event_type,
            details,
        });
        event_id
    }
}
