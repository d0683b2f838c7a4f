use super::*;

impl GameWorld {
    /// Advance the simulated clock by `dt_secs`: complete every active
    /// mission whose timer has elapsed, then regenerate energy
    /// proportionally to the elapsed interval. Completions run in expiry
    /// order and each one is stamped at the mission's own expiry time,
    /// not the post-advance clock; the stable sort keeps simultaneous
    /// expirations in collection order. Correctness is independent of
    /// tick granularity: N small advances and one large advance land on
    /// the same state.
    pub fn advance(&mut self, dt_secs: f64) -> StepMetrics {
        if !dt_secs.is_finite() || dt_secs <= 0.0 {
            self.last_step_metrics = StepMetrics::default();
            return self.last_step_metrics;
        }

        self.state.clock_secs += dt_secs;
        let now = self.state.clock_secs;

        let mut due = self
            .state
            .missions
            .iter()
            .filter_map(|mission| match &mission.state {
                MissionState::Active {
                    started_at_secs, ..
                } => {
                    let expires_at = started_at_secs + mission.duration_secs as f64;
                    (expires_at <= now).then(|| (mission.id.clone(), expires_at))
                }
                MissionState::Available => None,
            })
            .collect::<Vec<_>>();
        due.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut completed = 0_u64;
        for (mission_id, expired_at) in due {
            self.state.clock_secs = expired_at;
            if self.complete_mission(&mission_id).is_ok() {
                completed += 1;
                self.state_hash =
                    mix_state_hash(self.state_hash, self.next_event_sequence, 0x71C4);
            }
        }
        self.state.clock_secs = now;

        let before = self.state.player.energy;
        let max_energy = f64::from(self.state.player.max_energy);
        self.state.player.energy =
            (before + dt_secs * economy::ENERGY_REGEN_PER_SEC).min(max_energy);
        let regenerated = self.state.player.energy - before;

        self.last_step_metrics = StepMetrics {
            advanced_secs: dt_secs,
            completed_missions: completed,
            energy_regenerated: regenerated,
        };
        self.last_step_metrics
    }

    pub fn last_step_metrics(&self) -> StepMetrics {
        self.last_step_metrics
    }

    pub fn clock_secs(&self) -> f64 {
        self.state.clock_secs
    }
}
