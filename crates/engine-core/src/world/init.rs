use super::*;

impl GameWorld {
    /// Fresh profile: state generated from the catalog, clock at zero.
    pub fn new(config: EngineConfig, catalog: Box<dyn Catalog>) -> Self {
        let state = fresh_state(&config, catalog.as_ref());
        Self::with_state(config, catalog, state)
    }

    /// Resume from a persisted snapshot. The snapshot is adopted as-is;
    /// the caller is responsible for having fallen back to a fresh state
    /// if the stored document did not parse.
    pub fn from_state(config: EngineConfig, catalog: Box<dyn Catalog>, state: GameState) -> Self {
        Self::with_state(config, catalog, state)
    }

    fn with_state(config: EngineConfig, catalog: Box<dyn Catalog>, state: GameState) -> Self {
        let rng = DropRng::new(config.seed);
        Self {
            config,
            state,
            catalog,
            rng,
            event_log: Vec::new(),
            next_event_sequence: 0,
            state_hash: 0,
            last_step_metrics: StepMetrics::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(super) fn regenerate_from_catalog(&mut self, prestige_count: u32) {
        // Legendary and mythic survive the reset, equipped state intact.
        let kept_artifacts = self
            .state
            .artifacts
            .iter()
            .filter(|artifact| artifact.rarity >= contracts::Rarity::Legendary)
            .cloned()
            .collect::<Vec<_>>();

        let mut artifacts = kept_artifacts;
        artifacts.extend(self.catalog.artifacts());

        self.state = GameState {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            profile_id: self.state.profile_id.clone(),
            clock_secs: self.state.clock_secs,
            player: economy::baseline_player(prestige_count),
            missions: self.catalog.missions(),
            squads: self.catalog.squads(),
            artifacts,
            zones: self.catalog.zones(),
            next_artifact_serial: self.state.next_artifact_serial,
        };
    }
}

pub(super) fn fresh_state(config: &EngineConfig, catalog: &dyn Catalog) -> GameState {
    GameState {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        profile_id: config.profile_id.clone(),
        clock_secs: 0.0,
        player: economy::baseline_player(0),
        missions: catalog.missions(),
        squads: catalog.squads(),
        artifacts: catalog.artifacts(),
        zones: catalog.zones(),
        next_artifact_serial: 0,
    }
}
