//! Pure economy rules: cost curves, bonus curves, reward scaling, and the
//! rarity roll table. No state lives here.

use contracts::{Artifact, EffectKind, PlayerStats, Rarity};

/// Reputation required before a prestige reset is accepted.
pub const PRESTIGE_THRESHOLD: u64 = 1_000_000;

/// Passive energy regeneration: one unit per hour of elapsed time, applied
/// proportionally to whatever interval the scheduler actually ran at.
pub const ENERGY_REGEN_PER_SEC: f64 = 1.0 / 3600.0;

pub const BASELINE_CREDITS: u64 = 1_000;
pub const BASELINE_ENERGY: f64 = 5.0;
pub const BASELINE_MAX_ENERGY: u32 = 5;

/// Credits required to raise a squad from `level` to `level + 1`:
/// `floor(500 * 1.15^level)`. Strictly increasing in level.
pub fn upgrade_cost(level: u32) -> u64 {
    (500.0 * 1.15_f64.powi(level as i32)).floor() as u64
}

/// Piecewise efficiency bonus a squad level contributes, in percent.
/// Consumed by presentation and balancing; the engine never stores it.
pub fn squad_efficiency_bonus(level: u32) -> u64 {
    let level = u64::from(level);
    if level <= 10 {
        level * 2
    } else if level <= 25 {
        20 + (level - 10) * 3
    } else {
        65 + (level - 25) * 5
    }
}

/// Permanent reward multiplier after `count` prestige resets:
/// `1 + 0.05*N + 0.02*N^2`. Monotonically increasing and convex, with
/// `prestige_multiplier(0) == 1`.
pub fn prestige_multiplier(count: u32) -> f64 {
    let n = f64::from(count);
    1.0 + 0.05 * n + 0.02 * n * n
}

/// Credit multiplier contributed by currently-equipped credit-bonus
/// artifacts: `1 + sum(percent) / 100` over the equipped set.
pub fn equipped_credit_multiplier(artifacts: &[Artifact]) -> f64 {
    let percent_sum: i64 = artifacts
        .iter()
        .filter(|artifact| artifact.equipped)
        .map(|artifact| artifact.effect_percent(EffectKind::CreditBonus))
        .sum();
    1.0 + percent_sum as f64 / 100.0
}

pub fn scaled_credits(base: u64, prestige_mult: f64, artifact_mult: f64) -> u64 {
    (base as f64 * prestige_mult * artifact_mult).floor() as u64
}

pub fn scaled_reputation(base: u64, prestige_mult: f64) -> u64 {
    (base as f64 * prestige_mult).floor() as u64
}

/// Cumulative rarity table for a drop event, keyed by a uniform draw
/// `s` in [0, 1): mythic below 0.005, legendary below 0.05, epic below
/// 0.20, rare below 0.50, common otherwise.
pub fn rarity_for_roll(s: f64) -> Rarity {
    if s < 0.005 {
        Rarity::Mythic
    } else if s < 0.05 {
        Rarity::Legendary
    } else if s < 0.20 {
        Rarity::Epic
    } else if s < 0.50 {
        Rarity::Rare
    } else {
        Rarity::Common
    }
}

/// Default credit-bonus magnitude carried by a freshly dropped artifact.
pub fn dropped_effect_percent(rarity: Rarity) -> i64 {
    match rarity {
        Rarity::Mythic => 200,
        Rarity::Legendary => 80,
        Rarity::Epic => 40,
        Rarity::Rare => 20,
        Rarity::Common => 8,
    }
}

/// Player baseline after profile creation or a prestige reset; only the
/// prestige fields carry over.
pub fn baseline_player(prestige_count: u32) -> PlayerStats {
    PlayerStats {
        credits: BASELINE_CREDITS,
        reputation: 0,
        fragments: 0,
        energy: BASELINE_ENERGY,
        max_energy: BASELINE_MAX_ENERGY,
        prestige_count,
        prestige_multiplier: prestige_multiplier(prestige_count),
    }
}
