//! Seeded deterministic randomness for drop rolls.
//!
//! Artifact drops are the only stochastic part of the engine, so the draws
//! are pulled from one explicit stream seeded by the profile config. Tests
//! pick a seed and assert exact outcomes instead of sampling.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropRng {
    state: u64,
}

impl DropRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: mix_seed(seed, 0xD09_50D5),
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut value = self.state;
        value = (value ^ (value >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        value = (value ^ (value >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        value ^ (value >> 31)
    }

    /// Uniform draw in [0, 1) with 53 bits of precision.
    pub fn next_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1_u64 << 53) as f64
    }
}

fn mix_seed(seed: u64, salt: u64) -> u64 {
    let mut value = seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    value ^= value.rotate_left(29);
    value = value.wrapping_mul(0x517C_C1B7_2722_0A95);
    value ^ (value >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = DropRng::new(1337);
        let mut b = DropRng::new(1337);
        for _ in 0..32 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = DropRng::new(1);
        let mut b = DropRng::new(2);
        let matches = (0..16).filter(|_| a.next_u64() == b.next_u64()).count();
        assert!(matches < 16);
    }

    #[test]
    fn unit_draws_stay_in_range() {
        let mut rng = DropRng::new(42);
        for _ in 0..1_000 {
            let draw = rng.next_unit();
            assert!((0.0..1.0).contains(&draw));
        }
    }
}
