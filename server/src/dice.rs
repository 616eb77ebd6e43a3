//! Dice rolling service.
//!
//! Rolls must be uniformly distributed and unpredictable from anything a
//! client can observe, so the production roller draws from an entropy-seeded
//! RNG held server-side. The trait seam lets rooms run with deterministic dice
//! in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of fair 1-6 rolls.
pub trait DiceRoller: Send {
    fn roll(&mut self) -> u8;
}

/// Production roller seeded from OS entropy.
pub struct EntropyDice {
    rng: StdRng,
}

impl EntropyDice {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for EntropyDice {
    fn default() -> Self {
        Self::new()
    }
}

impl DiceRoller for EntropyDice {
    fn roll(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }
}

/// Deterministic roller that cycles through a fixed sequence. Used by tests
/// and the demo client harness; never by a live room.
pub struct SequenceDice {
    values: Vec<u8>,
    next: usize,
}

impl SequenceDice {
    pub fn new(values: Vec<u8>) -> Self {
        debug_assert!(!values.is_empty());
        debug_assert!(values.iter().all(|v| (1..=6).contains(v)));
        Self { values, next: 0 }
    }
}

impl DiceRoller for SequenceDice {
    fn roll(&mut self) -> u8 {
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value
    }
}
