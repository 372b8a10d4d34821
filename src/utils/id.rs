//! Allocation identifier generation.
//!
//! A single generator is seeded once and shared by every reconciliation
//! performed through the same reconciler, so closely-timed calls never
//! reseed and collide.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Source of opaque allocation identifiers
#[derive(Debug)]
pub struct IdGenerator {
    rng: Mutex<StdRng>,
}

impl IdGenerator {
    /// Generator seeded from operating system entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator, for reproducible runs and tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Next identifier: a non-negative 63-bit integer in decimal.
    ///
    /// Uniqueness is best-effort; two generators may in principle produce
    /// the same value.
    pub fn next_id(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let value: u64 = rng.gen::<u64>() >> 1;
        value.to_string()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}
