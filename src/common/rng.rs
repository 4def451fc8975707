//! Seeded simulation RNG.
//!
//! Owned by the app as a resource so runs with the same seed stay reproducible.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Resource, Debug)]
pub struct SimRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}
