//! Injectable randomness for model choice and jitter.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource: Send + Sync {
    /// Uniform value in `[min, max]`. Returns `min` when `max <= min`.
    fn uniform_ms(&self, min: u64, max: u64) -> u64;

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    fn index(&self, len: usize) -> usize;
}

/// Thread-local RNG, used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn uniform_ms(&self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    fn index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        rand::thread_rng().gen_range(0..len)
    }
}

/// Deterministic RNG for tests and reproducible runs.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }
}

impl RandomSource for SeededRandom {
    fn uniform_ms(&self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        self.rng.lock().gen_range(min..=max)
    }

    fn index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.lock().gen_range(0..len)
    }
}
