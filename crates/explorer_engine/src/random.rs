use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Injectable randomness for the progress simulation.
///
/// Every source draws from its own forked stream so cadence, increments
/// and outcomes are never synchronized between sources.
pub trait RandomSource: Send {
    /// Uniform draw in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Independent stream for one source.
    fn fork(&mut self) -> Box<dyn RandomSource>;

    /// Uniform draw in `[low, high)`; returns `low` for an empty range.
    fn range(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        low + (high - low) * self.unit()
    }
}

#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is present, entropy-backed otherwise.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::from_seed)
    }
}

impl RandomSource for SeededRandom {
    fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn fork(&mut self) -> Box<dyn RandomSource> {
        Box::new(Self::from_seed(self.rng.gen()))
    }
}
