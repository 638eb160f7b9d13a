//! Random sources
//!
//! - [`RngSource`] wraps any `rand` generator (seeded for reproducible
//!   simulations, entropy-seeded otherwise)
//! - [`ScriptedRandom`] replays a fixed list of draws, for tests

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::RandomSource;

/// Adapter from a `rand` generator to [`RandomSource`]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng + Send> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Reproducible source: the same seed yields the same simulation
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Source seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn range_inclusive(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Boxed source from an optional seed
pub fn source_from_seed(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource::from_entropy()),
    }
}

/// Replays scripted draws in order, cycling once exhausted.
///
/// Values are clamped into `[0, 1)`. An empty script always yields 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    script: Vec<f64>,
    pending: VecDeque<f64>,
}

impl ScriptedRandom {
    pub fn new(script: impl IntoIterator<Item = f64>) -> Self {
        let script: Vec<f64> = script
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self {
            pending: script.iter().copied().collect(),
            script,
        }
    }

    /// A source that returns the same draw forever
    pub fn constant(value: f64) -> Self {
        Self::new([value])
    }

    /// Number of draws consumed since the script last wrapped
    pub fn consumed(&self) -> usize {
        self.script.len() - self.pending.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        if self.script.is_empty() {
            return 0.0;
        }
        if self.pending.is_empty() {
            self.pending.extend(self.script.iter().copied());
        }
        self.pending.pop_front().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = RngSource::seeded(42);
        let mut b = RngSource::seeded(42);
        let draws_a: Vec<i64> = (0..20).map(|_| a.range_inclusive(1, 100)).collect();
        let draws_b: Vec<i64> = (0..20).map(|_| b.range_inclusive(1, 100)).collect();
        assert_eq!(draws_a, draws_b);
        assert!(draws_a.iter().all(|v| (1..=100).contains(v)));
    }

    #[test]
    fn test_scripted_cycles() {
        let mut source = ScriptedRandom::new([0.1, 0.2]);
        assert_eq!(source.next_f64(), 0.1);
        assert_eq!(source.consumed(), 1);
        assert_eq!(source.next_f64(), 0.2);
        assert_eq!(source.next_f64(), 0.1);
    }

    #[test]
    fn test_scripted_clamps() {
        let mut source = ScriptedRandom::new([1.5, -1.0]);
        assert!(source.next_f64() < 1.0);
        assert_eq!(source.next_f64(), 0.0);
        assert_eq!(ScriptedRandom::default().next_f64(), 0.0);
    }
}
