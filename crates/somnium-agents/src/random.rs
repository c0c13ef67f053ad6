//! Injectable randomness for the rules.
//!
//! Every probabilistic decision goes through a [`RandomSource`], so tests
//! can pin outcomes exactly ([`FixedRandom`], [`SequenceRandom`]) and runs
//! can be replayed from a seed ([`SeededRandom`]).

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A source of uniform draws.
pub trait RandomSource: Send {
    /// A uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// A uniform index in `0..len`, or `None` when `len` is zero.
    fn pick_index(&mut self, len: usize) -> Option<usize>;
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }

    fn pick_index(&mut self, len: usize) -> Option<usize> {
        (**self).pick_index(len)
    }
}

/// Pseudo-random draws from a seedable [`SmallRng`].
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: SmallRng,
}

impl SeededRandom {
    /// Deterministic draws from `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Draws seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn pick_index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.rng.random_range(0..len))
    }
}

/// Returns the same draw every time.
///
/// `FixedRandom::new(0.0)` makes every gate pass; `FixedRandom::new(1.0)`
/// makes every gate fail. Index picks return `index`, capped at `len - 1`.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom {
    value: f64,
    index: usize,
}

impl FixedRandom {
    /// Always draw `value`, always pick index 0.
    pub const fn new(value: f64) -> Self {
        Self { value, index: 0 }
    }

    /// Pick `index` instead of 0.
    #[must_use]
    pub const fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }
}

impl RandomSource for FixedRandom {
    fn next_unit(&mut self) -> f64 {
        self.value
    }

    fn pick_index(&mut self, len: usize) -> Option<usize> {
        len.checked_sub(1).map(|last| self.index.min(last))
    }
}

/// Replays scripted draws in order, cycling when exhausted.
///
/// An empty script draws `1.0`, which fails every gate, and picks index 0.
#[derive(Debug, Clone, Default)]
pub struct SequenceRandom {
    values: Vec<f64>,
    indices: Vec<usize>,
    next_value: usize,
    next_index: usize,
    draws: usize,
}

impl SequenceRandom {
    /// Replay `values` for unit draws; index picks return 0.
    pub const fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            indices: Vec::new(),
            next_value: 0,
            next_index: 0,
            draws: 0,
        }
    }

    /// Replay `indices` for index picks (each capped at `len - 1`).
    #[must_use]
    pub fn with_indices(mut self, indices: Vec<usize>) -> Self {
        self.indices = indices;
        self
    }

    /// How many unit draws have been taken so far.
    pub const fn draws(&self) -> usize {
        self.draws
    }
}

impl RandomSource for SequenceRandom {
    fn next_unit(&mut self) -> f64 {
        self.draws = self.draws.saturating_add(1);
        let value = self.values.get(self.next_value).copied().unwrap_or(1.0);
        self.next_value = self.next_value.saturating_add(1);
        if self.next_value >= self.values.len() {
            self.next_value = 0;
        }
        value
    }

    fn pick_index(&mut self, len: usize) -> Option<usize> {
        let last = len.checked_sub(1)?;
        let index = self.indices.get(self.next_index).copied().unwrap_or(0);
        self.next_index = self.next_index.saturating_add(1);
        if self.next_index >= self.indices.len() {
            self.next_index = 0;
        }
        Some(index.min(last))
    }
}
