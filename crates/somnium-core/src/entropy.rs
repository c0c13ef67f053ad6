//! Entropy sources.
//!
//! The scheduler does not own entropy; each `advance` call is handed a
//! value. An [`EntropySource`] is how the runner produces that value from
//! the tick number. Sources are not clamped: values outside `[0, 1]` are
//! passed through and only compared against the mutation threshold.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::EntropyScheduleConfig;

/// Produces the entropy value for a tick.
pub trait EntropySource: Send {
    /// Entropy to feed into `advance` for `tick` (the tick about to run).
    fn entropy_for(&mut self, tick: u64) -> f64;
}

/// The same value every tick.
#[derive(Debug, Clone, Copy)]
pub struct ConstantEntropy(pub f64);

impl EntropySource for ConstantEntropy {
    fn entropy_for(&mut self, _tick: u64) -> f64 {
        self.0
    }
}

/// `base + amplitude * sin(2π · tick / period)`.
#[derive(Debug, Clone, Copy)]
pub struct OscillatingEntropy {
    base: f64,
    amplitude: f64,
    period_ticks: u32,
}

impl OscillatingEntropy {
    /// A wave with the given midline, amplitude, and period. A zero
    /// period is treated as one tick.
    pub const fn new(base: f64, amplitude: f64, period_ticks: u32) -> Self {
        Self {
            base,
            amplitude,
            period_ticks: if period_ticks == 0 { 1 } else { period_ticks },
        }
    }
}

impl EntropySource for OscillatingEntropy {
    fn entropy_for(&mut self, tick: u64) -> f64 {
        let phase = tick.checked_rem(u64::from(self.period_ticks)).unwrap_or(0);
        let phase = u32::try_from(phase).unwrap_or(0);
        let angle = std::f64::consts::TAU * f64::from(phase) / f64::from(self.period_ticks);
        self.amplitude.mul_add(angle.sin(), self.base)
    }
}

/// A bounded random walk in `[0, 1]`.
///
/// Each tick moves by a uniform step in `[-max_step, max_step]` and is
/// clamped back into range.
#[derive(Debug, Clone)]
pub struct RandomWalkEntropy {
    value: f64,
    max_step: f64,
    rng: SmallRng,
}

impl RandomWalkEntropy {
    /// A walk starting at `start` (clamped into `[0, 1]`), seeded from `seed`.
    pub fn new(start: f64, max_step: f64, seed: u64) -> Self {
        Self {
            value: start.clamp(0.0, 1.0),
            max_step: max_step.abs(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl EntropySource for RandomWalkEntropy {
    fn entropy_for(&mut self, _tick: u64) -> f64 {
        let current = self.value;
        if self.max_step > 0.0 {
            let step = self.rng.random_range(-self.max_step..=self.max_step);
            self.value = (self.value + step).clamp(0.0, 1.0);
        }
        current
    }
}

/// Build the source a schedule describes. `seed` only matters for the
/// random walk.
pub fn from_schedule(schedule: &EntropyScheduleConfig, seed: u64) -> Box<dyn EntropySource> {
    match *schedule {
        EntropyScheduleConfig::Constant { value } => Box::new(ConstantEntropy(value)),
        EntropyScheduleConfig::Oscillating {
            base,
            amplitude,
            period_ticks,
        } => Box::new(OscillatingEntropy::new(base, amplitude, period_ticks)),
        EntropyScheduleConfig::RandomWalk { start, max_step } => {
            Box::new(RandomWalkEntropy::new(start, max_step, seed))
        }
    }
}
