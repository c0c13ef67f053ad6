//! Simulation tick clock.
//!
//! The tick counter starts at 0 before the first `advance` and increases
//! by exactly one per tick. All arithmetic is checked: overflow is an
//! error, never a wrap.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Monotonic tick counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationClock {
    tick: u64,
}

impl SimulationClock {
    /// A clock at tick 0.
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    /// A clock resuming at `tick` (state restoration and tests).
    pub const fn starting_at(tick: u64) -> Self {
        Self { tick }
    }

    /// Peek at the tick [`advance`](Self::advance) would move to.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter is at `u64::MAX`.
    pub const fn next_tick(&self) -> Result<u64, ClockError> {
        match self.tick.checked_add(1) {
            Some(next) => Ok(next),
            None => Err(ClockError::TickOverflow),
        }
    }

    /// Advance by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`; the clock is left unchanged.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.next_tick()?;
        Ok(self.tick)
    }

    /// The current tick.
    pub const fn tick(&self) -> u64 {
        self.tick
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_and_counts_up() {
        let mut clock = SimulationClock::new();
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.advance().unwrap(), 2);
        assert_eq!(clock.tick(), 2);
    }

    #[test]
    fn overflow_is_reported_and_state_kept() {
        let mut clock = SimulationClock::starting_at(u64::MAX);
        assert!(matches!(clock.advance(), Err(ClockError::TickOverflow)));
        assert_eq!(clock.tick(), u64::MAX);
    }
}
