//! Timestamp sources for event emission.

use chrono::{DateTime, TimeDelta, Utc};

/// Supplies the timestamp stamped onto each event.
pub trait TimeSource: Send {
    /// The current time. Called once per recorded event.
    fn now(&mut self) -> DateTime<Utc>;
}

/// Wall-clock time from the system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&mut self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A deterministic clock for tests and replays.
///
/// Returns `start` on the first call and moves forward by `step` on every
/// call after that, so timestamps are strictly increasing whenever `step`
/// is positive.
#[derive(Debug, Clone, Copy)]
pub struct ManualTimeSource {
    next: DateTime<Utc>,
    step: TimeDelta,
}

impl ManualTimeSource {
    /// Start at `start`, advancing by `step` per event.
    pub const fn new(start: DateTime<Utc>, step: TimeDelta) -> Self {
        Self { next: start, step }
    }

    /// A clock starting at the Unix epoch that advances one millisecond per event.
    pub fn epoch() -> Self {
        Self::new(DateTime::UNIX_EPOCH, TimeDelta::milliseconds(1))
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&mut self) -> DateTime<Utc> {
        let current = self.next;
        self.next = current.checked_add_signed(self.step).unwrap_or(current);
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_source_steps_forward() {
        let mut clock = ManualTimeSource::epoch();
        let first = clock.now();
        let second = clock.now();
        assert_eq!(first, DateTime::UNIX_EPOCH);
        assert_eq!(second.signed_duration_since(first), TimeDelta::milliseconds(1));
    }

    #[test]
    fn system_source_is_close_to_now() {
        let mut clock = SystemTimeSource;
        let stamped = clock.now();
        let drift = Utc::now().signed_duration_since(stamped);
        assert!(drift < TimeDelta::seconds(5));
    }
}
