//! Per-tick state shared by every rule invocation.

use somnium_events::EventLog;

use crate::random::RandomSource;

/// What a rule needs from the scheduler besides the agents themselves.
pub struct RuleContext<'a> {
    /// The tick being evaluated.
    pub tick: u64,
    /// Source of every probabilistic draw.
    pub rng: &'a mut dyn RandomSource,
    /// Where rule events go.
    pub log: &'a mut EventLog,
}

impl<'a> RuleContext<'a> {
    /// Bundle the scheduler state for `tick`.
    pub fn new(tick: u64, rng: &'a mut dyn RandomSource, log: &'a mut EventLog) -> Self {
        Self { tick, rng, log }
    }

    /// One uniform draw in `[0, 1)`, compared strictly against `probability`.
    pub fn roll(&mut self, probability: f64) -> bool {
        self.rng.next_unit() < probability
    }
}

impl core::fmt::Debug for RuleContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RuleContext")
            .field("tick", &self.tick)
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}
