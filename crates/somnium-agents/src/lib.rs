//! Agent population and behavior-mutation rules for the Somnium engine.
//!
//! This crate holds everything that operates on agents without owning the
//! tick loop: the population arena, the rule configuration, the random
//! source abstraction, and the rules themselves. Each rule is a plain
//! function over borrowed agent state that draws from a
//! [`RandomSource`] and writes to an [`EventLog`]; the scheduler in
//! `somnium-core` decides when each one runs.
//!
//! # Modules
//!
//! - [`config`] -- Rule thresholds ([`RuleConfig`]), [`RoleSet`], [`FragmentPool`]
//! - [`context`] -- [`RuleContext`] passed to every rule
//! - [`doubt`] -- Trust & doubt rule (role-reversal goals)
//! - [`dream`] -- Dream injection rule (temporary goals from eidolons)
//! - [`error`] -- [`AgentError`]
//! - [`goals`] -- Temporary goal countdown and expiry
//! - [`mutation`] -- Entropy-driven role mutation rule
//! - [`population`] -- Index-keyed agent arena with a unique-name index
//! - [`random`] -- Injectable [`RandomSource`] implementations
//!
//! [`EventLog`]: somnium_events::EventLog

pub mod config;
pub mod context;
pub mod doubt;
pub mod dream;
pub mod error;
pub mod goals;
pub mod mutation;
pub mod population;
pub mod random;

// Re-export primary types at crate root for convenience.
pub use config::{DoubtConfig, DreamConfig, FragmentPool, MutationConfig, RoleSet, RuleConfig};
pub use context::RuleContext;
pub use error::AgentError;
pub use goals::ExpiredGoal;
pub use mutation::RoleMutation;
pub use population::Population;
pub use random::{FixedRandom, RandomSource, SeededRandom, SequenceRandom};
