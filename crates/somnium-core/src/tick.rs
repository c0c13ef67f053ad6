//! Tick scheduler: the fixed-order step that drives every rule.
//!
//! Each call to [`SimulationState::advance`] runs these steps in order:
//!
//! 1. **Clock** -- increment the tick counter. This is the only step that
//!    can fail (tick overflow), and it fails before anything is mutated.
//!
//! 2. **Doubt** -- evaluate the trust & doubt rule for every agent.
//!
//! 3. **Dream** -- for every eidolon, evaluate dream injection against the
//!    full agent set.
//!
//! 4. **Mutation** -- evaluate entropy mutation once.
//!
//! 5. **Expiry** -- count down temporary goals issued before this tick and
//!    remove exhausted ones, recording a `dream_faded` event for each.
//!
//! Because every rule goes through `&mut SimulationState`, events from one
//! tick always appear in step order. The tick is deterministic given the
//! same state, entropy, and random source.

use std::collections::BTreeMap;

use somnium_agents::{
    AgentError, ExpiredGoal, FragmentPool, Population, RandomSource, RoleMutation, RoleSet,
    RuleConfig, RuleContext, SeededRandom, doubt, dream, goals, mutation,
};
use somnium_events::EventLog;
use somnium_types::{Agent, Eidolon, EidolonId, Goal, Position, RunId};
use tracing::debug;

use crate::clock::{ClockError, SimulationClock};
use crate::config::ValidatedRules;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Errors that can occur while assembling a [`SimulationState`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Rule parameters or the initial population are invalid.
    #[error("invalid simulation setup: {source}")]
    Invalid {
        /// The underlying validation error.
        #[from]
        source: AgentError,
    },
}

/// Where the scheduler is in its cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TickPhase {
    /// Between ticks; the driver may mutate state.
    #[default]
    Idle,
    /// Inside `advance`.
    Running,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// The entropy supplied for this tick.
    pub entropy: f64,
    /// Agents that queued a role reversal.
    pub doubts: usize,
    /// Temporary goals injected by eidolons.
    pub dreams: usize,
    /// The role change applied by the mutation rule, if any.
    pub mutation: Option<RoleMutation>,
    /// Temporary goals removed at the end of the tick.
    pub expired: Vec<ExpiredGoal>,
    /// Number of agents at end of tick.
    pub population: usize,
    /// Number of eidolons during the tick.
    pub eidolons: usize,
    /// Events recorded during the tick.
    pub events: u64,
}

/// All simulation state, owned in one place.
///
/// The driver mutates state between ticks through the methods below;
/// rules mutate it only inside [`advance`](Self::advance).
pub struct SimulationState {
    run_id: RunId,
    clock: SimulationClock,
    entropy: f64,
    phase: TickPhase,
    population: Population,
    eidolons: BTreeMap<EidolonId, Eidolon>,
    next_eidolon: u32,
    rules: RuleConfig,
    roles: RoleSet,
    fragments: FragmentPool,
    rng: Box<dyn RandomSource>,
    log: EventLog,
}

impl SimulationState {
    /// Start assembling a simulation.
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    /// Run one tick with the given global entropy.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Clock`] if the tick counter would overflow. In
    /// that case nothing has been mutated and no events were recorded.
    pub fn advance(&mut self, entropy: f64) -> Result<TickSummary, TickError> {
        let tick = self.clock.advance()?;
        self.phase = TickPhase::Running;
        self.entropy = entropy;
        let events_before = self.log.recorded_count();

        let mut ctx = RuleContext::new(tick, self.rng.as_mut(), &mut self.log);

        // --- Step 2: Doubt ---
        let doubts = doubt::evaluate_all(self.population.as_mut_slice(), &self.rules.doubt, &mut ctx);

        // --- Step 3: Dream ---
        let mut dreams = 0_usize;
        for (&id, eidolon) in &self.eidolons {
            let injected = dream::evaluate(
                id,
                eidolon,
                self.population.as_mut_slice(),
                &self.rules.dream,
                &self.fragments,
                &mut ctx,
            );
            dreams = dreams.saturating_add(injected);
        }

        // --- Step 4: Mutation ---
        let mutation = mutation::evaluate(
            entropy,
            self.population.as_mut_slice(),
            &self.rules.mutation,
            &self.roles,
            &mut ctx,
        );

        // --- Step 5: Expiry ---
        let expired = goals::expire_all(self.population.as_mut_slice(), tick, &mut self.log);

        let summary = TickSummary {
            tick,
            entropy,
            doubts,
            dreams,
            mutation,
            expired,
            population: self.population.len(),
            eidolons: self.eidolons.len(),
            events: self.log.recorded_count().saturating_sub(events_before),
        };

        debug!(
            run_id = %self.run_id,
            tick,
            entropy,
            doubts,
            dreams,
            mutated = summary.mutation.is_some(),
            expired = summary.expired.len(),
            "tick complete"
        );

        self.phase = TickPhase::Idle;
        Ok(summary)
    }

    // -----------------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------------

    /// This run's identifier.
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// The last completed tick (0 before the first `advance`).
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// The entropy supplied to the last `advance` (0.0 before the first).
    pub const fn entropy(&self) -> f64 {
        self.entropy
    }

    /// Where the scheduler is in its cycle.
    pub const fn phase(&self) -> TickPhase {
        self.phase
    }

    /// Look up an agent by name.
    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.population.get(name)
    }

    /// All agents in insertion order.
    pub fn agents(&self) -> &[Agent] {
        self.population.as_slice()
    }

    /// The population arena.
    pub const fn population(&self) -> &Population {
        &self.population
    }

    /// Look up an eidolon by id.
    pub fn eidolon(&self, id: EidolonId) -> Option<&Eidolon> {
        self.eidolons.get(&id)
    }

    /// All eidolons, in placement order.
    pub const fn eidolons(&self) -> &BTreeMap<EidolonId, Eidolon> {
        &self.eidolons
    }

    /// The event log.
    pub const fn event_log(&self) -> &EventLog {
        &self.log
    }

    /// Rule parameters in force.
    pub const fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    /// The role set in force.
    pub const fn roles(&self) -> &RoleSet {
        &self.roles
    }

    /// The fragment pool in force.
    pub const fn fragments(&self) -> &FragmentPool {
        &self.fragments
    }

    // -----------------------------------------------------------------------
    // Driver mutators
    // -----------------------------------------------------------------------

    /// Add an agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::DuplicateName`], [`AgentError::EmptyName`], or
    /// [`AgentError::UnknownRole`].
    pub fn add_agent(&mut self, agent: Agent) -> Result<(), AgentError> {
        self.population.insert(agent, &self.roles).map(|_| ())
    }

    /// Remove an agent by name, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`].
    pub fn remove_agent(&mut self, name: &str) -> Result<Agent, AgentError> {
        self.population.remove(name)
    }

    /// Set an agent's trust (clamped into `[0, 1]`; `NaN` is ignored).
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`].
    pub fn set_trust(&mut self, name: &str, trust: f64) -> Result<(), AgentError> {
        self.population.require_mut(name)?.set_trust(trust);
        Ok(())
    }

    /// Move an agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`].
    pub fn move_agent(&mut self, name: &str, position: Position) -> Result<(), AgentError> {
        self.population.require_mut(name)?.set_position(position);
        Ok(())
    }

    /// Queue a driver-defined goal on an agent.
    ///
    /// An `issued_at` later than the current tick is pulled back to it, so
    /// a temporary goal starts counting down on the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`].
    pub fn push_goal(&mut self, name: &str, mut goal: Goal) -> Result<(), AgentError> {
        goal.issued_at = goal.issued_at.min(self.tick());
        self.population.require_mut(name)?.push_goal(goal);
        Ok(())
    }

    /// Place an eidolon and return its new id.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::EidolonIdsExhausted`] once every `u32` id has
    /// been handed out; ids are never reused.
    pub fn place_eidolon(&mut self, eidolon: Eidolon) -> Result<EidolonId, AgentError> {
        let id = EidolonId(self.next_eidolon);
        self.next_eidolon = self
            .next_eidolon
            .checked_add(1)
            .ok_or(AgentError::EidolonIdsExhausted)?;
        self.eidolons.insert(id, eidolon);
        Ok(id)
    }

    /// Move an eidolon.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::EidolonNotFound`].
    pub fn move_eidolon(&mut self, id: EidolonId, position: Position) -> Result<(), AgentError> {
        let eidolon = self
            .eidolons
            .get_mut(&id)
            .ok_or(AgentError::EidolonNotFound(id))?;
        eidolon.position = position;
        Ok(())
    }

    /// Remove an eidolon, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::EidolonNotFound`].
    pub fn remove_eidolon(&mut self, id: EidolonId) -> Result<Eidolon, AgentError> {
        self.eidolons
            .remove(&id)
            .ok_or(AgentError::EidolonNotFound(id))
    }

    /// Flush the event log.
    pub fn flush_events(&mut self) {
        self.log.flush();
    }
}

impl core::fmt::Debug for SimulationState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulationState")
            .field("run_id", &self.run_id)
            .field("tick", &self.clock.tick())
            .field("entropy", &self.entropy)
            .field("phase", &self.phase)
            .field("agents", &self.population.len())
            .field("eidolons", &self.eidolons.len())
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Assembles a [`SimulationState`].
///
/// Defaults: reference rule tuning, the built-in role set and fragment
/// pool, an OS-seeded random source, and an event log that discards
/// everything.
pub struct SimulationBuilder {
    rules: RuleConfig,
    roles: RoleSet,
    fragments: FragmentPool,
    rng: Option<Box<dyn RandomSource>>,
    log: Option<EventLog>,
    clock: SimulationClock,
    agents: Vec<Agent>,
    eidolons: Vec<Eidolon>,
}

impl SimulationBuilder {
    /// A builder with all defaults.
    pub fn new() -> Self {
        Self {
            rules: RuleConfig::default(),
            roles: RoleSet::default(),
            fragments: FragmentPool::default(),
            rng: None,
            log: None,
            clock: SimulationClock::new(),
            agents: Vec::new(),
            eidolons: Vec::new(),
        }
    }

    /// Use rules, roles, and fragments from a validated config.
    #[must_use]
    pub fn validated(mut self, validated: ValidatedRules) -> Self {
        self.rules = validated.rules;
        self.roles = validated.roles;
        self.fragments = validated.fragments;
        self
    }

    /// Rule parameters (checked again in [`build`](Self::build)).
    #[must_use]
    pub fn rules(mut self, rules: RuleConfig) -> Self {
        self.rules = rules;
        self
    }

    /// The role set.
    #[must_use]
    pub fn roles(mut self, roles: RoleSet) -> Self {
        self.roles = roles;
        self
    }

    /// The dream fragment pool.
    #[must_use]
    pub fn fragments(mut self, fragments: FragmentPool) -> Self {
        self.fragments = fragments;
        self
    }

    /// Draw from `rng`.
    #[must_use]
    pub fn random_source(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    /// Draw from a [`SeededRandom`] seeded with `seed`.
    #[must_use]
    pub fn seed(self, seed: u64) -> Self {
        self.random_source(SeededRandom::from_seed(seed))
    }

    /// Record events into `log`.
    #[must_use]
    pub fn event_log(mut self, log: EventLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Resume at `tick` instead of 0.
    #[must_use]
    pub const fn starting_tick(mut self, tick: u64) -> Self {
        self.clock = SimulationClock::starting_at(tick);
        self
    }

    /// Add an initial agent.
    #[must_use]
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Add an initial eidolon.
    #[must_use]
    pub fn eidolon(mut self, eidolon: Eidolon) -> Self {
        self.eidolons.push(eidolon);
        self
    }

    /// Validate and assemble the state.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Invalid`] if the rule parameters are out of
    /// range or an initial agent is rejected (duplicate name, unknown role).
    pub fn build(self) -> Result<SimulationState, BuildError> {
        self.rules.validate()?;

        let mut state = SimulationState {
            run_id: RunId::new(),
            clock: self.clock,
            entropy: 0.0,
            phase: TickPhase::Idle,
            population: Population::new(),
            eidolons: BTreeMap::new(),
            next_eidolon: 0,
            rules: self.rules,
            roles: self.roles,
            fragments: self.fragments,
            rng: self
                .rng
                .unwrap_or_else(|| Box::new(SeededRandom::from_entropy())),
            log: self.log.unwrap_or_default(),
        };
        for agent in self.agents {
            state.add_agent(agent)?;
        }
        for eidolon in self.eidolons {
            state.place_eidolon(eidolon)?;
        }
        Ok(state)
    }
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for SimulationBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulationBuilder")
            .field("rules", &self.rules)
            .field("roles", &self.roles)
            .field("agents", &self.agents.len())
            .field("eidolons", &self.eidolons.len())
            .finish_non_exhaustive()
    }
}
