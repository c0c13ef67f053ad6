//! Entropy mutation rule.
//!
//! When global entropy is strictly above the threshold, the rule takes one
//! draw per tick. On success one agent, chosen uniformly, moves to the
//! next role in the [`RoleSet`] (wrapping at the end) and a
//! `role_mutation` event is recorded. An empty population is a no-op and
//! consumes no draws.

use serde::Serialize;
use somnium_types::{Agent, EventType, Role};
use tracing::debug;

use crate::config::{MutationConfig, RoleSet};
use crate::context::RuleContext;

/// A role change applied by the mutation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleMutation {
    /// The mutated agent.
    pub agent: String,
    /// Role before the mutation.
    pub from: Role,
    /// Role after the mutation.
    pub to: Role,
}

/// Whether `entropy` is high enough for the rule to fire.
pub fn is_triggered(entropy: f64, config: &MutationConfig) -> bool {
    entropy > config.entropy_threshold
}

/// Evaluate the rule once for this tick.
pub fn evaluate(
    entropy: f64,
    agents: &mut [Agent],
    config: &MutationConfig,
    roles: &RoleSet,
    ctx: &mut RuleContext<'_>,
) -> Option<RoleMutation> {
    if agents.is_empty() || !is_triggered(entropy, config) {
        return None;
    }
    if !ctx.roll(config.probability) {
        return None;
    }

    let index = ctx.rng.pick_index(agents.len())?;
    let agent = agents.get_mut(index)?;
    let next = roles.next_after(agent.role())?.clone();
    let from = agent.set_role(next.clone());

    debug!(
        tick = ctx.tick,
        entropy,
        agent = agent.name(),
        from = %from,
        to = %next,
        "role mutated"
    );
    ctx.log.record(
        ctx.tick,
        EventType::RoleMutation,
        Some(agent.name()),
        Some(serde_json::json!({ "from": from.as_str(), "to": next.as_str() })),
    );

    Some(RoleMutation {
        agent: agent.name().to_owned(),
        from,
        to: next,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use somnium_events::{EventLog, MemorySink};
    use somnium_types::Position;

    use super::*;
    use crate::random::{FixedRandom, SequenceRandom};

    fn agents(roles: &[&str]) -> Vec<Agent> {
        roles
            .iter()
            .enumerate()
            .map(|(i, role)| Agent::new(format!("agent-{i}"), Role::from(*role), 0.5, Position::default()))
            .collect()
    }

    fn roles() -> RoleSet {
        RoleSet::from_names(&["scout", "guardian", "oracle"]).unwrap()
    }

    #[test]
    fn threshold_is_strict() {
        let config = MutationConfig::default();
        let mut population = agents(&["scout"]);
        let mut rng = SequenceRandom::new(vec![0.0]);
        let mut log = EventLog::discard();

        let mut ctx = RuleContext::new(1, &mut rng, &mut log);
        assert!(evaluate(0.9, &mut population, &config, &roles(), &mut ctx).is_none());
        assert_eq!(rng.draws(), 0);
        assert_eq!(population.first().unwrap().role().as_str(), "scout");
    }

    #[test]
    fn high_entropy_mutates_selected_agent() {
        let config = MutationConfig::default();
        let sink = MemorySink::new();
        let buffer = sink.buffer();
        let mut log = EventLog::new(sink);
        let mut rng = FixedRandom::new(0.2).with_index(1);
        let mut population = agents(&["scout", "oracle", "guardian"]);

        let mut ctx = RuleContext::new(77, &mut rng, &mut log);
        let mutation = evaluate(0.95, &mut population, &config, &roles(), &mut ctx).unwrap();

        assert_eq!(mutation.agent, "agent-1");
        assert_eq!(mutation.from.as_str(), "oracle");
        assert_eq!(mutation.to.as_str(), "scout");
        assert_eq!(population.get(1).unwrap().role().as_str(), "scout");
        assert_eq!(population.first().unwrap().role().as_str(), "scout");
        assert_eq!(population.get(2).unwrap().role().as_str(), "guardian");

        let events = buffer.events();
        assert_eq!(events.len(), 1);
        let event = events.first().unwrap();
        assert_eq!(event.event_type, EventType::RoleMutation);
        assert_eq!(event.agent.as_deref(), Some("agent-1"));
        let detail = event.detail.clone().unwrap();
        assert_eq!(detail["from"], "oracle");
        assert_eq!(detail["to"], "scout");
    }

    #[test]
    fn failed_draw_mutates_nothing() {
        let config = MutationConfig::default();
        let mut population = agents(&["scout", "scout"]);
        let mut rng = FixedRandom::new(0.25);
        let mut log = EventLog::discard();

        let mut ctx = RuleContext::new(1, &mut rng, &mut log);
        assert!(evaluate(1.0, &mut population, &config, &roles(), &mut ctx).is_none());
        assert!(population.iter().all(|a| a.role().as_str() == "scout"));
        assert_eq!(log.recorded_count(), 0);
    }

    #[test]
    fn empty_population_is_a_no_op() {
        let config = MutationConfig::default();
        let mut rng = SequenceRandom::new(vec![0.0]);
        let mut log = EventLog::discard();

        let mut ctx = RuleContext::new(1, &mut rng, &mut log);
        assert!(evaluate(1.0, &mut [], &config, &roles(), &mut ctx).is_none());
        assert_eq!(rng.draws(), 0);
        assert_eq!(log.recorded_count(), 0);
    }

    #[test]
    fn nan_entropy_never_fires() {
        let config = MutationConfig::default();
        assert!(!is_triggered(f64::NAN, &config));
        assert!(is_triggered(0.900_001, &config));
    }
}
