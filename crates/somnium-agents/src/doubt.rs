//! Trust & doubt rule.
//!
//! On the crisis tick every agent is evaluated; on any other tick only
//! agents whose trust has fallen below the threshold are. An evaluated
//! agent takes exactly one draw, and on success queues a permanent
//! `reverse_role` goal and an `agent_doubt` event is recorded.
//!
//! The goal is never deduplicated: an agent that stays below the
//! threshold can accumulate several reversal goals over time.

use somnium_types::{Agent, EventType, Goal};
use tracing::debug;

use crate::config::DoubtConfig;
use crate::context::RuleContext;

/// Whether `agent` is evaluated for doubt on `tick`.
pub fn is_eligible(agent: &Agent, tick: u64, config: &DoubtConfig) -> bool {
    tick == config.crisis_tick || agent.trust() < config.trust_threshold
}

/// Evaluate one agent. Returns `true` if a role reversal was queued.
pub fn evaluate(agent: &mut Agent, config: &DoubtConfig, ctx: &mut RuleContext<'_>) -> bool {
    if !is_eligible(agent, ctx.tick, config) || !ctx.roll(config.probability) {
        return false;
    }

    agent.push_goal(Goal::reverse_role(ctx.tick));
    debug!(
        tick = ctx.tick,
        agent = agent.name(),
        trust = agent.trust(),
        "agent doubts its role"
    );
    ctx.log.record(
        ctx.tick,
        EventType::AgentDoubt,
        Some(agent.name()),
        Some(serde_json::Value::String(agent.name().to_owned())),
    );
    true
}

/// Evaluate every agent in order. Returns how many queued a reversal.
pub fn evaluate_all(agents: &mut [Agent], config: &DoubtConfig, ctx: &mut RuleContext<'_>) -> usize {
    let mut doubted = 0_usize;
    for agent in agents.iter_mut() {
        if evaluate(agent, config, ctx) {
            doubted = doubted.saturating_add(1);
        }
    }
    doubted
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use somnium_events::{EventLog, MemorySink};
    use somnium_types::{GoalKind, Position, Role};

    use super::*;
    use crate::random::{FixedRandom, SequenceRandom};

    fn agent(name: &str, trust: f64) -> Agent {
        Agent::new(name, Role::from("scout"), trust, Position::default())
    }

    #[test]
    fn trusting_agent_is_not_evaluated_off_crisis() {
        let config = DoubtConfig::default();
        let mut rng = SequenceRandom::new(vec![0.0]);
        let mut log = EventLog::discard();
        let mut a = agent("Ash", 0.2);

        let mut ctx = RuleContext::new(599, &mut rng, &mut log);
        assert!(!evaluate(&mut a, &config, &mut ctx));
        assert!(a.goals().is_empty());
        assert_eq!(rng.draws(), 0, "threshold is strict: trust 0.2 draws nothing");
    }

    #[test]
    fn low_trust_agent_doubts_when_draw_passes() {
        let config = DoubtConfig::default();
        let sink = MemorySink::new();
        let buffer = sink.buffer();
        let mut log = EventLog::new(sink);
        let mut rng = FixedRandom::new(0.05);
        let mut a = agent("Ash", 0.19);

        let mut ctx = RuleContext::new(12, &mut rng, &mut log);
        assert!(evaluate(&mut a, &config, &mut ctx));
        assert_eq!(a.goals().len(), 1);
        let goal = a.goals().first().unwrap();
        assert_eq!(goal.kind, GoalKind::ReverseRole);
        assert!(goal.remaining_ticks.is_none());

        let events = buffer.events();
        assert_eq!(events.len(), 1);
        let event = events.first().unwrap();
        assert_eq!(event.event_type, EventType::AgentDoubt);
        assert_eq!(event.agent.as_deref(), Some("Ash"));
        assert_eq!(event.tick, 12);
    }

    #[test]
    fn failed_draw_changes_nothing() {
        let config = DoubtConfig::default();
        let mut log = EventLog::discard();
        // Gate is strict: a draw equal to the probability fails.
        let mut rng = FixedRandom::new(0.10);
        let mut a = agent("Ash", 0.0);

        let mut ctx = RuleContext::new(3, &mut rng, &mut log);
        assert!(!evaluate(&mut a, &config, &mut ctx));
        assert!(a.goals().is_empty());
        assert_eq!(log.recorded_count(), 0);
    }

    #[test]
    fn crisis_tick_evaluates_everyone_once() {
        let config = DoubtConfig::default();
        let mut log = EventLog::discard();
        let mut agents = vec![agent("Ash", 1.0), agent("Birch", 0.5), agent("Cedar", 0.0)];
        let mut rng = SequenceRandom::new(vec![0.5, 0.01, 0.99]);

        let mut ctx = RuleContext::new(600, &mut rng, &mut log);
        let doubted = evaluate_all(&mut agents, &config, &mut ctx);

        assert_eq!(rng.draws(), 3);
        assert_eq!(doubted, 1);
        assert_eq!(agents.get(1).unwrap().goals().len(), 1);
        assert!(agents.first().unwrap().goals().is_empty());
        assert!(agents.get(2).unwrap().goals().is_empty());
    }

    #[test]
    fn reversal_goals_accumulate() {
        let config = DoubtConfig::default();
        let mut log = EventLog::discard();
        let mut rng = FixedRandom::new(0.0);
        let mut a = agent("Ash", 0.1);

        for tick in 1..=3 {
            let mut ctx = RuleContext::new(tick, &mut rng, &mut log);
            evaluate(&mut a, &config, &mut ctx);
        }
        assert_eq!(a.goals().len(), 3);
        assert_eq!(log.recorded_count(), 3);
    }
}
