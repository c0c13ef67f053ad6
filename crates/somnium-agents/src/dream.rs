//! Dream injection rule.
//!
//! Each eidolon reaches every agent within its radius (distance `<=`
//! radius). Every agent in range takes one draw; on success it gets a
//! temporary goal carrying a fragment from the pool and a
//! `dream_injection` event is recorded. An agent near several eidolons is
//! evaluated once per eidolon.

use somnium_types::{Agent, Eidolon, EidolonId, EventType, Goal};
use tracing::debug;

use crate::config::{DreamConfig, FragmentPool};
use crate::context::RuleContext;

/// Run one eidolon's influence over `agents`. Returns how many dreams
/// were injected.
pub fn evaluate(
    eidolon_id: EidolonId,
    eidolon: &Eidolon,
    agents: &mut [Agent],
    config: &DreamConfig,
    fragments: &FragmentPool,
    ctx: &mut RuleContext<'_>,
) -> usize {
    let mut injected = 0_usize;

    for agent in agents.iter_mut() {
        if !eidolon.position.is_within(&agent.position(), config.radius) {
            continue;
        }
        if !ctx.roll(config.probability) {
            continue;
        }
        let Some(fragment) = ctx
            .rng
            .pick_index(fragments.len())
            .and_then(|i| fragments.get(i))
        else {
            continue;
        };

        agent.push_goal(Goal::temporary(fragment, config.duration_ticks, ctx.tick));
        debug!(
            tick = ctx.tick,
            agent = agent.name(),
            eidolon = %eidolon_id,
            fragment,
            "dream injected"
        );
        ctx.log.record(
            ctx.tick,
            EventType::DreamInjection,
            Some(agent.name()),
            Some(serde_json::json!({
                "fragment": fragment,
                "eidolon": eidolon_id.to_string(),
            })),
        );
        injected = injected.saturating_add(1);
    }

    injected
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use somnium_events::{EventLog, MemorySink};
    use somnium_types::{GoalKind, Position, Role};

    use super::*;
    use crate::random::{FixedRandom, SequenceRandom};

    fn agent_at(name: &str, x: f64) -> Agent {
        Agent::new(name, Role::from("scout"), 0.9, Position::planar(x, 0.0))
    }

    fn pool() -> FragmentPool {
        FragmentPool::new(vec!["falling".to_owned(), "a red door".to_owned()]).unwrap()
    }

    #[test]
    fn only_agents_in_range_draw() {
        let config = DreamConfig::default();
        let mut agents = vec![agent_at("Near", 3.0), agent_at("Edge", 10.0), agent_at("Far", 10.5)];
        let mut rng = SequenceRandom::new(vec![0.5]);
        let mut log = EventLog::discard();

        let mut ctx = RuleContext::new(1, &mut rng, &mut log);
        let injected = evaluate(
            EidolonId(0),
            &Eidolon::default(),
            &mut agents,
            &config,
            &pool(),
            &mut ctx,
        );

        assert_eq!(injected, 0);
        assert_eq!(rng.draws(), 2, "Near and Edge are in range, Far is not");
    }

    #[test]
    fn successful_draw_injects_temporary_goal() {
        let config = DreamConfig::default();
        let sink = MemorySink::new();
        let buffer = sink.buffer();
        let mut log = EventLog::new(sink);
        let mut rng = FixedRandom::new(0.1).with_index(1);
        let mut agents = vec![agent_at("Edge", 10.0)];

        let mut ctx = RuleContext::new(42, &mut rng, &mut log);
        let injected = evaluate(
            EidolonId(4),
            &Eidolon::default(),
            &mut agents,
            &config,
            &pool(),
            &mut ctx,
        );

        assert_eq!(injected, 1);
        let goal = agents.first().unwrap().goals().first().unwrap().clone();
        assert_eq!(goal.kind, GoalKind::Temp);
        assert_eq!(goal.payload.as_deref(), Some("a red door"));
        assert_eq!(goal.remaining_ticks, Some(180));
        assert_eq!(goal.issued_at, 42);

        let event = buffer.events().first().unwrap().clone();
        assert_eq!(event.event_type, EventType::DreamInjection);
        assert_eq!(event.agent.as_deref(), Some("Edge"));
        let detail = event.detail.unwrap();
        assert_eq!(detail["fragment"], "a red door");
        assert_eq!(detail["eidolon"], "eidolon-4");
    }

    #[test]
    fn draw_at_probability_fails() {
        let config = DreamConfig::default();
        let mut agents = vec![agent_at("Near", 1.0)];
        let mut rng = FixedRandom::new(0.15);
        let mut log = EventLog::discard();

        let mut ctx = RuleContext::new(1, &mut rng, &mut log);
        let injected = evaluate(
            EidolonId(0),
            &Eidolon::default(),
            &mut agents,
            &config,
            &pool(),
            &mut ctx,
        );

        assert_eq!(injected, 0);
        assert!(agents.first().unwrap().goals().is_empty());
    }
}
