//! Temporary goal countdown and expiry.
//!
//! Once per tick, after every rule has run, each temporary goal loses one
//! tick of budget and goals with nothing left are removed. A goal is not
//! counted down on the tick it was issued, so a goal issued at tick `T`
//! with a budget of `D` is present through tick `T + D - 1` and gone at
//! the end of tick `T + D`. Permanent goals are never touched.

use somnium_events::EventLog;
use somnium_types::{Agent, EventType, Goal};
use tracing::trace;

/// A temporary goal removed from an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredGoal {
    /// The agent the goal belonged to.
    pub agent: String,
    /// The goal as it was when removed.
    pub goal: Goal,
}

/// Count down one agent's temporary goals and remove exhausted ones.
///
/// Returns the removed goals in queue order. Surviving goals keep their
/// relative order.
pub fn expire(agent: &mut Agent, tick: u64) -> Vec<Goal> {
    let queue = core::mem::take(agent.goals_mut());
    let mut kept = Vec::with_capacity(queue.len());
    let mut expired = Vec::new();

    for mut goal in queue {
        let Some(remaining) = goal.remaining_ticks else {
            kept.push(goal);
            continue;
        };
        let remaining = if goal.issued_at < tick {
            remaining.saturating_sub(1)
        } else {
            remaining
        };
        goal.remaining_ticks = Some(remaining);
        if remaining == 0 {
            expired.push(goal);
        } else {
            kept.push(goal);
        }
    }

    *agent.goals_mut() = kept;
    expired
}

/// Run expiry across every agent, recording a `dream_faded` event per
/// removed goal.
pub fn expire_all(agents: &mut [Agent], tick: u64, log: &mut EventLog) -> Vec<ExpiredGoal> {
    let mut removed = Vec::new();

    for agent in agents.iter_mut() {
        for goal in expire(agent, tick) {
            trace!(tick, agent = agent.name(), issued_at = goal.issued_at, "temporary goal expired");
            log.record(
                tick,
                EventType::DreamFaded,
                Some(agent.name()),
                Some(serde_json::json!({
                    "kind": goal.kind.as_str(),
                    "payload": goal.payload,
                    "issued_at": goal.issued_at,
                })),
            );
            removed.push(ExpiredGoal {
                agent: agent.name().to_owned(),
                goal,
            });
        }
    }

    removed
}
