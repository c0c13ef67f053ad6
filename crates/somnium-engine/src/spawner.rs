//! Initial population: configured agents and eidolons plus generated ones.
//!
//! Explicit entries from `population.agents` / `population.eidolons` are
//! placed first, in file order. Generated agents then get unique names
//! from a built-in pool, a uniformly chosen role, uniform trust, and a
//! uniform position inside the arena square. Generated eidolons get a
//! uniform position only.

use rand::Rng;
use somnium_core::SimulationState;
use somnium_core::config::PopulationConfig;
use somnium_types::{Agent, Eidolon, Position, Role};
use tracing::{debug, info};

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Name pool
// -----------------------------------------------------------------------

/// Built-in pool of agent names. Generated agents draw from it without
/// replacement, skipping names already taken by configured agents.
const NAME_POOL: &[&str] = &[
    "Alder", "Birch", "Cedar", "Dusk", "Ember", "Fern", "Grove", "Haze",
    "Iris", "Juniper", "Kestrel", "Lark", "Moss", "Nettle", "Oak", "Pine",
    "Quill", "Reed", "Sage", "Thorn", "Umber", "Vale", "Wren", "Yarrow",
    "Zephyr", "Ash", "Brook", "Clay", "Dawn", "Elm", "Flint", "Gale",
    "Heath", "Ivy", "Jay", "Kale", "Lichen", "Maple", "Nyx", "Onyx",
    "Pebble", "Quartz", "Raven", "Sable", "Terra", "Urchin", "Vole",
    "Willow", "Xylem", "Yew",
];

/// What the spawner placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnSummary {
    /// Agents from the config file.
    pub configured_agents: usize,
    /// Agents generated from the name pool.
    pub generated_agents: usize,
    /// Eidolons placed (configured and generated).
    pub eidolons: usize,
}

/// Populate `state` from the population config.
///
/// # Errors
///
/// Returns [`EngineError::Population`] if a configured agent is rejected
/// (duplicate name, unknown role), or [`EngineError::Spawner`] if the name
/// pool cannot supply enough unused names.
pub fn populate<R: Rng>(
    state: &mut SimulationState,
    config: &PopulationConfig,
    rng: &mut R,
) -> Result<SpawnSummary, EngineError> {
    let mut summary = SpawnSummary::default();

    for spec in &config.agents {
        let agent = Agent::new(
            spec.name.as_str(),
            Role::new(spec.role.as_str()),
            spec.trust,
            spec.position,
        );
        state.add_agent(agent)?;
        summary.configured_agents = summary.configured_agents.saturating_add(1);
    }

    let names = pick_unique_names(rng, config.seed_agents, |name| state.agent(name).is_some())?;
    for name in names {
        let role = random_role(state, rng)?;
        let trust = rng.random::<f64>();
        let position = random_position(rng, config.arena_size);
        debug!(name = %name, role = %role, trust, "spawning agent");
        state.add_agent(Agent::new(name, role, trust, position))?;
        summary.generated_agents = summary.generated_agents.saturating_add(1);
    }

    let generated = (0..config.seed_eidolons).map(|_| random_position(rng, config.arena_size));
    let positions: Vec<Position> = config
        .eidolons
        .iter()
        .map(|spec| spec.position)
        .chain(generated)
        .collect();
    for position in positions {
        let id = state.place_eidolon(Eidolon::new(position))?;
        debug!(eidolon = %id, x = position.x, y = position.y, z = position.z, "eidolon placed");
        summary.eidolons = summary.eidolons.saturating_add(1);
    }

    info!(
        configured_agents = summary.configured_agents,
        generated_agents = summary.generated_agents,
        eidolons = summary.eidolons,
        "Population spawned"
    );
    Ok(summary)
}

/// Pick `count` distinct names from the pool that `taken` rejects.
fn pick_unique_names<R: Rng>(
    rng: &mut R,
    count: u32,
    taken: impl Fn(&str) -> bool,
) -> Result<Vec<String>, EngineError> {
    let count_usize = usize::try_from(count).map_err(|_conversion_err| EngineError::Spawner {
        message: format!("seed count {count} exceeds usize range"),
    })?;

    let mut available: Vec<&str> = NAME_POOL.iter().copied().filter(|n| !taken(n)).collect();
    if count_usize > available.len() {
        return Err(EngineError::Spawner {
            message: format!(
                "requested {count} generated agents but only {} unused names remain",
                available.len()
            ),
        });
    }

    // Fisher-Yates partial shuffle over the first `count` slots.
    let pool_len = available.len();
    for i in 0..count_usize {
        let j = rng.random_range(i..pool_len);
        available.swap(i, j);
    }

    Ok(available
        .into_iter()
        .take(count_usize)
        .map(str::to_owned)
        .collect())
}

fn random_role<R: Rng>(state: &SimulationState, rng: &mut R) -> Result<Role, EngineError> {
    let roles = state.roles();
    let index = rng.random_range(0..roles.len().max(1));
    roles.get(index).cloned().ok_or_else(|| EngineError::Spawner {
        message: "role set is empty".to_owned(),
    })
}

/// A uniform point in the square of side `arena_size` centred on the origin.
fn random_position<R: Rng>(rng: &mut R, arena_size: f64) -> Position {
    let half = arena_size / 2.0;
    if !half.is_finite() || half <= 0.0 {
        return Position::default();
    }
    Position::planar(rng.random_range(-half..=half), rng.random_range(-half..=half))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use somnium_core::config::{AgentSpec, EidolonSpec};

    use super::*;

    fn empty_state() -> SimulationState {
        SimulationState::builder().seed(1).build().unwrap()
    }

    #[test]
    fn spawns_requested_counts() {
        let mut state = empty_state();
        let config = PopulationConfig {
            seed_agents: 20,
            seed_eidolons: 3,
            ..PopulationConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(42);

        let summary = populate(&mut state, &config, &mut rng).unwrap();

        assert_eq!(summary.generated_agents, 20);
        assert_eq!(summary.eidolons, 3);
        assert_eq!(state.agents().len(), 20);
        assert_eq!(state.eidolons().len(), 3);

        let names: BTreeSet<&str> = state.agents().iter().map(Agent::name).collect();
        assert_eq!(names.len(), 20, "all names must be unique");
    }

    #[test]
    fn generated_agents_stay_in_arena() {
        let mut state = empty_state();
        let config = PopulationConfig {
            seed_agents: 30,
            seed_eidolons: 5,
            arena_size: 10.0,
            ..PopulationConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(7);
        populate(&mut state, &config, &mut rng).unwrap();

        for agent in state.agents() {
            let p = agent.position();
            assert!(p.x.abs() <= 5.0 && p.y.abs() <= 5.0);
            assert!((0.0..=1.0).contains(&agent.trust()));
            assert!(state.roles().contains(agent.role()));
        }
        for eidolon in state.eidolons().values() {
            assert!(eidolon.position.x.abs() <= 5.0 && eidolon.position.y.abs() <= 5.0);
        }
    }

    #[test]
    fn configured_entries_come_first_and_names_are_not_reused() {
        let mut state = empty_state();
        let config = PopulationConfig {
            seed_agents: 49,
            seed_eidolons: 0,
            agents: vec![AgentSpec {
                name: "Moss".to_owned(),
                role: "oracle".to_owned(),
                trust: 0.1,
                position: Position::planar(1.0, 1.0),
            }],
            eidolons: vec![EidolonSpec {
                position: Position::planar(2.0, 2.0),
            }],
            ..PopulationConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(3);

        let summary = populate(&mut state, &config, &mut rng).unwrap();

        assert_eq!(summary.configured_agents, 1);
        assert_eq!(summary.generated_agents, 49);
        assert_eq!(state.agents().first().unwrap().name(), "Moss");
        assert_eq!(state.agents().iter().filter(|a| a.name() == "Moss").count(), 1);
        let first = state.eidolons().values().next().unwrap();
        assert_eq!(first.position, Position::planar(2.0, 2.0));
    }

    #[test]
    fn too_many_agents_is_an_error() {
        let mut state = empty_state();
        let config = PopulationConfig {
            seed_agents: 51,
            ..PopulationConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let result = populate(&mut state, &config, &mut rng);
        assert!(matches!(result, Err(EngineError::Spawner { .. })));
    }

    #[test]
    fn configured_agent_with_unknown_role_is_rejected() {
        let mut state = empty_state();
        let config = PopulationConfig {
            seed_agents: 0,
            agents: vec![AgentSpec {
                name: "Moss".to_owned(),
                role: "jester".to_owned(),
                trust: 0.5,
                position: Position::default(),
            }],
            ..PopulationConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let result = populate(&mut state, &config, &mut rng);
        assert!(matches!(result, Err(EngineError::Population { .. })));
    }

    #[test]
    fn degenerate_arena_places_at_origin() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(random_position(&mut rng, 0.0), Position::default());
        assert_eq!(random_position(&mut rng, f64::NAN), Position::default());
    }
}
