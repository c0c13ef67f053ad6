//! The agent population.
//!
//! [`Population`] owns every agent in a contiguous arena, in insertion
//! order, with a name index on the side. Rules work on the arena as a
//! slice; the driver looks agents up by name.

use std::collections::BTreeMap;

use somnium_types::Agent;

use crate::config::RoleSet;
use crate::error::AgentError;

/// Owns all agents and enforces name uniqueness.
#[derive(Debug, Clone, Default)]
pub struct Population {
    agents: Vec<Agent>,
    by_name: BTreeMap<String, usize>,
}

impl Population {
    /// An empty population.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent at the end of the arena.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::EmptyName`] for an empty name,
    /// [`AgentError::DuplicateName`] if the name is taken, or
    /// [`AgentError::UnknownRole`] if the agent's role is not in `roles`.
    pub fn insert(&mut self, agent: Agent, roles: &RoleSet) -> Result<usize, AgentError> {
        if agent.name().is_empty() {
            return Err(AgentError::EmptyName);
        }
        if self.by_name.contains_key(agent.name()) {
            return Err(AgentError::DuplicateName(agent.name().to_owned()));
        }
        if !roles.contains(agent.role()) {
            return Err(AgentError::UnknownRole {
                agent: agent.name().to_owned(),
                role: agent.role().clone(),
            });
        }

        let index = self.agents.len();
        self.by_name.insert(agent.name().to_owned(), index);
        self.agents.push(agent);
        Ok(index)
    }

    /// Remove an agent by name, returning it.
    ///
    /// Later agents shift down one slot, so arena order stays insertion
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if no agent has that name.
    pub fn remove(&mut self, name: &str) -> Result<Agent, AgentError> {
        let index = self
            .by_name
            .remove(name)
            .ok_or_else(|| AgentError::AgentNotFound(name.to_owned()))?;
        let agent = self.agents.remove(index);
        for slot in self.by_name.values_mut() {
            if *slot > index {
                *slot = slot.saturating_sub(1);
            }
        }
        Ok(agent)
    }

    /// Look up an agent by name.
    pub fn get(&self, name: &str) -> Option<&Agent> {
        self.by_name.get(name).and_then(|&i| self.agents.get(i))
    }

    /// Look up an agent by name for mutation.
    ///
    /// The agent's name cannot change through this reference, so the
    /// index stays valid.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Agent> {
        let index = *self.by_name.get(name)?;
        self.agents.get_mut(index)
    }

    /// Look up an agent by name or fail.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if no agent has that name.
    pub fn require_mut(&mut self, name: &str) -> Result<&mut Agent, AgentError> {
        self.get_mut(name)
            .ok_or_else(|| AgentError::AgentNotFound(name.to_owned()))
    }

    /// Whether an agent with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All agents in insertion order.
    pub fn as_slice(&self) -> &[Agent] {
        &self.agents
    }

    /// All agents in insertion order, mutable.
    pub fn as_mut_slice(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    /// Iterate agents in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the population is empty.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
