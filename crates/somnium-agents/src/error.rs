//! Error types for the somnium-agents crate.
//!
//! Configuration problems (empty role set, empty fragment pool, bad
//! thresholds) surface once, at construction time. Population mistakes
//! made by the driver (duplicate names, unknown roles) surface from the
//! call that made them. The rules themselves never fail.

use somnium_types::{EidolonId, Role};

/// Errors that can occur while configuring rules or managing agents.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The configured role set has no roles.
    #[error("role set must contain at least one role")]
    EmptyRoleSet,

    /// A role appears more than once in the role set.
    #[error("duplicate role in role set: {0}")]
    DuplicateRole(Role),

    /// The configured dream fragment pool has no fragments.
    #[error("dream fragment pool must contain at least one fragment")]
    EmptyFragmentPool,

    /// A rule threshold or probability is out of range.
    #[error("invalid rule configuration: {reason}")]
    InvalidRuleConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },

    /// Agent names must be non-empty.
    #[error("agent name must not be empty")]
    EmptyName,

    /// Agent name already exists in the population.
    #[error("duplicate agent name: {0}")]
    DuplicateName(String),

    /// No agent with the given name exists.
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// No eidolon with the given id exists.
    #[error("eidolon not found: {0}")]
    EidolonNotFound(EidolonId),

    /// Every eidolon id has been handed out.
    #[error("eidolon ids exhausted")]
    EidolonIdsExhausted,

    /// The agent's role is not part of the configured role set.
    #[error("agent {agent} has role {role}, which is not in the role set")]
    UnknownRole {
        /// The offending agent's name.
        agent: String,
        /// The role that was not recognized.
        role: Role,
    },
}
