//! Enumeration types for the Somnium engine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A type of event recorded in the event log.
///
/// Serialized as the `snake_case` tag (`agent_doubt`, `dream_injection`,
/// ...), which is also what [`EventType::as_str`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// An agent began to doubt its role and queued a role reversal.
    AgentDoubt,
    /// An eidolon injected a dream fragment as a temporary goal.
    DreamInjection,
    /// High entropy forced an agent into a different role.
    RoleMutation,
    /// A temporary goal ran out of ticks and was removed.
    DreamFaded,
}

impl EventType {
    /// Every event type, in rule order.
    pub const ALL: [Self; 4] = [
        Self::AgentDoubt,
        Self::DreamInjection,
        Self::RoleMutation,
        Self::DreamFaded,
    ];

    /// The wire tag for this event type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AgentDoubt => "agent_doubt",
            Self::DreamInjection => "dream_injection",
            Self::RoleMutation => "role_mutation",
            Self::DreamFaded => "dream_faded",
        }
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Goal kinds
// ---------------------------------------------------------------------------

/// The kind of a goal queued on an agent.
///
/// `ReverseRole` and `Temp` are produced by the engine's rules. Drivers
/// may queue their own permanent goals with [`GoalKind::Custom`]; the core
/// treats those as opaque and never removes them.
///
/// Serialized as a plain string: `reverse_role`, `temp`, or the custom
/// tag verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GoalKind {
    /// Reverse the agent's current role (queued by the doubt rule).
    ReverseRole,
    /// A temporary, dream-injected goal with a tick budget.
    Temp,
    /// A driver-defined permanent goal kind.
    Custom(String),
}

impl GoalKind {
    /// The string tag for this goal kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ReverseRole => "reverse_role",
            Self::Temp => "temp",
            Self::Custom(tag) => tag,
        }
    }
}

impl From<String> for GoalKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "reverse_role" => Self::ReverseRole,
            "temp" => Self::Temp,
            _ => Self::Custom(tag),
        }
    }
}

impl From<&str> for GoalKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_owned())
    }
}

impl From<GoalKind> for String {
    fn from(kind: GoalKind) -> Self {
        match kind {
            GoalKind::ReverseRole => "reverse_role".to_owned(),
            GoalKind::Temp => "temp".to_owned(),
            GoalKind::Custom(tag) => tag,
        }
    }
}

impl core::fmt::Display for GoalKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_serializes_snake_case() {
        let json = serde_json::to_string(&EventType::DreamInjection).ok();
        assert_eq!(json.as_deref(), Some("\"dream_injection\""));
        for ty in EventType::ALL {
            let json = serde_json::to_string(&ty).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", ty.as_str()));
        }
    }

    #[test]
    fn goal_kind_string_forms() {
        assert_eq!(GoalKind::from("reverse_role"), GoalKind::ReverseRole);
        assert_eq!(GoalKind::from("temp"), GoalKind::Temp);
        assert_eq!(
            GoalKind::from("guard_the_gate"),
            GoalKind::Custom("guard_the_gate".to_owned())
        );
        let json = serde_json::to_string(&GoalKind::Custom("patrol".to_owned())).ok();
        assert_eq!(json.as_deref(), Some("\"patrol\""));
    }
}
