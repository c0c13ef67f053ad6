//! Core entity structs: agents, goals, eidolons, positions, and events.
//!
//! These are passive data holders. The only logic they carry is the
//! trust clamp (trust never leaves `[0, 1]`) and small constructors that
//! keep goal shapes consistent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{EventType, GoalKind};
use crate::ids::EventId;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A point in the shared agent/eidolon coordinate space.
///
/// Two-dimensional drivers leave `z` at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate (0 for planar simulations).
    #[serde(default)]
    pub z: f64,
}

impl Position {
    /// A point in three dimensions.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// A point on the `z = 0` plane.
    pub const fn planar(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dz.mul_add(dz, dx.mul_add(dx, dy * dy)).sqrt()
    }

    /// Whether `other` lies within `radius` of this point (inclusive).
    pub fn is_within(&self, other: &Self, radius: f64) -> bool {
        self.distance_to(other) <= radius
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// An agent role such as `scout`, `guardian`, or `oracle`.
///
/// The set of legal roles is supplied at configuration time (see
/// `somnium_agents::RoleSet`); this type is just the validated name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Wrap a role name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The role name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// ---------------------------------------------------------------------------
// Goal
// ---------------------------------------------------------------------------

/// A unit of intent queued on an agent.
///
/// Permanent goals have `remaining_ticks == None`. Temporary goals carry a
/// tick budget that the scheduler counts down once per tick, starting on
/// the tick *after* `issued_at`, and are removed when it reaches zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// What kind of goal this is.
    pub kind: GoalKind,
    /// Rule-specific payload, opaque to the core (e.g. a dream fragment).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Remaining tick budget for temporary goals; `None` = permanent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_ticks: Option<u32>,
    /// The tick on which the goal was queued.
    pub issued_at: u64,
}

impl Goal {
    /// A permanent goal of the given kind with no payload.
    pub const fn permanent(kind: GoalKind, issued_at: u64) -> Self {
        Self {
            kind,
            payload: None,
            remaining_ticks: None,
            issued_at,
        }
    }

    /// The permanent role-reversal goal queued by the doubt rule.
    pub const fn reverse_role(issued_at: u64) -> Self {
        Self::permanent(GoalKind::ReverseRole, issued_at)
    }

    /// A temporary goal carrying `payload` that lasts `ticks` ticks.
    pub fn temporary(payload: impl Into<String>, ticks: u32, issued_at: u64) -> Self {
        Self {
            kind: GoalKind::Temp,
            payload: Some(payload.into()),
            remaining_ticks: Some(ticks),
            issued_at,
        }
    }

    /// Whether this goal has a tick budget.
    pub const fn is_temporary(&self) -> bool {
        self.remaining_ticks.is_some()
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Clamp a trust value into `[0, 1]`.
///
/// `NaN` carries no information about trust and maps to `0.0`.
pub fn clamp_trust(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A simulated agent.
///
/// The name is the agent's identity and never changes. Trust is kept in
/// `[0, 1]` by every write path, deserialization included; there is no
/// way to store an unclamped value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AgentRecord")]
pub struct Agent {
    name: String,
    trust: f64,
    role: Role,
    goals: Vec<Goal>,
    position: Position,
}

/// Wire shape of an [`Agent`]; converted through the trust clamp.
#[derive(Deserialize)]
struct AgentRecord {
    name: String,
    trust: f64,
    role: Role,
    #[serde(default)]
    goals: Vec<Goal>,
    #[serde(default)]
    position: Position,
}

impl From<AgentRecord> for Agent {
    fn from(record: AgentRecord) -> Self {
        Self {
            name: record.name,
            trust: clamp_trust(record.trust),
            role: record.role,
            goals: record.goals,
            position: record.position,
        }
    }
}

impl Agent {
    /// Create an agent with an empty goal queue.
    ///
    /// `trust` is clamped into `[0, 1]` (see [`clamp_trust`]).
    pub fn new(name: impl Into<String>, role: Role, trust: f64, position: Position) -> Self {
        Self {
            name: name.into(),
            trust: clamp_trust(trust),
            role,
            goals: Vec::new(),
            position,
        }
    }

    /// The agent's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current trust in `[0, 1]`.
    pub const fn trust(&self) -> f64 {
        self.trust
    }

    /// Overwrite trust, clamping into `[0, 1]`. `NaN` leaves trust unchanged.
    pub fn set_trust(&mut self, trust: f64) {
        if !trust.is_nan() {
            self.trust = clamp_trust(trust);
        }
    }

    /// Current role.
    pub const fn role(&self) -> &Role {
        &self.role
    }

    /// Replace the role, returning the previous one.
    pub fn set_role(&mut self, role: Role) -> Role {
        core::mem::replace(&mut self.role, role)
    }

    /// Goals in priority order (oldest first).
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Mutable access to the goal queue.
    pub const fn goals_mut(&mut self) -> &mut Vec<Goal> {
        &mut self.goals
    }

    /// Append a goal at the lowest priority.
    pub fn push_goal(&mut self, goal: Goal) {
        self.goals.push(goal);
    }

    /// Current position.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Move the agent.
    pub const fn set_position(&mut self, position: Position) {
        self.position = position;
    }
}

// ---------------------------------------------------------------------------
// Eidolon
// ---------------------------------------------------------------------------

/// A non-agent influence source that injects dreams into nearby agents.
///
/// Eidolons have a position and nothing else: they are never the target
/// of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Eidolon {
    /// Where the eidolon sits.
    pub position: Position,
}

impl Eidolon {
    /// Create an eidolon at `position`.
    pub const fn new(position: Position) -> Self {
        Self { position }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// An immutable record of a state change.
///
/// Events are written once, in emission order, and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: EventId,
    /// Zero-based position of this event in its log.
    pub sequence: u64,
    /// The tick during which the event was emitted.
    pub tick: u64,
    /// The category of event.
    pub event_type: EventType,
    /// The agent involved, or `None` for population-wide events.
    pub agent: Option<String>,
    /// Free-form, type-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
}
