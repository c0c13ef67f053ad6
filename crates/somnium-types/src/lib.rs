//! Shared type definitions for the Somnium behavior-mutation engine.
//!
//! This crate is the single source of truth for the passive data model:
//! agents, goals, eidolons, positions, and the events the engine emits.
//! Nothing here carries behavior beyond invariant-preserving setters; the
//! rules that mutate agents live in `somnium-agents`.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier types for events, runs, and eidolons
//! - [`enums`] -- Event and goal kind enumerations
//! - [`structs`] -- Agents, goals, eidolons, positions, and events

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EventType, GoalKind};
pub use ids::{EidolonId, EventId, RunId};
pub use structs::{Agent, Eidolon, Event, Goal, Position, Role, clamp_trust};
