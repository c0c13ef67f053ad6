//! Identifier types.
//!
//! Events and simulation runs carry UUID v7 identifiers (time-ordered, so
//! a JSONL log sorted by id is also sorted by emission). Eidolons are
//! placed and removed by the driver at runtime and get small sequential
//! identifiers instead, which read better in event details.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an event in the event log.
    EventId
}

define_id! {
    /// Unique identifier for one simulation run (one `SimulationState`).
    RunId
}

/// Identifier for an eidolon placed into a simulation.
///
/// Assigned sequentially by the simulation state on placement and never
/// reused within a run, even after the eidolon is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EidolonId(pub u32);

impl EidolonId {
    /// Return the raw sequential value.
    pub const fn into_inner(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for EidolonId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "eidolon-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_distinct() {
        let a = EventId::new();
        let b = EventId::new();
        assert_ne!(a, b);
        assert_ne!(RunId::new().into_inner(), Uuid::nil());
    }

    #[test]
    fn event_id_serializes_as_bare_uuid() {
        let id = EventId::new();
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json, Some(format!("\"{}\"", id.into_inner())));
    }

    #[test]
    fn eidolon_id_display() {
        assert_eq!(EidolonId(7).to_string(), "eidolon-7");
    }
}
