//! Event log and sinks for the Somnium engine.
//!
//! Every state change the rules make produces an immutable [`Event`]
//! appended to the [`EventLog`]. The log is write-only from the engine's
//! point of view: it stamps each event with a sequence number and a
//! timestamp and hands it to an [`EventSink`]. Where the event ends up
//! (memory, a JSON Lines file, the tracing pipeline) is the driver's
//! choice.
//!
//! Recording never fails the caller. A sink error is logged as a
//! `tracing` warning carrying the serialized event and counted; the
//! simulation carries on.
//!
//! # Modules
//!
//! - [`error`] -- [`SinkError`]
//! - [`log`] -- [`EventLog`], the stamping front end
//! - [`sink`] -- [`EventSink`] and the bundled sinks
//! - [`time`] -- [`TimeSource`] for event timestamps
//!
//! [`Event`]: somnium_types::Event

pub mod error;
pub mod log;
pub mod sink;
pub mod time;

pub use error::SinkError;
pub use log::EventLog;
pub use sink::{EventBuffer, EventSink, JsonlSink, MemorySink, MultiSink, NullSink, TracingSink};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
