//! The event log front end.
//!
//! [`EventLog::record`] is the only way rules emit events. It assigns the
//! next sequence number, captures a timestamp, and forwards the event to
//! the sink. A sink failure never propagates: the event is written to the
//! tracing pipeline as a warning instead and the drop is counted.

use somnium_types::{Event, EventId, EventType};
use tracing::warn;

use crate::sink::{EventSink, NullSink};
use crate::time::{SystemTimeSource, TimeSource};

/// Append-only event log.
pub struct EventLog {
    sink: Box<dyn EventSink>,
    clock: Box<dyn TimeSource>,
    next_sequence: u64,
    dropped: u64,
}

impl EventLog {
    /// A log writing to `sink`, stamped with wall-clock time.
    pub fn new(sink: impl EventSink + 'static) -> Self {
        Self::with_time_source(sink, SystemTimeSource)
    }

    /// A log writing to `sink`, stamped by `clock`.
    pub fn with_time_source(
        sink: impl EventSink + 'static,
        clock: impl TimeSource + 'static,
    ) -> Self {
        Self {
            sink: Box::new(sink),
            clock: Box::new(clock),
            next_sequence: 0,
            dropped: 0,
        }
    }

    /// A log that discards everything.
    pub fn discard() -> Self {
        Self::new(NullSink)
    }

    /// Append one event and return its sequence number.
    ///
    /// Never fails. If the sink rejects the event, the serialized event is
    /// emitted as a `tracing` warning and [`dropped_count`] goes up; the
    /// sequence number is still consumed so gaps in a persisted log show
    /// where writes were lost.
    ///
    /// [`dropped_count`]: Self::dropped_count
    pub fn record(
        &mut self,
        tick: u64,
        event_type: EventType,
        agent: Option<&str>,
        detail: Option<serde_json::Value>,
    ) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);

        let event = Event {
            id: EventId::new(),
            sequence,
            tick,
            event_type,
            agent: agent.map(str::to_owned),
            detail,
            timestamp: self.clock.now(),
        };

        if let Err(err) = self.sink.write(&event) {
            self.dropped = self.dropped.saturating_add(1);
            let payload = serde_json::to_string(&event).unwrap_or_else(|_err| format!("{event:?}"));
            warn!(
                error = %err,
                sequence,
                tick,
                event_type = %event_type,
                event = %payload,
                "event sink rejected event; kept in fallback log only"
            );
        }

        sequence
    }

    /// Flush the sink. Failures are logged, not returned.
    pub fn flush(&mut self) {
        if let Err(err) = self.sink.flush() {
            warn!(error = %err, "event sink flush failed");
        }
    }

    /// Number of events recorded (including dropped ones).
    pub const fn recorded_count(&self) -> u64 {
        self.next_sequence
    }

    /// Number of events the sink rejected.
    pub const fn dropped_count(&self) -> u64 {
        self.dropped
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::discard()
    }
}

impl core::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventLog")
            .field("recorded", &self.next_sequence)
            .field("dropped", &self.dropped)
            .finish_non_exhaustive()
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, TimeDelta};

    use super::*;
    use crate::error::SinkError;
    use crate::sink::MemorySink;
    use crate::time::ManualTimeSource;

    struct RejectingSink;

    impl EventSink for RejectingSink {
        fn write(&mut self, _event: &Event) -> Result<(), SinkError> {
            Err(SinkError::Io {
                source: std::io::Error::other("disk full"),
            })
        }

        fn flush(&mut self) -> Result<(), SinkError> {
            Err(SinkError::Poisoned)
        }
    }

    #[test]
    fn record_assigns_sequence_and_timestamp() {
        let sink = MemorySink::new();
        let buffer = sink.buffer();
        let mut log = EventLog::with_time_source(sink, ManualTimeSource::epoch());

        let first = log.record(1, EventType::AgentDoubt, Some("Moss"), Some(serde_json::json!("Moss")));
        let second = log.record(1, EventType::RoleMutation, None, None);

        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(log.recorded_count(), 2);

        let events = buffer.events();
        let a = events.first().unwrap();
        let b = events.get(1).unwrap();
        assert_eq!(a.agent.as_deref(), Some("Moss"));
        assert!(b.agent.is_none());
        assert_eq!(a.timestamp, DateTime::UNIX_EPOCH);
        assert_eq!(b.timestamp.signed_duration_since(a.timestamp), TimeDelta::milliseconds(1));
    }

    #[test]
    fn sink_failure_is_swallowed_and_counted() {
        let mut log = EventLog::new(RejectingSink);
        let seq = log.record(9, EventType::DreamInjection, Some("Lark"), None);
        assert_eq!(seq, 0);
        assert_eq!(log.dropped_count(), 1);
        assert_eq!(log.recorded_count(), 1);

        // Flush failure is logged, not raised.
        log.flush();
    }

    #[test]
    fn discard_log_still_counts() {
        let mut log = EventLog::discard();
        log.record(0, EventType::DreamFaded, Some("Yew"), None);
        assert_eq!(log.recorded_count(), 1);
        assert_eq!(log.dropped_count(), 0);
    }
}
