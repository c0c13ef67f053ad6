//! Event sinks: where recorded events go.
//!
//! A sink receives fully stamped [`Event`]s from the
//! [`EventLog`](crate::EventLog). Sinks only ever append; none of them
//! offers a way to modify or remove a written event.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use somnium_types::{Event, EventType};
use tracing::{info, warn};

use crate::error::SinkError;

/// Destination for recorded events.
///
/// Implementations must be `Send` so a simulation can be moved onto a
/// worker thread or async task together with its log.
pub trait EventSink: Send {
    /// Append one event.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the event could not be written. The
    /// caller decides what to do with the failure; the event log falls
    /// back to a tracing warning.
    fn write(&mut self, event: &Event) -> Result<(), SinkError>;

    /// Flush any buffered events.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the flush fails.
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn write(&mut self, event: &Event) -> Result<(), SinkError> {
        (**self).write(event)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

// ---------------------------------------------------------------------------
// NullSink
// ---------------------------------------------------------------------------

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn write(&mut self, _event: &Event) -> Result<(), SinkError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Keeps events in a shared in-memory buffer.
///
/// The sink is moved into the event log; keep the [`EventBuffer`] from
/// [`MemorySink::buffer`] to read what was recorded.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// A read handle onto this sink's buffer.
    pub fn buffer(&self) -> EventBuffer {
        EventBuffer {
            events: Arc::clone(&self.events),
        }
    }
}

impl EventSink for MemorySink {
    fn write(&mut self, event: &Event) -> Result<(), SinkError> {
        let mut events = self.events.lock().map_err(|_poisoned| SinkError::Poisoned)?;
        events.push(event.clone());
        Ok(())
    }
}

/// Read-only view of the events captured by a [`MemorySink`].
#[derive(Debug, Clone)]
pub struct EventBuffer {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventBuffer {
    /// A copy of every event recorded so far, in emission order.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events of one type, in emission order.
    pub fn of_type(&self, event_type: EventType) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| event.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Events emitted during `tick`, in emission order.
    pub fn for_tick(&self, tick: u64) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| event.tick == tick)
            .cloned()
            .collect()
    }

    /// Number of events recorded so far.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// JsonlSink
// ---------------------------------------------------------------------------

/// Appends events to a JSON Lines file, one event per line.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl JsonlSink {
    /// Open `path` for appending, creating it if needed.
    ///
    /// Existing lines are kept; new events go after them.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Io`] if the file cannot be opened.
    pub fn append(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Open `path`, discarding any previous contents.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Io`] if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// The file this sink writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of events written through this sink.
    pub const fn written(&self) -> u64 {
        self.written
    }
}

impl EventSink for JsonlSink {
    fn write(&mut self, event: &Event) -> Result<(), SinkError> {
        let line = serde_json::to_string(event)?;
        writeln!(self.writer, "{line}")?;
        self.written = self.written.saturating_add(1);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for JsonlSink {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!(path = %self.path.display(), error = %e, "failed to flush event log on drop");
        }
    }
}

// ---------------------------------------------------------------------------
// TracingSink
// ---------------------------------------------------------------------------

/// Emits every event as a structured `tracing` record at INFO level
/// under the `somnium::events` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn write(&mut self, event: &Event) -> Result<(), SinkError> {
        let detail = event
            .detail
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        info!(
            target: "somnium::events",
            sequence = event.sequence,
            tick = event.tick,
            event_type = %event.event_type,
            agent = event.agent.as_deref().unwrap_or("-"),
            detail = %detail,
            "event"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MultiSink
// ---------------------------------------------------------------------------

/// Fans each event out to several sinks.
///
/// Every sink sees every event even if an earlier one fails; the first
/// error is reported after all sinks have been tried.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl MultiSink {
    /// Create a fan-out with no sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink to the fan-out.
    #[must_use]
    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Number of sinks in the fan-out.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether the fan-out has no sinks.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl core::fmt::Debug for MultiSink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MultiSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl EventSink for MultiSink {
    fn write(&mut self, event: &Event) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.write(event) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.flush() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::BufRead;

    use chrono::Utc;
    use somnium_types::EventId;

    use super::*;

    fn make_event(sequence: u64, event_type: EventType) -> Event {
        Event {
            id: EventId::new(),
            sequence,
            tick: 3,
            event_type,
            agent: Some("Wren".to_owned()),
            detail: Some(serde_json::json!("Wren")),
            timestamp: Utc::now(),
        }
    }

    struct BrokenSink;

    impl EventSink for BrokenSink {
        fn write(&mut self, _event: &Event) -> Result<(), SinkError> {
            Err(SinkError::Poisoned)
        }
    }

    #[test]
    fn memory_sink_shares_buffer() {
        let mut sink = MemorySink::new();
        let buffer = sink.buffer();
        assert!(buffer.is_empty());

        sink.write(&make_event(0, EventType::AgentDoubt)).unwrap();
        sink.write(&make_event(1, EventType::RoleMutation)).unwrap();

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.of_type(EventType::RoleMutation).len(), 1);
        assert_eq!(buffer.for_tick(3).len(), 2);
        assert!(buffer.for_tick(4).is_empty());
    }

    #[test]
    fn jsonl_sink_writes_one_line_per_event() {
        let path = std::env::temp_dir().join(format!("somnium-sink-{}.jsonl", EventId::new()));
        {
            let mut sink = JsonlSink::create(&path).unwrap();
            sink.write(&make_event(0, EventType::AgentDoubt)).unwrap();
            sink.write(&make_event(1, EventType::DreamInjection)).unwrap();
            sink.flush().unwrap();
            assert_eq!(sink.written(), 2);
        }

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .map(Result::unwrap)
            .collect();
        assert_eq!(lines.len(), 2);

        let parsed: Event = serde_json::from_str(lines.first().unwrap()).unwrap();
        assert_eq!(parsed.event_type, EventType::AgentDoubt);
        assert_eq!(parsed.agent.as_deref(), Some("Wren"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn jsonl_append_keeps_existing_lines() {
        let path = std::env::temp_dir().join(format!("somnium-append-{}.jsonl", EventId::new()));
        {
            let mut sink = JsonlSink::create(&path).unwrap();
            sink.write(&make_event(0, EventType::AgentDoubt)).unwrap();
        }
        {
            let mut sink = JsonlSink::append(&path).unwrap();
            sink.write(&make_event(1, EventType::DreamFaded)).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn multi_sink_reaches_every_sink_despite_failure() {
        let memory = MemorySink::new();
        let buffer = memory.buffer();
        let mut multi = MultiSink::new().with(BrokenSink).with(memory);
        assert_eq!(multi.len(), 2);

        let result = multi.write(&make_event(0, EventType::AgentDoubt));
        assert!(matches!(result, Err(SinkError::Poisoned)));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn tracing_and_null_sinks_accept_events() {
        let event = make_event(0, EventType::AgentDoubt);
        assert!(TracingSink.write(&event).is_ok());
        assert!(NullSink.write(&event).is_ok());
    }
}
