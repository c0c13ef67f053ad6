//! Error types for event sinks.

/// Errors a sink can report when writing or flushing events.
///
/// These never reach the simulation driver through `advance`: the
/// [`EventLog`](crate::EventLog) swallows them after its fallback.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Writing to the underlying file or stream failed.
    #[error("event sink I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The event could not be serialized.
    #[error("event serialization failed: {source}")]
    Serialization {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// A shared in-memory buffer was poisoned by a panicking writer.
    #[error("event buffer lock poisoned")]
    Poisoned,
}
