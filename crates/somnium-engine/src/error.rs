//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup and the run
//! so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: somnium_core::config::ConfigError,
    },

    /// The simulation state could not be assembled.
    #[error("build error: {source}")]
    Build {
        /// The underlying build error.
        #[from]
        source: somnium_core::tick::BuildError,
    },

    /// A configured agent or eidolon was rejected.
    #[error("population error: {source}")]
    Population {
        /// The underlying agent error.
        #[from]
        source: somnium_agents::AgentError,
    },

    /// The event log file could not be opened.
    #[error("event sink error: {source}")]
    Sink {
        /// The underlying sink error.
        #[from]
        source: somnium_events::SinkError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: somnium_core::runner::RunnerError,
    },

    /// Agent spawning failed.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },
}
