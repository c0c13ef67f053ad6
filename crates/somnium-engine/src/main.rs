//! Driver binary for the Somnium behavior-mutation engine.
//!
//! Loads configuration, populates the world, and runs the tick loop until
//! the tick limit is reached or Ctrl-C is pressed. Diagnostics go to
//! stderr through `tracing`; the event log goes to a JSON Lines file and
//! is mirrored under the `somnium::events` target.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (first CLI argument, else `somnium-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Validate rules, roles, and fragments
//! 4. Pick the run seed
//! 5. Open the event log sinks
//! 6. Build the simulation state
//! 7. Spawn the initial population
//! 8. Create the entropy source from the schedule
//! 9. Create run control and install the Ctrl-C handler
//! 10. Run the simulation loop and log the result

mod error;
mod report;
mod spawner;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use somnium_core::SimulationState;
use somnium_core::config::{LogFormat, LoggingConfig, SomniumConfig};
use somnium_core::entropy;
use somnium_core::runner::{self, RunOptions};
use somnium_events::{EventLog, JsonlSink, MultiSink, TracingSink};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::report::ReportCallback;

/// Config file read when no path is given on the command line.
const DEFAULT_CONFIG_PATH: &str = "somnium-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, loaded_from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("somnium-engine starting");
    if loaded_from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }

    // 3. Validate.
    let validated = config.validate().map_err(EngineError::from)?;
    info!(
        world_name = config.world.name,
        roles = validated.roles.len(),
        fragments = validated.fragments.len(),
        crisis_tick = validated.rules.doubt.crisis_tick,
        dream_radius = validated.rules.dream.radius,
        entropy_threshold = validated.rules.mutation.entropy_threshold,
        "Rules validated"
    );

    // 4. Pick the run seed.
    let seed = config.world.seed.unwrap_or_else(|| rand::rng().random());
    info!(seed, fixed = config.world.seed.is_some(), "Run seed chosen");

    // 5. Open event sinks.
    let mut sink = MultiSink::new().with(TracingSink);
    if let Some(path) = &config.logging.event_log_path {
        sink = sink.with(JsonlSink::append(path).map_err(EngineError::from)?);
        info!(path = %path.display(), "Event log file opened");
    }

    // 6. Build the simulation state.
    let mut state = SimulationState::builder()
        .validated(validated)
        .seed(seed)
        .event_log(EventLog::new(sink))
        .build()
        .map_err(EngineError::from)?;
    info!(run_id = %state.run_id(), "Simulation state built");

    // 7. Spawn the initial population.
    let mut spawn_rng = SmallRng::seed_from_u64(seed.wrapping_add(1));
    spawner::populate(&mut state, &config.population, &mut spawn_rng)?;

    // 8. Entropy source.
    let mut entropy_source = entropy::from_schedule(&config.entropy_schedule, seed.wrapping_add(2));
    info!(schedule = ?config.entropy_schedule, "Entropy source ready");

    // 9. Run control and Ctrl-C.
    let control = runner::shared_control(RunOptions {
        max_ticks: config.simulation.max_ticks,
        tick_interval_ms: config.simulation.tick_interval_ms,
    });
    let stopper = Arc::clone(&control);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping after the current tick");
            stopper.request_stop();
        }
    });

    // 10. Run.
    let mut reporter = ReportCallback::new(config.simulation.report_interval);
    let result = runner::run_simulation(
        &mut state,
        entropy_source.as_mut(),
        &control,
        &mut reporter,
    )
    .await
    .map_err(EngineError::from)?;

    runner::log_simulation_end(&result);
    reporter.log_totals();

    let log = state.event_log();
    if log.dropped_count() > 0 {
        warn!(
            recorded = log.recorded_count(),
            dropped = log.dropped_count(),
            "Some events could not be written to the event sinks"
        );
    }

    info!("somnium-engine shut down");
    Ok(())
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist. Returns whether the file was read.
fn load_config(path: &Path) -> Result<(SomniumConfig, bool), EngineError> {
    if path.exists() {
        Ok((SomniumConfig::from_file(path)?, true))
    } else {
        let mut config = SomniumConfig::default();
        config.logging.apply_env_overrides();
        Ok((config, false))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
