//! Configuration loading and typed config structures for Somnium.
//!
//! The canonical configuration lives in `somnium-config.yaml` at the
//! project root. Every section and field has a default, so an empty file
//! (or no file at all) yields the reference tuning. Two environment
//! variables override the YAML:
//!
//! - `SOMNIUM_EVENT_LOG` overrides `logging.event_log_path`
//! - `SOMNIUM_LOG_LEVEL` overrides `logging.level`

use std::path::{Path, PathBuf};

use serde::Deserialize;
use somnium_agents::config::{DEFAULT_FRAGMENTS, DEFAULT_ROLES};
use somnium_agents::{AgentError, FragmentPool, RoleSet, RuleConfig};
use somnium_types::Position;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The values parsed but do not describe a runnable simulation.
    #[error("invalid configuration: {source}")]
    Invalid {
        /// The rule or role validation failure.
        #[from]
        source: AgentError,
    },

    /// The entropy schedule is malformed.
    #[error("invalid entropy schedule: {reason}")]
    EntropySchedule {
        /// Explanation of what is wrong with the schedule.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SomniumConfig {
    /// Run-level settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Rule thresholds and probabilities.
    #[serde(default)]
    pub rules: RuleConfig,

    /// Legal roles, in mutation order.
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,

    /// Dream fragments eidolons draw from.
    #[serde(default = "default_fragments")]
    pub fragments: Vec<String>,

    /// Initial agents and eidolons.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Where per-tick entropy comes from.
    #[serde(default)]
    pub entropy_schedule: EntropyScheduleConfig,

    /// Run bounds and pacing.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging and event log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SomniumConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            rules: RuleConfig::default(),
            roles: default_roles(),
            fragments: default_fragments(),
            population: PopulationConfig::default(),
            entropy_schedule: EntropyScheduleConfig::default(),
            simulation: SimulationBoundsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// The validated pieces a simulation is built from.
#[derive(Debug, Clone)]
pub struct ValidatedRules {
    /// Rule parameters, range-checked.
    pub rules: RuleConfig,
    /// Non-empty, duplicate-free role set.
    pub roles: RoleSet,
    /// Non-empty fragment pool.
    pub fragments: FragmentPool,
}

impl SomniumConfig {
    /// Load configuration from a YAML file, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config = Self::parse_without_env(yaml)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string, ignoring the environment.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse_without_env(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Check rule ranges and build the role set and fragment pool.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty or duplicated role
    /// list, an empty fragment list, or out-of-range rule values, and
    /// [`ConfigError::EntropySchedule`] for a malformed schedule.
    pub fn validate(&self) -> Result<ValidatedRules, ConfigError> {
        self.rules.validate()?;
        self.entropy_schedule.validate()?;
        let roles = RoleSet::from_names(&self.roles)?;
        let fragments = FragmentPool::new(self.fragments.clone())?;
        Ok(ValidatedRules {
            rules: self.rules.clone(),
            roles,
            fragments,
        })
    }
}

/// Run-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable run name, used in logs.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Seed for every random draw. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: None,
        }
    }
}

/// An explicitly configured agent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentSpec {
    /// Unique name.
    pub name: String,
    /// Starting role; must be one of `roles`.
    pub role: String,
    /// Starting trust (clamped into `[0, 1]`).
    #[serde(default = "default_agent_trust")]
    pub trust: f64,
    /// Starting position.
    #[serde(default)]
    pub position: Position,
}

/// An explicitly configured eidolon.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EidolonSpec {
    /// Where the eidolon sits.
    pub position: Position,
}

/// Initial population.
///
/// Explicit `agents` and `eidolons` are placed first. The driver then
/// generates `seed_agents` more agents and `seed_eidolons` more eidolons
/// at random positions inside a square of side `arena_size` centred on
/// the origin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Number of generated agents.
    #[serde(default = "default_seed_agents")]
    pub seed_agents: u32,

    /// Number of generated eidolons.
    #[serde(default = "default_seed_eidolons")]
    pub seed_eidolons: u32,

    /// Side length of the spawn square.
    #[serde(default = "default_arena_size")]
    pub arena_size: f64,

    /// Explicit agents.
    #[serde(default)]
    pub agents: Vec<AgentSpec>,

    /// Explicit eidolons.
    #[serde(default)]
    pub eidolons: Vec<EidolonSpec>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            seed_agents: default_seed_agents(),
            seed_eidolons: default_seed_eidolons(),
            arena_size: default_arena_size(),
            agents: Vec::new(),
            eidolons: Vec::new(),
        }
    }
}

/// How entropy is produced each tick.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntropyScheduleConfig {
    /// The same value every tick.
    Constant {
        /// The entropy value.
        value: f64,
    },
    /// A sine wave around `base`.
    Oscillating {
        /// Midline of the wave.
        #[serde(default = "default_oscillation_base")]
        base: f64,
        /// Peak deviation from the midline.
        #[serde(default = "default_oscillation_amplitude")]
        amplitude: f64,
        /// Ticks per full cycle.
        #[serde(default = "default_oscillation_period")]
        period_ticks: u32,
    },
    /// A bounded random walk in `[0, 1]`.
    RandomWalk {
        /// Starting value.
        #[serde(default = "default_walk_start")]
        start: f64,
        /// Largest change per tick.
        #[serde(default = "default_walk_step")]
        max_step: f64,
    },
}

impl Default for EntropyScheduleConfig {
    fn default() -> Self {
        Self::Oscillating {
            base: default_oscillation_base(),
            amplitude: default_oscillation_amplitude(),
            period_ticks: default_oscillation_period(),
        }
    }
}

impl EntropyScheduleConfig {
    /// Check the schedule's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EntropySchedule`] for non-finite values, a
    /// zero oscillation period, or a negative walk step.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let reason = match *self {
            Self::Constant { value } if !value.is_finite() => Some("constant value must be finite"),
            Self::Oscillating { base, amplitude, .. }
                if !base.is_finite() || !amplitude.is_finite() =>
            {
                Some("oscillation base and amplitude must be finite")
            }
            Self::Oscillating { period_ticks: 0, .. } => Some("oscillation period must be at least 1 tick"),
            Self::RandomWalk { start, max_step }
                if !start.is_finite() || !max_step.is_finite() || max_step < 0.0 =>
            {
                Some("random walk start and step must be finite, step non-negative")
            }
            _ => None,
        };
        match reason {
            Some(reason) => Err(ConfigError::EntropySchedule {
                reason: reason.to_owned(),
            }),
            None => Ok(()),
        }
    }
}

/// Run bounds and pacing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Stop after this many ticks (0 = run until stopped).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Real-time delay between ticks in milliseconds (0 = as fast as possible).
    #[serde(default)]
    pub tick_interval_ms: u64,

    /// Log a population report every N ticks (0 = never).
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            tick_interval_ms: 0,
            report_interval: default_report_interval(),
        }
    }
}

/// Log output format for the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive (used when `RUST_LOG` is unset).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Where the JSON Lines event log is written (`None` = no file).
    #[serde(default = "default_event_log_path")]
    pub event_log_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            event_log_path: default_event_log_path(),
        }
    }
}

impl LoggingConfig {
    /// Override logging settings from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Override logging settings from `lookup`.
    ///
    /// An empty `SOMNIUM_EVENT_LOG` disables the file log.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("SOMNIUM_EVENT_LOG") {
            self.event_log_path = (!path.is_empty()).then(|| PathBuf::from(path));
        }
        if let Some(level) = lookup("SOMNIUM_LOG_LEVEL") {
            self.level = level;
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "somnium".to_owned()
}

fn default_roles() -> Vec<String> {
    DEFAULT_ROLES.iter().map(|r| (*r).to_owned()).collect()
}

fn default_fragments() -> Vec<String> {
    DEFAULT_FRAGMENTS.iter().map(|f| (*f).to_owned()).collect()
}

const fn default_agent_trust() -> f64 {
    0.5
}

const fn default_seed_agents() -> u32 {
    12
}

const fn default_seed_eidolons() -> u32 {
    2
}

const fn default_arena_size() -> f64 {
    60.0
}

const fn default_oscillation_base() -> f64 {
    0.6
}

const fn default_oscillation_amplitude() -> f64 {
    0.35
}

const fn default_oscillation_period() -> u32 {
    240
}

const fn default_walk_start() -> f64 {
    0.5
}

const fn default_walk_step() -> f64 {
    0.05
}

const fn default_max_ticks() -> u64 {
    1_000
}

const fn default_report_interval() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_event_log_path() -> Option<PathBuf> {
    Some(PathBuf::from("data/events.jsonl"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SomniumConfig::parse_without_env("").unwrap();
        assert_eq!(config, SomniumConfig::default());
        assert_eq!(config.roles.len(), 4);
        assert_eq!(config.rules.dream.duration_ticks, 180);
        assert_eq!(config.simulation.max_ticks, 1_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  name: "night shift"
  seed: 7

rules:
  doubt:
    crisis_tick: 100
  dream:
    radius: 5.0
  mutation:
    entropy_threshold: 0.8

roles: [scout, oracle]
fragments: ["a hallway", "wet sand"]

population:
  seed_agents: 0
  seed_eidolons: 0
  agents:
    - name: Moss
      role: oracle
      trust: 0.1
      position: { x: 1.0, y: 2.0 }
  eidolons:
    - position: { x: 0.0, y: 0.0 }

entropy_schedule:
  kind: constant
  value: 0.95

simulation:
  max_ticks: 50
  tick_interval_ms: 10
  report_interval: 5

logging:
  level: debug
  format: json
  event_log_path: /tmp/somnium-events.jsonl
"#;
        let config = SomniumConfig::parse_without_env(yaml).unwrap();

        assert_eq!(config.world.name, "night shift");
        assert_eq!(config.world.seed, Some(7));
        assert_eq!(config.rules.doubt.crisis_tick, 100);
        assert_eq!(config.rules.doubt.probability, 0.10);
        assert_eq!(config.rules.dream.radius, 5.0);
        assert_eq!(config.rules.mutation.entropy_threshold, 0.8);
        assert_eq!(config.roles, ["scout", "oracle"]);

        let moss = config.population.agents.first().unwrap();
        assert_eq!(moss.name, "Moss");
        assert_eq!(moss.position, Position::planar(1.0, 2.0));
        assert_eq!(config.population.eidolons.len(), 1);

        assert_eq!(config.entropy_schedule, EntropyScheduleConfig::Constant { value: 0.95 });
        assert_eq!(config.simulation.max_ticks, 50);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.logging.event_log_path,
            Some(PathBuf::from("/tmp/somnium-events.jsonl"))
        );

        let validated = config.validate().unwrap();
        assert_eq!(validated.roles.len(), 2);
        assert_eq!(validated.fragments.len(), 2);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let yaml = include_str!("../../../somnium-config.yaml");
        let config = SomniumConfig::parse_without_env(yaml).unwrap();

        assert_eq!(config.rules, RuleConfig::default());
        assert_eq!(config.roles, default_roles());
        assert_eq!(config.fragments, default_fragments());
        assert_eq!(config.entropy_schedule, EntropyScheduleConfig::default());
        assert_eq!(config.simulation, SimulationBoundsConfig::default());
        assert_eq!(config.population.agents.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_roles_and_fragments() {
        let config = SomniumConfig::parse_without_env("roles: []\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                source: AgentError::EmptyRoleSet
            })
        ));

        let config = SomniumConfig::parse_without_env("fragments: []\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                source: AgentError::EmptyFragmentPool
            })
        ));
    }

    #[test]
    fn validate_rejects_bad_schedule() {
        let yaml = "entropy_schedule:\n  kind: oscillating\n  period_ticks: 0\n";
        let config = SomniumConfig::parse_without_env(yaml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::EntropySchedule { .. })));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = SomniumConfig::parse_without_env("rules: [not, a, map]");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn env_overrides_apply() {
        let mut logging = LoggingConfig::default();
        logging.apply_overrides_from(|key| match key {
            "SOMNIUM_EVENT_LOG" => Some("/var/log/dreams.jsonl".to_owned()),
            "SOMNIUM_LOG_LEVEL" => Some("somnium=trace".to_owned()),
            _ => None,
        });
        assert_eq!(logging.event_log_path, Some(PathBuf::from("/var/log/dreams.jsonl")));
        assert_eq!(logging.level, "somnium=trace");

        logging.apply_overrides_from(|key| (key == "SOMNIUM_EVENT_LOG").then(String::new));
        assert!(logging.event_log_path.is_none());
    }
}
