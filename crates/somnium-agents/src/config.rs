//! Rule parameters, the role set, and the dream fragment pool.
//!
//! The defaults here are the engine's reference tuning:
//!
//! | rule     | trigger                                 | gate  | effect                         |
//! |----------|-----------------------------------------|-------|--------------------------------|
//! | doubt    | `tick == 600` or `trust < 0.2`          | 0.10  | permanent `reverse_role` goal  |
//! | dream    | distance to eidolon `<= 10`             | 0.15  | `temp` goal for 180 ticks      |
//! | mutation | `entropy > 0.9`                         | 0.25  | one agent moves to next role   |
//!
//! All three structs deserialize with per-field defaults, so a config
//! file only needs to name what it changes.

use serde::Deserialize;
use somnium_types::Role;

use crate::error::AgentError;

/// Trust & doubt rule parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DoubtConfig {
    /// The scheduled crisis tick on which every agent is evaluated.
    #[serde(default = "default_crisis_tick")]
    pub crisis_tick: u64,

    /// Agents with trust strictly below this are evaluated every tick.
    #[serde(default = "default_trust_threshold")]
    pub trust_threshold: f64,

    /// Chance that an evaluated agent queues a role reversal.
    #[serde(default = "default_doubt_probability")]
    pub probability: f64,
}

impl Default for DoubtConfig {
    fn default() -> Self {
        Self {
            crisis_tick: default_crisis_tick(),
            trust_threshold: default_trust_threshold(),
            probability: default_doubt_probability(),
        }
    }
}

/// Dream injection rule parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DreamConfig {
    /// Influence radius around each eidolon (inclusive).
    #[serde(default = "default_dream_radius")]
    pub radius: f64,

    /// Chance that an agent in range receives a dream.
    #[serde(default = "default_dream_probability")]
    pub probability: f64,

    /// Tick budget of an injected temporary goal.
    #[serde(default = "default_dream_duration_ticks")]
    pub duration_ticks: u32,
}

impl Default for DreamConfig {
    fn default() -> Self {
        Self {
            radius: default_dream_radius(),
            probability: default_dream_probability(),
            duration_ticks: default_dream_duration_ticks(),
        }
    }
}

/// Entropy mutation rule parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MutationConfig {
    /// The rule fires only when entropy is strictly above this.
    #[serde(default = "default_entropy_threshold")]
    pub entropy_threshold: f64,

    /// Chance that a firing tick actually mutates an agent.
    #[serde(default = "default_mutation_probability")]
    pub probability: f64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            entropy_threshold: default_entropy_threshold(),
            probability: default_mutation_probability(),
        }
    }
}

/// Parameters for all three rules.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuleConfig {
    /// Trust & doubt rule.
    #[serde(default)]
    pub doubt: DoubtConfig,

    /// Dream injection rule.
    #[serde(default)]
    pub dream: DreamConfig,

    /// Entropy mutation rule.
    #[serde(default)]
    pub mutation: MutationConfig,
}

impl RuleConfig {
    /// Check every threshold and probability.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidRuleConfig`] if a probability is not
    /// a finite value in `[0, 1]`, the dream radius is negative or not
    /// finite, the dream duration is zero, or a threshold is `NaN`.
    pub fn validate(&self) -> Result<(), AgentError> {
        check_probability("doubt.probability", self.doubt.probability)?;
        check_probability("dream.probability", self.dream.probability)?;
        check_probability("mutation.probability", self.mutation.probability)?;

        if self.doubt.trust_threshold.is_nan() {
            return Err(invalid("doubt.trust_threshold must be a number"));
        }
        if self.mutation.entropy_threshold.is_nan() {
            return Err(invalid("mutation.entropy_threshold must be a number"));
        }
        if !self.dream.radius.is_finite() || self.dream.radius < 0.0 {
            return Err(invalid("dream.radius must be a finite, non-negative distance"));
        }
        if self.dream.duration_ticks == 0 {
            return Err(invalid("dream.duration_ticks must be at least 1"));
        }
        Ok(())
    }
}

fn check_probability(field: &str, value: f64) -> Result<(), AgentError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(&format!("{field} must be within [0, 1], got {value}")))
    }
}

fn invalid(reason: &str) -> AgentError {
    AgentError::InvalidRuleConfig {
        reason: reason.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Role set
// ---------------------------------------------------------------------------

/// Roles used when the configuration does not name any.
pub const DEFAULT_ROLES: &[&str] = &["scout", "guardian", "oracle", "wanderer"];

/// The ordered, non-empty set of legal roles.
///
/// Order matters: role mutation moves an agent to the role after its
/// current one, wrapping from the last role back to the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSet {
    roles: Vec<Role>,
}

impl RoleSet {
    /// Build a role set.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::EmptyRoleSet`] if `roles` is empty, or
    /// [`AgentError::DuplicateRole`] if a role is listed twice.
    pub fn new(roles: Vec<Role>) -> Result<Self, AgentError> {
        if roles.is_empty() {
            return Err(AgentError::EmptyRoleSet);
        }
        for (i, role) in roles.iter().enumerate() {
            if roles.iter().skip(i.saturating_add(1)).any(|other| other == role) {
                return Err(AgentError::DuplicateRole(role.clone()));
            }
        }
        Ok(Self { roles })
    }

    /// Build a role set from role names.
    ///
    /// # Errors
    ///
    /// Same as [`RoleSet::new`].
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, AgentError> {
        Self::new(names.iter().map(|n| Role::new(n.as_ref())).collect())
    }

    /// Whether `role` is a member.
    pub fn contains(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// The role that follows `role`, wrapping at the end.
    ///
    /// A role that is not a member maps to the first role. Returns `None`
    /// only for an empty set, which [`RoleSet::new`] never builds.
    pub fn next_after(&self, role: &Role) -> Option<&Role> {
        self.roles
            .iter()
            .position(|r| r == role)
            .and_then(|i| self.roles.get(i.saturating_add(1)))
            .or_else(|| self.first())
    }

    /// The first role in the set.
    pub fn first(&self) -> Option<&Role> {
        self.roles.first()
    }

    /// Role at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Role> {
        self.roles.get(index)
    }

    /// Roles in order.
    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter()
    }

    /// Number of roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl Default for RoleSet {
    fn default() -> Self {
        Self {
            roles: DEFAULT_ROLES.iter().copied().map(Role::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Fragment pool
// ---------------------------------------------------------------------------

/// Dream fragments used when the configuration does not name any.
pub const DEFAULT_FRAGMENTS: &[&str] = &[
    "a staircase that descends into the sea",
    "the name of someone never met",
    "a lantern carried by no one",
    "a door that opens inward twice",
    "the taste of iron rain",
    "a map of a city that has not been built",
];

/// The non-empty pool dream fragments are drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentPool {
    fragments: Vec<String>,
}

impl FragmentPool {
    /// Build a fragment pool.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::EmptyFragmentPool`] if `fragments` is empty.
    pub fn new(fragments: Vec<String>) -> Result<Self, AgentError> {
        if fragments.is_empty() {
            return Err(AgentError::EmptyFragmentPool);
        }
        Ok(Self { fragments })
    }

    /// Fragment at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fragments.get(index).map(String::as_str)
    }

    /// Fragments in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().map(String::as_str)
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl Default for FragmentPool {
    fn default() -> Self {
        Self {
            fragments: DEFAULT_FRAGMENTS.iter().map(|f| (*f).to_owned()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_crisis_tick() -> u64 {
    600
}

const fn default_trust_threshold() -> f64 {
    0.2
}

const fn default_doubt_probability() -> f64 {
    0.10
}

const fn default_dream_radius() -> f64 {
    10.0
}

const fn default_dream_probability() -> f64 {
    0.15
}

const fn default_dream_duration_ticks() -> u32 {
    180
}

const fn default_entropy_threshold() -> f64 {
    0.9
}

const fn default_mutation_probability() -> f64 {
    0.25
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_tuning() {
        let config = RuleConfig::default();
        assert_eq!(config.doubt.crisis_tick, 600);
        assert_eq!(config.doubt.trust_threshold, 0.2);
        assert_eq!(config.doubt.probability, 0.10);
        assert_eq!(config.dream.radius, 10.0);
        assert_eq!(config.dream.probability, 0.15);
        assert_eq!(config.dream.duration_ticks, 180);
        assert_eq!(config.mutation.entropy_threshold, 0.9);
        assert_eq!(config.mutation.probability, 0.25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = "dream:\n  radius: 4.5\nmutation:\n  probability: 1.0\n";
        let config: RuleConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.dream.radius, 4.5);
        assert_eq!(config.dream.duration_ticks, 180);
        assert_eq!(config.mutation.probability, 1.0);
        assert_eq!(config.doubt.crisis_tick, 600);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = RuleConfig::default();
        config.doubt.probability = 1.5;
        assert!(matches!(
            config.validate(),
            Err(AgentError::InvalidRuleConfig { .. })
        ));

        let mut config = RuleConfig::default();
        config.dream.radius = -1.0;
        assert!(config.validate().is_err());

        let mut config = RuleConfig::default();
        config.dream.duration_ticks = 0;
        assert!(config.validate().is_err());

        let mut config = RuleConfig::default();
        config.mutation.entropy_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_role_set_is_rejected() {
        assert!(matches!(RoleSet::new(Vec::new()), Err(AgentError::EmptyRoleSet)));
    }

    #[test]
    fn duplicate_role_is_rejected() {
        let result = RoleSet::from_names(&["scout", "oracle", "scout"]);
        assert!(matches!(result, Err(AgentError::DuplicateRole(r)) if r.as_str() == "scout"));
    }

    #[test]
    fn next_after_cycles_through_roles() {
        let roles = RoleSet::from_names(&["scout", "guardian", "oracle"]).unwrap();
        let next = |name: &str| roles.next_after(&Role::from(name)).unwrap().as_str().to_owned();
        assert_eq!(next("scout"), "guardian");
        assert_eq!(next("guardian"), "oracle");
        assert_eq!(next("oracle"), "scout");
        assert_eq!(next("jester"), "scout");
    }

    #[test]
    fn single_role_set_maps_to_itself() {
        let roles = RoleSet::from_names(&["hermit"]).unwrap();
        let next = roles.next_after(&Role::from("hermit")).unwrap();
        assert_eq!(next.as_str(), "hermit");
    }

    #[test]
    fn empty_fragment_pool_is_rejected() {
        assert!(matches!(
            FragmentPool::new(Vec::new()),
            Err(AgentError::EmptyFragmentPool)
        ));
        let pool = FragmentPool::default();
        assert!(!pool.is_empty());
        assert_eq!(pool.get(0), DEFAULT_FRAGMENTS.first().copied());
    }
}
