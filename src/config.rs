//! Configuration for genome creation, mutation, compilation and activation.
//!
//! A [`BrainConfig`] is built once (from [`Default`], a preset, or a YAML file)
//! and passed by reference to every component. Nothing in the crate mutates it.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Relative weights for choosing a mutation operator.
///
/// Weights need not sum to one; they are normalised at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationWeights {
    /// Add a sensor→neuron or neuron→action edge.
    pub add_connection: f32,
    /// Add a neuron→neuron edge to a fresh neuron.
    pub add_neuron_connection: f32,
    /// Re-randomize one field of one gene.
    pub edit_connection: f32,
    /// Delete one gene.
    pub remove_connection: f32,
}

impl Default for MutationWeights {
    fn default() -> Self {
        Self {
            add_connection: 0.3,
            add_neuron_connection: 0.2,
            edit_connection: 0.35,
            remove_connection: 0.15,
        }
    }
}

/// How an edited gene's weight is re-randomized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum WeightPolicy {
    /// Add a uniform delta in `[-power, power]` and clip to `[-1, 1]`.
    Perturb {
        /// Maximum absolute step.
        power: f32,
    },
    /// Draw a fresh weight uniformly from `[-1, 1]`.
    Reroll,
}

impl Default for WeightPolicy {
    fn default() -> Self {
        Self::Perturb { power: 0.2 }
    }
}

/// Process-wide configuration shared by every controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// Number of sensor channels (`NUM_SENSES`).
    pub num_senses: u32,
    /// Number of action channels (`NUM_ACTIONS`).
    pub num_actions: u32,
    /// Largest neuron id a gene may carry before compilation (inclusive).
    pub max_neuron_id: u32,
    /// Shortest random genome.
    pub genome_length_min: usize,
    /// Longest random genome (inclusive).
    pub genome_length_max: usize,
    /// Operator weights for the mutation engine.
    pub mutation_weights: MutationWeights,
    /// Probability that AddConnection creates a sensor→neuron edge rather
    /// than a neuron→action edge.
    pub sensor_connection_prob: f32,
    /// Probability that a re-picked neuron index is a fresh id rather than
    /// one already present in the genome.
    pub fresh_neuron_prob: f32,
    /// Weight edit policy.
    pub weight_policy: WeightPolicy,
    /// Synchronous update rounds per activation call.
    pub activation_iterations: usize,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            num_senses: 8,
            num_actions: 8,
            max_neuron_id: 15,
            genome_length_min: 40,
            genome_length_max: 40,
            mutation_weights: MutationWeights::default(),
            sensor_connection_prob: 0.5,
            fresh_neuron_prob: 0.5,
            weight_policy: WeightPolicy::default(),
            activation_iterations: 3,
        }
    }
}

impl BrainConfig {
    /// Small configuration for tests and toy worlds.
    #[must_use]
    pub fn minimal(num_senses: u32, num_actions: u32) -> Self {
        Self {
            num_senses,
            num_actions,
            max_neuron_id: 9,
            genome_length_min: 8,
            genome_length_max: 12,
            ..Default::default()
        }
    }

    /// Parse and validate a configuration from YAML text.
    ///
    /// Missing fields take their [`Default`] values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed YAML and
    /// [`ConfigError::Invalid`] if the values fail [`validate`](Self::validate).
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_yaml_str`](Self::from_yaml_str).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_yaml_str(&contents)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(ConfigError::Parse)
    }

    /// Check that the configured ranges are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_senses == 0 || self.num_actions == 0 {
            return Err(ConfigError::Invalid(
                "num_senses and num_actions must be > 0".to_string(),
            ));
        }
        if self.genome_length_min > self.genome_length_max {
            return Err(ConfigError::Invalid(
                "genome_length_min cannot exceed genome_length_max".to_string(),
            ));
        }
        if self.max_neuron_id == u32::MAX {
            return Err(ConfigError::Invalid(
                "max_neuron_id must leave room for allocation".to_string(),
            ));
        }

        let w = &self.mutation_weights;
        let weights = [
            w.add_connection,
            w.add_neuron_connection,
            w.edit_connection,
            w.remove_connection,
        ];
        if weights.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(ConfigError::Invalid(
                "mutation weights must be finite and non-negative".to_string(),
            ));
        }
        if w.add_connection + w.add_neuron_connection <= 0.0 {
            return Err(ConfigError::Invalid(
                "at least one add operator needs a positive weight".to_string(),
            ));
        }

        for (name, p) in [
            ("sensor_connection_prob", self.sensor_connection_prob),
            ("fresh_neuron_prob", self.fresh_neuron_prob),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!("{name} must be in [0, 1]")));
            }
        }

        if let WeightPolicy::Perturb { power } = self.weight_policy {
            if !power.is_finite() || power < 0.0 {
                return Err(ConfigError::Invalid(
                    "weight perturbation power must be finite and non-negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(std::io::Error),
    /// The YAML could not be parsed or produced.
    Parse(serde_yaml::Error),
    /// A value is out of its allowed range.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {e}"),
            ConfigError::Parse(e) => write!(f, "malformed config: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}
