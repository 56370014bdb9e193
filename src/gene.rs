//! Gene types for neurogene genomes.
//!
//! A [`Gene`] is one weighted directed edge between a source endpoint
//! (sensor or neuron) and a sink endpoint (neuron or action). Endpoints are
//! identified by an [`EndpointKind`] plus a plain index.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::BrainConfig;

/// The kind of an edge endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EndpointKind {
    /// External input channel, read-only.
    Sensor,
    /// Internal recurrent unit.
    Neuron,
    /// External output channel, write-only.
    Action,
}

impl EndpointKind {
    /// Numeric code used in diagnostic logs (`0` sensor, `1` neuron, `2` action).
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Sensor => 0,
            Self::Neuron => 1,
            Self::Action => 2,
        }
    }

    /// Exclusive upper bound on an index of this kind.
    #[must_use]
    pub fn index_bound(self, config: &BrainConfig) -> u64 {
        match self {
            Self::Sensor => u64::from(config.num_senses),
            Self::Neuron => u64::from(config.max_neuron_id) + 1,
            Self::Action => u64::from(config.num_actions),
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Sensor => "sensor",
            Self::Neuron => "neuron",
            Self::Action => "action",
        };
        f.write_str(name)
    }
}

/// A weighted directed edge.
///
/// Genes are values: editing one means replacing it in the genome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    /// `Sensor` or `Neuron`.
    pub source_kind: EndpointKind,
    /// Sensor channel, or pre-compile neuron id.
    pub source_index: u32,
    /// `Neuron` or `Action`.
    pub sink_kind: EndpointKind,
    /// Pre-compile neuron id, or action channel.
    pub sink_index: u32,
    /// Edge weight in `[-1, 1]`.
    pub weight: f32,
}

impl Gene {
    /// Create a gene without validation.
    #[must_use]
    pub const fn new(
        source_kind: EndpointKind,
        source_index: u32,
        sink_kind: EndpointKind,
        sink_index: u32,
        weight: f32,
    ) -> Self {
        Self {
            source_kind,
            source_index,
            sink_kind,
            sink_index,
            weight,
        }
    }

    /// Draw a random gene within the configured bounds.
    ///
    /// A sensor source always gets a neuron sink.
    ///
    /// # Panics
    ///
    /// Panics if `config` has no sensors or no actions. Configurations that
    /// pass [`BrainConfig::validate`] never do.
    pub fn random<R: Rng>(config: &BrainConfig, rng: &mut R) -> Self {
        debug_assert!(
            config.num_senses > 0 && config.num_actions > 0,
            "BrainConfig needs at least one sensor and one action"
        );
        let source_kind = if rng.random::<bool>() {
            EndpointKind::Sensor
        } else {
            EndpointKind::Neuron
        };
        let sink_kind = if source_kind == EndpointKind::Sensor || rng.random::<bool>() {
            EndpointKind::Neuron
        } else {
            EndpointKind::Action
        };

        Self {
            source_kind,
            source_index: random_index(source_kind, config, rng),
            sink_kind,
            sink_index: random_index(sink_kind, config, rng),
            weight: random_weight(rng),
        }
    }

    /// The neuron id this gene reads from, if its source is a neuron.
    #[inline]
    #[must_use]
    pub fn source_neuron(&self) -> Option<u32> {
        (self.source_kind == EndpointKind::Neuron).then_some(self.source_index)
    }

    /// The neuron id this gene feeds, if its sink is a neuron.
    #[inline]
    #[must_use]
    pub fn sink_neuron(&self) -> Option<u32> {
        (self.sink_kind == EndpointKind::Neuron).then_some(self.sink_index)
    }

    /// Whether this gene connects a neuron to itself.
    #[inline]
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        matches!((self.source_neuron(), self.sink_neuron()), (Some(a), Some(b)) if a == b)
    }

    /// Check kinds, index bounds and weight range.
    ///
    /// # Errors
    ///
    /// Returns the first [`GeneViolation`] found.
    pub fn check(&self, config: &BrainConfig) -> Result<(), GeneViolation> {
        if self.source_kind == EndpointKind::Action {
            return Err(GeneViolation::ActionSource);
        }
        if self.sink_kind == EndpointKind::Sensor {
            return Err(GeneViolation::SensorSink);
        }
        if u64::from(self.source_index) >= self.source_kind.index_bound(config) {
            return Err(GeneViolation::SourceIndexOutOfRange {
                bound: self.source_kind.index_bound(config),
            });
        }
        if u64::from(self.sink_index) >= self.sink_kind.index_bound(config) {
            return Err(GeneViolation::SinkIndexOutOfRange {
                bound: self.sink_kind.index_bound(config),
            });
        }
        if !(-1.0..=1.0).contains(&self.weight) {
            return Err(GeneViolation::WeightOutOfRange);
        }
        Ok(())
    }

    /// The diagnostic 5-tuple `(source_kind, source_index, sink_kind, sink_index, weight)`
    /// with kinds as numeric codes.
    #[must_use]
    pub fn as_tuple(&self) -> (u8, u32, u8, u32, f32) {
        (
            self.source_kind.code(),
            self.source_index,
            self.sink_kind.code(),
            self.sink_index,
            self.weight,
        )
    }
}

/// Uniform index within the bound implied by `kind`.
pub(crate) fn random_index<R: Rng>(kind: EndpointKind, config: &BrainConfig, rng: &mut R) -> u32 {
    match kind {
        EndpointKind::Sensor => rng.random_range(0..config.num_senses),
        EndpointKind::Neuron => rng.random_range(0..=config.max_neuron_id),
        EndpointKind::Action => rng.random_range(0..config.num_actions),
    }
}

/// Uniform weight in `[-1, 1]`.
pub(crate) fn random_weight<R: Rng>(rng: &mut R) -> f32 {
    rng.random_range(-1.0..=1.0)
}

/// Why a gene is structurally invalid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeneViolation {
    /// An action cannot be a source.
    ActionSource,
    /// A sensor cannot be a sink.
    SensorSink,
    /// A sensor source feeds an action directly.
    SensorToAction,
    /// Source index is not below `bound`.
    SourceIndexOutOfRange {
        /// Exclusive bound for the source kind.
        bound: u64,
    },
    /// Sink index is not below `bound`.
    SinkIndexOutOfRange {
        /// Exclusive bound for the sink kind.
        bound: u64,
    },
    /// Weight is outside `[-1, 1]` or NaN.
    WeightOutOfRange,
}

impl std::fmt::Display for GeneViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneViolation::ActionSource => write!(f, "source cannot be an action"),
            GeneViolation::SensorSink => write!(f, "sink cannot be a sensor"),
            GeneViolation::SensorToAction => write!(f, "sensor source must feed a neuron"),
            GeneViolation::SourceIndexOutOfRange { bound } => {
                write!(f, "source index must be below {bound}")
            }
            GeneViolation::SinkIndexOutOfRange { bound } => {
                write!(f, "sink index must be below {bound}")
            }
            GeneViolation::WeightOutOfRange => write!(f, "weight must lie in [-1, 1]"),
        }
    }
}

/// A gene that violates the configured bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidGeneError {
    /// Position of the gene in its genome.
    pub position: usize,
    /// The offending gene.
    pub gene: Gene,
    /// What is wrong with it.
    pub violation: GeneViolation,
}

impl std::fmt::Display for InvalidGeneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid gene at position {} ({} {} -> {} {}, weight {}): {}",
            self.position,
            self.gene.source_kind,
            self.gene.source_index,
            self.gene.sink_kind,
            self.gene.sink_index,
            self.gene.weight,
            self.violation
        )
    }
}

impl std::error::Error for InvalidGeneError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_random_gene_within_bounds() {
        let config = BrainConfig::minimal(3, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..1000 {
            let gene = Gene::random(&config, &mut rng);
            assert!(gene.check(&config).is_ok(), "{gene:?}");
            if gene.source_kind == EndpointKind::Sensor {
                assert_eq!(gene.sink_kind, EndpointKind::Neuron);
            }
        }
    }

    #[test]
    #[should_panic]
    fn test_random_gene_without_sensors_panics() {
        let config = BrainConfig::minimal(0, 2);
        assert!(config.validate().is_err());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..64 {
            let _ = Gene::random(&config, &mut rng);
        }
    }

    #[test]
    fn test_self_loop_detection() {
        let looped = Gene::new(EndpointKind::Neuron, 4, EndpointKind::Neuron, 4, 0.5);
        let plain = Gene::new(EndpointKind::Neuron, 4, EndpointKind::Neuron, 5, 0.5);
        let sensor = Gene::new(EndpointKind::Sensor, 4, EndpointKind::Neuron, 4, 0.5);
        assert!(looped.is_self_loop());
        assert!(!plain.is_self_loop());
        assert!(!sensor.is_self_loop());
    }

    #[test]
    fn test_check_rejects_out_of_range() {
        let config = BrainConfig::minimal(3, 2);

        let sensor = Gene::new(EndpointKind::Sensor, 3, EndpointKind::Neuron, 0, 0.0);
        assert_eq!(
            sensor.check(&config),
            Err(GeneViolation::SourceIndexOutOfRange { bound: 3 })
        );

        let action = Gene::new(EndpointKind::Neuron, 0, EndpointKind::Action, 2, 0.0);
        assert_eq!(
            action.check(&config),
            Err(GeneViolation::SinkIndexOutOfRange { bound: 2 })
        );

        let neuron = Gene::new(EndpointKind::Neuron, config.max_neuron_id + 1, EndpointKind::Neuron, 0, 0.0);
        assert!(matches!(
            neuron.check(&config),
            Err(GeneViolation::SourceIndexOutOfRange { .. })
        ));

        let heavy = Gene::new(EndpointKind::Neuron, 0, EndpointKind::Neuron, 1, 1.5);
        assert_eq!(heavy.check(&config), Err(GeneViolation::WeightOutOfRange));

        let nan = Gene::new(EndpointKind::Neuron, 0, EndpointKind::Neuron, 1, f32::NAN);
        assert_eq!(nan.check(&config), Err(GeneViolation::WeightOutOfRange));

        let backwards = Gene::new(EndpointKind::Action, 0, EndpointKind::Sensor, 0, 0.0);
        assert_eq!(backwards.check(&config), Err(GeneViolation::ActionSource));
    }

    #[test]
    fn test_tuple_codes() {
        let gene = Gene::new(EndpointKind::Neuron, 7, EndpointKind::Action, 1, -0.25);
        assert_eq!(gene.as_tuple(), (1, 7, 2, 1, -0.25));
    }

    #[test]
    fn test_invalid_gene_error_display() {
        let err = InvalidGeneError {
            position: 3,
            gene: Gene::new(EndpointKind::Sensor, 9, EndpointKind::Neuron, 0, 0.1),
            violation: GeneViolation::SourceIndexOutOfRange { bound: 3 },
        };
        let msg = err.to_string();
        assert!(msg.contains("position 3"), "{msg}");
        assert!(msg.contains("below 3"), "{msg}");
    }
}
