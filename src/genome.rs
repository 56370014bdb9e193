//! Genome: an ordered list of genes describing one controller.
//!
//! Gene order only decides which gene a positional mutation touches; it has
//! no effect on activation. All edits go through [`crate::mutation`], which
//! returns new genomes instead of changing shared ones.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::BrainConfig;
use crate::gene::{EndpointKind, Gene, GeneViolation, InvalidGeneError};

/// An ordered sequence of genes. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genome {
    genes: Vec<Gene>,
}

impl Genome {
    /// Wrap a gene list as-is. Use [`validate`](Self::validate) for
    /// hand-built genomes.
    #[must_use]
    pub fn new(genes: Vec<Gene>) -> Self {
        Self { genes }
    }

    /// Seed a random genome with a length drawn from the configured range.
    ///
    /// # Panics
    ///
    /// Panics if `genome_length_min > genome_length_max`, or if `config` has
    /// no sensors or no actions. Configurations that pass
    /// [`BrainConfig::validate`] never do.
    pub fn random<R: Rng>(config: &BrainConfig, rng: &mut R) -> Self {
        debug_assert!(
            config.genome_length_min <= config.genome_length_max,
            "genome_length_min exceeds genome_length_max"
        );
        let len = rng.random_range(config.genome_length_min..=config.genome_length_max);
        let genes = (0..len).map(|_| Gene::random(config, rng)).collect();
        Self { genes }
    }

    /// The genes in order.
    #[inline]
    #[must_use]
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    /// Iterate over the genes in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Gene> {
        self.genes.iter()
    }

    /// Number of genes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Whether the genome has no genes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Distinct neuron ids appearing as source or sink, ascending.
    #[must_use]
    pub fn neuron_ids(&self) -> BTreeSet<u32> {
        self.genes
            .iter()
            .flat_map(|g| [g.source_neuron(), g.sink_neuron()])
            .flatten()
            .collect()
    }

    /// Largest neuron id in the genome, if any gene touches a neuron.
    #[must_use]
    pub fn max_neuron_id(&self) -> Option<u32> {
        self.genes
            .iter()
            .flat_map(|g| [g.source_neuron(), g.sink_neuron()])
            .flatten()
            .max()
    }

    /// Check every gene against the configured bounds and the rule that a
    /// sensor source always feeds a neuron.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidGeneError`] for the first offending gene.
    pub fn validate(&self, config: &BrainConfig) -> Result<(), InvalidGeneError> {
        for (position, gene) in self.genes.iter().enumerate() {
            let violation = match gene.check(config) {
                Err(violation) => Some(violation),
                Ok(()) if gene.source_kind == EndpointKind::Sensor
                    && gene.sink_kind == EndpointKind::Action =>
                {
                    Some(GeneViolation::SensorToAction)
                }
                Ok(()) => None,
            };
            if let Some(violation) = violation {
                return Err(InvalidGeneError {
                    position,
                    gene: *gene,
                    violation,
                });
            }
        }
        Ok(())
    }

    /// One-line diagnostic rendering: a JSON list of
    /// `[source_kind, source_index, sink_kind, sink_index, weight]` tuples
    /// with kinds as numeric codes.
    #[must_use]
    pub fn to_log_line(&self) -> String {
        let tuples: Vec<_> = self.genes.iter().map(Gene::as_tuple).collect();
        serde_json::to_string(&tuples).unwrap_or_else(|_| "[]".to_string())
    }

    pub(crate) fn into_genes(self) -> Vec<Gene> {
        self.genes
    }
}

impl From<Vec<Gene>> for Genome {
    fn from(genes: Vec<Gene>) -> Self {
        Self::new(genes)
    }
}

impl FromIterator<Gene> for Genome {
    fn from_iter<I: IntoIterator<Item = Gene>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Genome {
    type Item = &'a Gene;
    type IntoIter = std::slice::Iter<'a, Gene>;

    fn into_iter(self) -> Self::IntoIter {
        self.genes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use EndpointKind::{Action, Neuron, Sensor};

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_random_genome_length_and_validity() {
        let config = BrainConfig::minimal(3, 2);
        let mut rng = test_rng();

        for _ in 0..200 {
            let genome = Genome::random(&config, &mut rng);
            assert!(genome.len() >= config.genome_length_min);
            assert!(genome.len() <= config.genome_length_max);
            assert!(genome.validate(&config).is_ok());
        }
    }

    #[test]
    #[should_panic]
    fn test_random_genome_inverted_length_range_panics() {
        let config = BrainConfig {
            genome_length_min: 12,
            genome_length_max: 8,
            ..BrainConfig::minimal(3, 2)
        };
        assert!(config.validate().is_err());
        let _ = Genome::random(&config, &mut test_rng());
    }

    #[test]
    fn test_random_genome_fixed_length() {
        let config = BrainConfig::default();
        let genome = Genome::random(&config, &mut test_rng());
        assert_eq!(genome.len(), 40);
    }

    #[test]
    fn test_random_genome_deterministic() {
        let config = BrainConfig::minimal(3, 2);
        let a = Genome::random(&config, &mut test_rng());
        let b = Genome::random(&config, &mut test_rng());
        assert_eq!(a, b);
    }

    #[test]
    fn test_neuron_ids_sorted_and_distinct() {
        let genome = Genome::new(vec![
            Gene::new(Sensor, 0, Neuron, 9, 0.5),
            Gene::new(Neuron, 9, Neuron, 2, 0.5),
            Gene::new(Neuron, 2, Action, 1, 0.5),
        ]);
        let ids: Vec<u32> = genome.neuron_ids().into_iter().collect();
        assert_eq!(ids, vec![2, 9]);
        assert_eq!(genome.max_neuron_id(), Some(9));
        assert_eq!(Genome::default().max_neuron_id(), None);
    }

    #[test]
    fn test_validate_rejects_sensor_to_action() {
        let config = BrainConfig::minimal(3, 2);
        let genome = Genome::new(vec![
            Gene::new(Sensor, 0, Neuron, 1, 0.5),
            Gene::new(Sensor, 1, Action, 0, 0.5),
        ]);
        let err = genome.validate(&config).unwrap_err();
        assert_eq!(err.position, 1);
        assert_eq!(err.violation, GeneViolation::SensorToAction);
    }

    #[test]
    fn test_log_line_format() {
        let genome = Genome::new(vec![
            Gene::new(Sensor, 0, Neuron, 5, 1.0),
            Gene::new(Neuron, 5, Action, 0, -0.5),
        ]);
        assert_eq!(genome.to_log_line(), "[[0,0,1,5,1.0],[1,5,2,0,-0.5]]");
        assert_eq!(Genome::default().to_log_line(), "[]");
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = BrainConfig::minimal(3, 2);
        let genome = Genome::random(&config, &mut test_rng());

        let json = serde_json::to_string(&genome).expect("Serialization failed");
        let restored: Genome = serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(genome, restored);
    }
}
