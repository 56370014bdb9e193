//! Structure-preserving genome mutation.
//!
//! [`mutate`] draws exactly one [`MutationKind`] by the configured weights and
//! returns a new child genome; the parent is never touched. Every gene in
//! the child stays within its kind's index bound, keeps a weight in `[-1, 1]`,
//! and a sensor source always feeds a neuron. Reachability is not checked:
//! a child may carry undriven neurons, which the compiler culls.

use rand::Rng;

use crate::config::{BrainConfig, WeightPolicy};
use crate::gene::{random_index, random_weight, EndpointKind, Gene};
use crate::genome::Genome;
use crate::neuron_id::NeuronIdAllocator;

/// A single mutation operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Add a sensor→neuron edge to a fresh neuron, or a neuron→action edge.
    AddConnection,
    /// Add a neuron→neuron edge from an existing neuron to a fresh one.
    AddNeuronConnection,
    /// Re-randomize one field of one gene.
    EditConnection,
    /// Delete one gene.
    RemoveConnection,
}

impl MutationKind {
    /// All operators.
    pub const ALL: [Self; 4] = [
        Self::AddConnection,
        Self::AddNeuronConnection,
        Self::EditConnection,
        Self::RemoveConnection,
    ];

    /// Whether the operator only adds genes.
    #[must_use]
    pub const fn is_additive(self) -> bool {
        matches!(self, Self::AddConnection | Self::AddNeuronConnection)
    }

    fn weight(self, config: &BrainConfig) -> f32 {
        let w = &config.mutation_weights;
        match self {
            Self::AddConnection => w.add_connection,
            Self::AddNeuronConnection => w.add_neuron_connection,
            Self::EditConnection => w.edit_connection,
            Self::RemoveConnection => w.remove_connection,
        }
    }
}

/// A gene field targeted by [`MutationKind::EditConnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneField {
    /// Flip between sensor and neuron source, redrawing the index.
    SourceKind,
    /// Redraw the source index within its kind's bound.
    SourceIndex,
    /// Flip between neuron and action sink; a sensor source keeps a neuron.
    SinkKind,
    /// Redraw the sink index within its kind's bound.
    SinkIndex,
    /// Perturb or reroll the weight per [`WeightPolicy`].
    Weight,
}

impl GeneField {
    /// All fields.
    pub const ALL: [Self; 5] = [
        Self::SourceKind,
        Self::SourceIndex,
        Self::SinkKind,
        Self::SinkIndex,
        Self::Weight,
    ];
}

impl Genome {
    /// Produce a mutated child. Shorthand for [`mutate`].
    #[must_use]
    pub fn mutate<R: Rng>(&self, config: &BrainConfig, rng: &mut R) -> Genome {
        mutate(self, config, rng)
    }
}

/// Produce a child genome by applying one randomly chosen operator.
pub fn mutate<R: Rng>(parent: &Genome, config: &BrainConfig, rng: &mut R) -> Genome {
    let kind = choose_kind(parent, config, rng);
    mutate_with(parent, kind, config, rng)
}

/// Draw an operator by the configured weights.
///
/// For an empty parent only additive operators are considered; editing or
/// removing would be a no-op.
pub fn choose_kind<R: Rng>(parent: &Genome, config: &BrainConfig, rng: &mut R) -> MutationKind {
    let candidates: Vec<(MutationKind, f32)> = MutationKind::ALL
        .into_iter()
        .filter(|k| !parent.is_empty() || k.is_additive())
        .map(|k| (k, k.weight(config).max(0.0)))
        .collect();

    let total: f32 = candidates.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return MutationKind::AddConnection;
    }

    let mut roll = rng.random::<f32>() * total;
    for &(kind, weight) in &candidates {
        if roll < weight {
            return kind;
        }
        roll -= weight;
    }
    // Rounding can leave a sliver past the last bucket.
    candidates
        .iter()
        .rev()
        .find(|(_, w)| *w > 0.0)
        .map_or(MutationKind::AddConnection, |(k, _)| *k)
}

/// Produce a child genome by applying a specific operator.
pub fn mutate_with<R: Rng>(
    parent: &Genome,
    kind: MutationKind,
    config: &BrainConfig,
    rng: &mut R,
) -> Genome {
    let mut m = Mutator::new(parent, config, rng);
    match kind {
        MutationKind::AddConnection => m.add_connection(),
        MutationKind::AddNeuronConnection => m.add_neuron_connection(),
        MutationKind::EditConnection => {
            if !m.genes.is_empty() {
                let position = m.rng.random_range(0..m.genes.len());
                let field = GeneField::ALL[m.rng.random_range(0..GeneField::ALL.len())];
                m.edit(position, field);
            }
        }
        MutationKind::RemoveConnection => m.remove_connection(),
    }
    log::trace!(
        "{kind:?}: {} -> {} genes",
        parent.len(),
        m.genes.len()
    );
    Genome::new(m.genes)
}

/// Re-randomize one field of the gene at `position`.
///
/// Out-of-range positions leave the genome unchanged.
pub fn edit_connection<R: Rng>(
    parent: &Genome,
    position: usize,
    field: GeneField,
    config: &BrainConfig,
    rng: &mut R,
) -> Genome {
    let mut m = Mutator::new(parent, config, rng);
    if position < m.genes.len() {
        m.edit(position, field);
    }
    Genome::new(m.genes)
}

/// Working state for one mutation event.
struct Mutator<'a, R: Rng> {
    config: &'a BrainConfig,
    rng: &'a mut R,
    genes: Vec<Gene>,
    /// Neuron ids present in the parent, ascending.
    existing: Vec<u32>,
    alloc: NeuronIdAllocator,
}

impl<'a, R: Rng> Mutator<'a, R> {
    fn new(parent: &Genome, config: &'a BrainConfig, rng: &'a mut R) -> Self {
        let used = parent.neuron_ids();
        Self {
            config,
            rng,
            genes: parent.genes().to_vec(),
            existing: used.iter().copied().collect(),
            alloc: NeuronIdAllocator::from_used(used, config.max_neuron_id),
        }
    }

    fn add_connection(&mut self) {
        let weight = random_weight(self.rng);
        let gene = if self.rng.random::<f32>() < self.config.sensor_connection_prob {
            let sensor = random_index(EndpointKind::Sensor, self.config, self.rng);
            let neuron = self.fresh_neuron();
            Gene::new(EndpointKind::Sensor, sensor, EndpointKind::Neuron, neuron, weight)
        } else {
            let neuron = self.existing_neuron();
            let action = random_index(EndpointKind::Action, self.config, self.rng);
            Gene::new(EndpointKind::Neuron, neuron, EndpointKind::Action, action, weight)
        };
        self.genes.push(gene);
    }

    fn add_neuron_connection(&mut self) {
        let source = self.existing_neuron();
        self.alloc.reserve(source);
        let sink = self.fresh_neuron();
        let weight = random_weight(self.rng);
        self.genes.push(Gene::new(
            EndpointKind::Neuron,
            source,
            EndpointKind::Neuron,
            sink,
            weight,
        ));
    }

    fn remove_connection(&mut self) {
        if self.genes.is_empty() {
            return;
        }
        let position = self.rng.random_range(0..self.genes.len());
        self.genes.remove(position);
    }

    fn edit(&mut self, position: usize, field: GeneField) {
        let mut gene = self.genes[position];

        match field {
            GeneField::SourceKind => {
                let kind = if self.rng.random::<bool>() {
                    EndpointKind::Sensor
                } else {
                    EndpointKind::Neuron
                };
                if kind != gene.source_kind {
                    gene.source_kind = kind;
                    gene.source_index = self.index_for(kind);
                }
                if kind == EndpointKind::Sensor && gene.sink_kind == EndpointKind::Action {
                    gene.sink_kind = EndpointKind::Neuron;
                    gene.sink_index = self.neuron_index();
                }
            }
            GeneField::SourceIndex => {
                gene.source_index = self.index_for(gene.source_kind);
            }
            GeneField::SinkKind => {
                // A sensor source pins the sink to a neuron.
                let kind = if gene.source_kind == EndpointKind::Sensor || self.rng.random::<bool>() {
                    EndpointKind::Neuron
                } else {
                    EndpointKind::Action
                };
                if kind != gene.sink_kind {
                    gene.sink_kind = kind;
                    gene.sink_index = self.index_for(kind);
                }
            }
            GeneField::SinkIndex => {
                gene.sink_index = self.index_for(gene.sink_kind);
            }
            GeneField::Weight => {
                gene.weight = match self.config.weight_policy {
                    WeightPolicy::Perturb { power } => {
                        let delta = (self.rng.random::<f32>() * 2.0 - 1.0) * power;
                        (gene.weight + delta).clamp(-1.0, 1.0)
                    }
                    WeightPolicy::Reroll => random_weight(self.rng),
                };
            }
        }

        self.genes[position] = gene;
    }

    /// A fresh index within the bound of `kind`.
    fn index_for(&mut self, kind: EndpointKind) -> u32 {
        match kind {
            EndpointKind::Neuron => self.neuron_index(),
            _ => random_index(kind, self.config, self.rng),
        }
    }

    /// Existing neuron id or a fresh one.
    fn neuron_index(&mut self) -> u32 {
        if self.existing.is_empty() || self.rng.random::<f32>() < self.config.fresh_neuron_prob {
            self.fresh_neuron()
        } else {
            self.existing_neuron()
        }
    }

    /// A freshly allocated id, or an existing one once the id range is full.
    fn fresh_neuron(&mut self) -> u32 {
        match self.alloc.allocate() {
            Some(id) => id,
            None => self.existing_neuron(),
        }
    }

    /// A uniformly chosen id from the parent, or `0` if it has none.
    fn existing_neuron(&mut self) -> u32 {
        if self.existing.is_empty() {
            0
        } else {
            self.existing[self.rng.random_range(0..self.existing.len())]
        }
    }
}
