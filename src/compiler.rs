//! Genome compilation into a minimal recurrent network.
//!
//! Compilation culls every gene that no sensor can reach, remaps the
//! surviving neuron ids onto `0..neuron_count` in ascending order of the
//! original ids, and partitions the edges by endpoint kinds.
//!
//! ## Driven neurons
//!
//! A neuron is *driven* when a sensor reaches it through sensor→neuron and
//! non-self neuron→neuron edges. Sinks of sensor→neuron genes seed the set;
//! neuron→neuron genes then propagate drive from driven sources until a fixed
//! point. A self-loop never drives its own neuron, so a neuron fed only by
//! itself is culled together with everything it touches.
//!
//! ## Determinism
//!
//! Each edge list keeps genome order, so summation order during activation
//! is fixed by the genome alone.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::BrainConfig;
use crate::gene::{EndpointKind, Gene, GeneViolation, InvalidGeneError};
use crate::genome::Genome;

/// One compiled edge. Neuron indices are compact (post-remap).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Sensor channel or compact neuron index.
    pub source: usize,
    /// Compact neuron index or action channel.
    pub sink: usize,
    /// Edge weight.
    pub weight: f32,
}

/// Read-only view of a compiled edge with its endpoint kinds, for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    /// `Sensor` or `Neuron`.
    pub source_kind: EndpointKind,
    /// Sensor channel or compact neuron index.
    pub source_index: usize,
    /// `Neuron` or `Action`.
    pub sink_kind: EndpointKind,
    /// Compact neuron index or action channel.
    pub sink_index: usize,
    /// Edge weight.
    pub weight: f32,
}

/// The culled, remapped, partitioned form of a genome.
///
/// Rebuilt whenever the owning genome changes; never edited in place.
/// Deserialization rejects networks whose edges point outside their
/// sensor, neuron or action ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNetwork")]
pub struct CompiledNetwork {
    num_senses: usize,
    num_actions: usize,
    /// Original neuron id for each compact index, ascending.
    original_ids: Vec<u32>,
    sensor_neuron: Vec<Edge>,
    neuron_neuron: Vec<Edge>,
    sensor_action: Vec<Edge>,
    neuron_action: Vec<Edge>,
}

impl CompiledNetwork {
    /// A network with no neurons and no edges; activation yields zeros.
    #[must_use]
    pub fn empty(num_senses: usize, num_actions: usize) -> Self {
        Self {
            num_senses,
            num_actions,
            original_ids: Vec::new(),
            sensor_neuron: Vec::new(),
            neuron_neuron: Vec::new(),
            sensor_action: Vec::new(),
            neuron_action: Vec::new(),
        }
    }

    /// Number of neurons that survived culling.
    #[inline]
    #[must_use]
    pub fn neuron_count(&self) -> usize {
        self.original_ids.len()
    }

    /// Expected sensor vector length.
    #[inline]
    #[must_use]
    pub const fn num_senses(&self) -> usize {
        self.num_senses
    }

    /// Produced action vector length.
    #[inline]
    #[must_use]
    pub const fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Sensor→neuron edges.
    #[must_use]
    pub fn sensor_neuron(&self) -> &[Edge] {
        &self.sensor_neuron
    }

    /// Neuron→neuron edges.
    #[must_use]
    pub fn neuron_neuron(&self) -> &[Edge] {
        &self.neuron_neuron
    }

    /// Sensor→action edges.
    #[must_use]
    pub fn sensor_action(&self) -> &[Edge] {
        &self.sensor_action
    }

    /// Neuron→action edges.
    #[must_use]
    pub fn neuron_action(&self) -> &[Edge] {
        &self.neuron_action
    }

    /// Total number of compiled edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.sensor_neuron.len()
            + self.neuron_neuron.len()
            + self.sensor_action.len()
            + self.neuron_action.len()
    }

    /// Whether the network has no neurons and no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neuron_count() == 0 && self.edge_count() == 0
    }

    /// Original (pre-compile) id of a compact neuron index.
    #[must_use]
    pub fn original_id(&self, compact: usize) -> Option<u32> {
        self.original_ids.get(compact).copied()
    }

    /// Compact index of an original neuron id, if it survived.
    #[must_use]
    pub fn compact_id(&self, original: u32) -> Option<usize> {
        self.original_ids.binary_search(&original).ok()
    }

    /// Every edge with its endpoint kinds, list by list.
    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        use EndpointKind::{Action, Neuron, Sensor};

        tagged(Sensor, Neuron, &self.sensor_neuron)
            .chain(tagged(Neuron, Neuron, &self.neuron_neuron))
            .chain(tagged(Sensor, Action, &self.sensor_action))
            .chain(tagged(Neuron, Action, &self.neuron_action))
    }
}

/// Unchecked wire form of [`CompiledNetwork`].
#[derive(Deserialize)]
struct RawNetwork {
    num_senses: usize,
    num_actions: usize,
    original_ids: Vec<u32>,
    sensor_neuron: Vec<Edge>,
    neuron_neuron: Vec<Edge>,
    sensor_action: Vec<Edge>,
    neuron_action: Vec<Edge>,
}

impl TryFrom<RawNetwork> for CompiledNetwork {
    type Error = String;

    fn try_from(raw: RawNetwork) -> Result<Self, Self::Error> {
        if !raw.original_ids.windows(2).all(|w| w[0] < w[1]) {
            return Err("original_ids must be strictly ascending".to_string());
        }

        let neurons = raw.original_ids.len();
        let lists = [
            ("sensor_neuron", &raw.sensor_neuron, raw.num_senses, neurons),
            ("neuron_neuron", &raw.neuron_neuron, neurons, neurons),
            ("sensor_action", &raw.sensor_action, raw.num_senses, raw.num_actions),
            ("neuron_action", &raw.neuron_action, neurons, raw.num_actions),
        ];
        for (name, edges, source_bound, sink_bound) in lists {
            if let Some(e) = edges
                .iter()
                .find(|e| e.source >= source_bound || e.sink >= sink_bound)
            {
                return Err(format!(
                    "{name} edge {} -> {} outside {source_bound} x {sink_bound}",
                    e.source, e.sink
                ));
            }
        }

        Ok(Self {
            num_senses: raw.num_senses,
            num_actions: raw.num_actions,
            original_ids: raw.original_ids,
            sensor_neuron: raw.sensor_neuron,
            neuron_neuron: raw.neuron_neuron,
            sensor_action: raw.sensor_action,
            neuron_action: raw.neuron_action,
        })
    }
}

fn tagged(
    source_kind: EndpointKind,
    sink_kind: EndpointKind,
    edges: &[Edge],
) -> impl Iterator<Item = Connection> + '_ {
    edges.iter().map(move |e| Connection {
        source_kind,
        source_index: e.source,
        sink_kind,
        sink_index: e.sink,
        weight: e.weight,
    })
}

/// Compile a genome into a [`CompiledNetwork`].
///
/// # Errors
///
/// Returns [`InvalidGeneError`] if any gene is outside the configured bounds.
/// Sensor→action genes are accepted and compiled into the sensor→action list.
pub fn compile(genome: &Genome, config: &BrainConfig) -> Result<CompiledNetwork, InvalidGeneError> {
    check_bounds(genome, config)?;

    let survivors = cull(genome);

    let original_ids: Vec<u32> = survivors
        .iter()
        .flat_map(|g| [g.source_neuron(), g.sink_neuron()])
        .flatten()
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect();
    let remap: BTreeMap<u32, usize> = original_ids
        .iter()
        .enumerate()
        .map(|(compact, &id)| (id, compact))
        .collect();

    let mut network = CompiledNetwork::empty(config.num_senses as usize, config.num_actions as usize);

    for gene in &survivors {
        let source = match gene.source_kind {
            EndpointKind::Neuron => remap[&gene.source_index],
            _ => gene.source_index as usize,
        };
        let sink = match gene.sink_kind {
            EndpointKind::Neuron => remap[&gene.sink_index],
            _ => gene.sink_index as usize,
        };
        let edge = Edge {
            source,
            sink,
            weight: gene.weight,
        };

        let list = match (gene.source_kind, gene.sink_kind) {
            (EndpointKind::Sensor, EndpointKind::Neuron) => &mut network.sensor_neuron,
            (EndpointKind::Neuron, EndpointKind::Neuron) => &mut network.neuron_neuron,
            (EndpointKind::Sensor, EndpointKind::Action) => &mut network.sensor_action,
            (EndpointKind::Neuron, EndpointKind::Action) => &mut network.neuron_action,
            // Ruled out by check_bounds.
            _ => continue,
        };
        list.push(edge);
    }
    network.original_ids = original_ids;

    log::debug!(
        "compiled {} genes: {} culled, {} neurons, remap {:?}",
        genome.len(),
        genome.len() - survivors.len(),
        network.neuron_count(),
        remap
    );

    Ok(network)
}

/// The genes that survive culling, in genome order, with original ids.
#[must_use]
pub fn cull(genome: &Genome) -> Vec<Gene> {
    let driven = driven_neurons(genome);
    let is_driven = |id: u32| driven.contains(&id);

    genome
        .iter()
        .filter(|g| {
            let source_ok = g.source_neuron().map_or(true, is_driven);
            match g.sink_kind {
                EndpointKind::Action => source_ok,
                EndpointKind::Neuron => is_driven(g.sink_index) && source_ok,
                EndpointKind::Sensor => false,
            }
        })
        .copied()
        .collect()
}

/// Neuron ids reachable from some sensor through non-self edges.
#[must_use]
pub fn driven_neurons(genome: &Genome) -> BTreeSet<u32> {
    let mut driven: BTreeSet<u32> = genome
        .iter()
        .filter(|g| g.source_kind == EndpointKind::Sensor)
        .filter_map(Gene::sink_neuron)
        .collect();

    let links: Vec<(u32, u32)> = genome
        .iter()
        .filter(|g| !g.is_self_loop())
        .filter_map(|g| Some((g.source_neuron()?, g.sink_neuron()?)))
        .collect();

    // Full passes until nothing changes; the set only grows and is bounded
    // by the distinct ids in the genome.
    let mut changed = true;
    while changed {
        changed = false;
        for &(source, sink) in &links {
            if driven.contains(&source) && driven.insert(sink) {
                changed = true;
            }
        }
    }

    driven
}

fn check_bounds(genome: &Genome, config: &BrainConfig) -> Result<(), InvalidGeneError> {
    for (position, gene) in genome.iter().enumerate() {
        gene.check(config)
            .map_err(|violation: GeneViolation| InvalidGeneError {
                position,
                gene: *gene,
                violation,
            })?;
    }
    Ok(())
}
