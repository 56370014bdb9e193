//! Graph analysis over compiled networks using CSR format.
//!
//! [`NetworkTopology`] snapshots the neuron→neuron edges of a
//! [`CompiledNetwork`] in Compressed Sparse Row form, plus which neurons are
//! fed by sensors and which feed actions. It answers the structural
//! questions the compiler's guarantees are stated in (is every neuron
//! reachable from a sensor?) and groups neurons into the clusters a diagram
//! renderer draws one at a time.
//!
//! Nodes are compact neuron indices `0..neuron_count`; sensors and actions
//! are tracked as per-neuron attachments rather than nodes.

use std::collections::{BTreeSet, VecDeque};

use crate::compiler::{CompiledNetwork, Edge};

/// CSR-format view of a compiled network's neuron graph.
#[derive(Debug, Clone)]
pub struct NetworkTopology {
    node_count: usize,
    /// CSR offsets for outgoing edges. Length = node_count + 1.
    fwd_offsets: Vec<usize>,
    /// fwd_targets[fwd_offsets[i]..fwd_offsets[i+1]] are successors of neuron i.
    fwd_targets: Vec<usize>,
    /// CSR offsets for incoming edges. Length = node_count + 1.
    rev_offsets: Vec<usize>,
    /// rev_sources[rev_offsets[i]..rev_offsets[i+1]] are predecessors of neuron i.
    rev_sources: Vec<usize>,
    /// Sensor channels feeding each neuron, ascending and distinct.
    sensor_inputs: Vec<Vec<usize>>,
    /// Action channels each neuron feeds, ascending and distinct.
    action_outputs: Vec<Vec<usize>>,
}

/// A connected group of neurons with the sensors and actions attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cluster {
    /// Compact neuron indices, ascending.
    pub neurons: Vec<usize>,
    /// Sensor channels feeding the cluster.
    pub sensors: Vec<usize>,
    /// Action channels the cluster feeds.
    pub actions: Vec<usize>,
}

impl Cluster {
    /// Whether the cluster links at least one sensor to at least one action.
    #[must_use]
    pub fn has_sensor_and_action(&self) -> bool {
        !self.sensors.is_empty() && !self.actions.is_empty()
    }
}

impl NetworkTopology {
    /// Build the topology of `network`.
    #[must_use]
    pub fn from_network(network: &CompiledNetwork) -> Self {
        let node_count = network.neuron_count();
        let edges = network.neuron_neuron();

        let (fwd_offsets, fwd_targets) = build_csr(node_count, edges, |e| (e.source, e.sink));
        let (rev_offsets, rev_sources) = build_csr(node_count, edges, |e| (e.sink, e.source));

        let mut sensor_inputs: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); node_count];
        for e in network.sensor_neuron() {
            sensor_inputs[e.sink].insert(e.source);
        }
        let mut action_outputs: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); node_count];
        for e in network.neuron_action() {
            action_outputs[e.source].insert(e.sink);
        }

        Self {
            node_count,
            fwd_offsets,
            fwd_targets,
            rev_offsets,
            rev_sources,
            sensor_inputs: sensor_inputs.into_iter().map(|s| s.into_iter().collect()).collect(),
            action_outputs: action_outputs.into_iter().map(|s| s.into_iter().collect()).collect(),
        }
    }

    /// Number of neurons.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Iterate over successors of a neuron.
    #[inline]
    pub fn successors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        let start = self.fwd_offsets[idx];
        let end = self.fwd_offsets[idx + 1];
        self.fwd_targets[start..end].iter().copied()
    }

    /// Iterate over predecessors of a neuron.
    #[inline]
    pub fn predecessors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        let start = self.rev_offsets[idx];
        let end = self.rev_offsets[idx + 1];
        self.rev_sources[start..end].iter().copied()
    }

    /// Sensor channels feeding a neuron directly.
    #[must_use]
    pub fn sensor_inputs(&self, idx: usize) -> &[usize] {
        &self.sensor_inputs[idx]
    }

    /// Action channels a neuron feeds directly.
    #[must_use]
    pub fn action_outputs(&self, idx: usize) -> &[usize] {
        &self.action_outputs[idx]
    }

    /// For each neuron, whether a sensor reaches it through neuron→neuron edges.
    ///
    /// A network straight out of the compiler is reachable everywhere.
    #[must_use]
    pub fn sensor_reachable(&self) -> Vec<bool> {
        let seeds = (0..self.node_count).filter(|&i| !self.sensor_inputs[i].is_empty());
        self.flood(seeds, |topo, idx| topo.successors(idx).collect())
    }

    /// For each neuron, whether it reaches an action through neuron→neuron edges.
    #[must_use]
    pub fn action_reaching(&self) -> Vec<bool> {
        let seeds = (0..self.node_count).filter(|&i| !self.action_outputs[i].is_empty());
        self.flood(seeds, |topo, idx| topo.predecessors(idx).collect())
    }

    /// Whether the neuron graph contains a cycle (self-loops included),
    /// using Kahn's algorithm.
    #[must_use]
    pub fn has_recurrence(&self) -> bool {
        let mut in_degree: Vec<usize> = (0..self.node_count)
            .map(|idx| self.rev_offsets[idx + 1] - self.rev_offsets[idx])
            .collect();

        let mut queue: VecDeque<usize> = (0..self.node_count)
            .filter(|&idx| in_degree[idx] == 0)
            .collect();

        let mut processed = 0;
        while let Some(u) = queue.pop_front() {
            processed += 1;
            for v in self.successors(u) {
                in_degree[v] -= 1;
                if in_degree[v] == 0 {
                    queue.push_back(v);
                }
            }
        }

        processed != self.node_count
    }

    /// Weakly connected groups of neurons.
    ///
    /// Neurons that cannot reach any action are left out of their cluster, as
    /// they have nothing to show. Clusters are ordered by their lowest neuron.
    #[must_use]
    pub fn clusters(&self) -> Vec<Cluster> {
        let useful = self.action_reaching();
        let mut visited = vec![false; self.node_count];
        let mut clusters = Vec::new();

        for start in 0..self.node_count {
            if visited[start] {
                continue;
            }

            let mut component = Vec::new();
            let mut stack = vec![start];
            visited[start] = true;
            while let Some(node) = stack.pop() {
                component.push(node);
                for next in self.successors(node).chain(self.predecessors(node)) {
                    if !visited[next] {
                        visited[next] = true;
                        stack.push(next);
                    }
                }
            }
            component.sort_unstable();

            let mut sensors = BTreeSet::new();
            let mut actions = BTreeSet::new();
            let mut neurons = Vec::new();
            for &n in &component {
                sensors.extend(self.sensor_inputs[n].iter().copied());
                if useful[n] {
                    actions.extend(self.action_outputs[n].iter().copied());
                    neurons.push(n);
                }
            }

            if !neurons.is_empty() {
                clusters.push(Cluster {
                    neurons,
                    sensors: sensors.into_iter().collect(),
                    actions: actions.into_iter().collect(),
                });
            }
        }

        clusters
    }

    /// Clusters that link a sensor to an action.
    #[must_use]
    pub fn active_clusters(&self) -> Vec<Cluster> {
        self.clusters()
            .into_iter()
            .filter(Cluster::has_sensor_and_action)
            .collect()
    }

    fn flood<I, F>(&self, seeds: I, next: F) -> Vec<bool>
    where
        I: Iterator<Item = usize>,
        F: Fn(&Self, usize) -> Vec<usize>,
    {
        let mut reached = vec![false; self.node_count];
        let mut queue = VecDeque::new();
        for seed in seeds {
            reached[seed] = true;
            queue.push_back(seed);
        }

        while let Some(current) = queue.pop_front() {
            for n in next(self, current) {
                if !reached[n] {
                    reached[n] = true;
                    queue.push_back(n);
                }
            }
        }

        reached
    }
}

/// Build CSR `(offsets, targets)` keyed by the first element of `key(edge)`.
///
/// Edges keep their list order within each row.
fn build_csr<F>(node_count: usize, edges: &[Edge], key: F) -> (Vec<usize>, Vec<usize>)
where
    F: Fn(&Edge) -> (usize, usize),
{
    let mut counts = vec![0usize; node_count];
    for e in edges {
        counts[key(e).0] += 1;
    }

    let mut offsets = Vec::with_capacity(node_count + 1);
    let mut total = 0;
    offsets.push(total);
    for &count in &counts {
        total += count;
        offsets.push(total);
    }

    let mut targets = vec![0usize; total];
    let mut write_pos = offsets[..node_count].to_vec();
    for e in edges {
        let (row, target) = key(e);
        targets[write_pos[row]] = target;
        write_pos[row] += 1;
    }

    (offsets, targets)
}
