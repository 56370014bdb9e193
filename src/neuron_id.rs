//! Fresh neuron id allocation for mutation.
//!
//! A single mutation event may need more than one new neuron id. Recomputing
//! `max(used) + 1` for each request hands out the same id twice, so the
//! allocator is seeded once from the parent genome and threaded through the
//! whole event:
//!
//! - The first fresh id is `max(used) + 1`; later ones strictly increase.
//! - Ids never exceed the configured `max_neuron_id`. Once the top of the range
//!   is reached, the lowest id unused by the genome and the current event is
//!   handed out instead.
//! - When every id in `0..=max_neuron_id` is taken, allocation returns `None`.

use std::collections::BTreeSet;

use crate::genome::Genome;

/// Hands out neuron ids not used by a genome or earlier in the same event.
#[derive(Debug, Clone)]
pub struct NeuronIdAllocator {
    used: BTreeSet<u32>,
    next: u64,
    max_id: u32,
}

impl NeuronIdAllocator {
    /// Seed from the ids already present in `genome`.
    #[must_use]
    pub fn for_genome(genome: &Genome, max_id: u32) -> Self {
        Self::from_used(genome.neuron_ids(), max_id)
    }

    /// Seed from an explicit set of used ids.
    #[must_use]
    pub fn from_used(used: BTreeSet<u32>, max_id: u32) -> Self {
        let next = used.last().map_or(0, |&max| u64::from(max) + 1);
        Self { used, next, max_id }
    }

    /// Mark an id as taken without allocating it.
    pub fn reserve(&mut self, id: u32) {
        self.used.insert(id);
    }

    /// Whether `id` is already used by the genome or this event.
    #[must_use]
    pub fn is_used(&self, id: u32) -> bool {
        self.used.contains(&id)
    }

    /// Ids known to the allocator, ascending.
    pub fn used(&self) -> impl Iterator<Item = u32> + '_ {
        self.used.iter().copied()
    }

    /// Allocate a fresh id.
    pub fn allocate(&mut self) -> Option<u32> {
        while self.next <= u64::from(self.max_id) {
            let candidate = self.next as u32;
            self.next += 1;
            if self.used.insert(candidate) {
                return Some(candidate);
            }
        }

        let gap = (0..=self.max_id).find(|id| !self.used.contains(id))?;
        self.used.insert(gap);
        Some(gap)
    }
}
