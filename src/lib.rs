//! # Neurogene
//!
//! Evolvable recurrent controllers for simulated agents: a genome of typed,
//! weighted edges is compiled into a compact network, activated once per
//! simulation step, and mutated one edit at a time to produce offspring.
//!
//! ## Features
//!
//! - **Edge-List Genomes**: A genome is an ordered list of
//!   `(source, sink, weight)` genes between sensors, hidden neurons and actions
//! - **Culling Compiler**: Genes that cannot be reached from any sensor are
//!   dropped and surviving neuron ids are packed into `0..neuron_count`
//! - **Recurrent Activation**: Synchronous `tanh` rounds over a persistent
//!   neuron state give each controller short-term memory
//! - **Single-Edit Mutation**: Exactly one structure-preserving operator per
//!   child, with a monotonic fresh-id allocator
//!
//! ## Quick Start
//!
//! ```rust
//! use neurogene::{Brain, BrainConfig, Genome};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let config = BrainConfig::minimal(3, 2);
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let genome = Genome::random(&config, &mut rng);
//!
//! // Compile once, then activate every step
//! let mut brain = Brain::new(genome, &config).unwrap();
//! let actions = brain.activate(&[0.5, -0.2, 1.0]).unwrap();
//! assert_eq!(actions.len(), 2);
//!
//! // Offspring differ from the parent by one edit
//! let child = brain.genome().mutate(&config, &mut rng);
//! assert!(child.validate(&config).is_ok());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! mutation ──► Genome ──► compiler ──► CompiledNetwork ──► activator
//!                                                   (every step, state kept)
//! ```
//!
//! The compiler and the mutation engine never call each other. A
//! [`Brain`] bundles a genome with its compiled network and neuron state;
//! [`NetworkTopology`] answers structural questions about a compiled network
//! for diagnostics and diagram rendering.

pub mod activator;
pub mod brain;
pub mod compiler;
pub mod config;
pub mod gene;
pub mod genome;
pub mod mutation;
pub mod neuron_id;
pub mod topology;

// Re-exports for convenience
pub use activator::{activate, activate_into, InputSizeError};
pub use brain::Brain;
pub use compiler::{compile, cull, driven_neurons, CompiledNetwork, Connection, Edge};
pub use config::{BrainConfig, ConfigError, MutationWeights, WeightPolicy};
pub use gene::{EndpointKind, Gene, GeneViolation, InvalidGeneError};
pub use genome::Genome;
pub use mutation::{choose_kind, edit_connection, mutate, mutate_with, GeneField, MutationKind};
pub use neuron_id::NeuronIdAllocator;
pub use topology::{Cluster, NetworkTopology};
