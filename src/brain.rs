//! Controller instances.
//!
//! A [`Brain`] owns one genome, the network compiled from it, and the
//! persistent neuron state that network runs on. It is built once per agent
//! and discarded with it; a changed genome means a new `Brain`.

use crate::activator::{activate_into, InputSizeError};
use crate::compiler::{compile, CompiledNetwork};
use crate::config::BrainConfig;
use crate::gene::InvalidGeneError;
use crate::genome::Genome;

/// One agent's controller.
///
/// The neuron state is private: collaborators feed sensors and read actions
/// only. Activation takes `&mut self`, so calls on one brain are sequential;
/// distinct brains share nothing and may run on different threads.
#[derive(Debug, Clone)]
pub struct Brain {
    genome: Genome,
    network: CompiledNetwork,
    state: Vec<f32>,
    iterations: usize,
}

impl Brain {
    /// Compile `genome` and start from an all-zero neuron state.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidGeneError`] if a gene is outside the configured bounds.
    pub fn new(genome: Genome, config: &BrainConfig) -> Result<Self, InvalidGeneError> {
        let network = compile(&genome, config)?;
        let state = vec![0.0; network.neuron_count()];
        Ok(Self {
            genome,
            network,
            state,
            iterations: config.activation_iterations,
        })
    }

    /// Run one activation and return the action vector.
    ///
    /// The neuron state carries over to the next call.
    ///
    /// # Errors
    ///
    /// Returns [`InputSizeError`] if `sensor_input` has the wrong length.
    pub fn activate(&mut self, sensor_input: &[f32]) -> Result<Vec<f32>, InputSizeError> {
        let mut outputs = vec![0.0; self.network.num_actions()];
        self.activate_into(sensor_input, &mut outputs)?;
        Ok(outputs)
    }

    /// Run one activation, writing actions into `outputs`.
    ///
    /// # Errors
    ///
    /// Returns [`InputSizeError`] if `sensor_input` has the wrong length.
    ///
    /// # Panics
    ///
    /// Panics if `outputs.len()` differs from the configured action count.
    pub fn activate_into(
        &mut self,
        sensor_input: &[f32],
        outputs: &mut [f32],
    ) -> Result<(), InputSizeError> {
        activate_into(
            &self.network,
            sensor_input,
            &mut self.state,
            self.iterations,
            outputs,
        )
    }

    /// Zero the neuron state, forgetting everything seen so far.
    pub fn reset_state(&mut self) {
        self.state.fill(0.0);
    }

    /// The genome this brain was built from.
    #[must_use]
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// The compiled network, for rendering and diagnostics.
    #[must_use]
    pub fn network(&self) -> &CompiledNetwork {
        &self.network
    }

    /// Number of live neurons.
    #[must_use]
    pub fn neuron_count(&self) -> usize {
        self.network.neuron_count()
    }

    /// Rounds per activation call.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// Give back the genome, e.g. to mutate it for offspring.
    #[must_use]
    pub fn into_genome(self) -> Genome {
        self.genome
    }
}
