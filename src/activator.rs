//! Recurrent activation of compiled networks.
//!
//! Each call runs a fixed number of synchronous rounds over the neuron
//! state, then reads the actions out of the final state:
//!
//! 1. Per round, a zeroed accumulator collects `w * sensor[src]` from
//!    sensor→neuron edges and `w * state[src]` from neuron→neuron edges. All
//!    reads see the previous round's state; the new state is `tanh(acc)`.
//! 2. Actions sum sensor→action and neuron→action edges against the final
//!    state and pass through `tanh`, clamped strictly inside `(-1, 1)`.
//!
//! The state slice is owned by the caller and is updated in place. Keeping
//! it between calls gives the controller short-term memory.
//!
//! Activation uses no randomness: identical network, input, prior state and
//! iteration count give bit-identical output.

use crate::compiler::{CompiledNetwork, Edge};

/// Largest `f32` below one. `tanh` rounds to exactly `±1.0` once its
/// argument passes about 9, so actions are clamped to this bound.
const ONE_BELOW: f32 = 1.0 - f32::EPSILON / 2.0;

/// The sensor vector does not match the network's sensor count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSizeError {
    /// Sensor count the network was compiled for.
    pub expected: usize,
    /// Length of the vector supplied.
    pub actual: usize,
}

impl std::fmt::Display for InputSizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sensor input length mismatch: expected {}, got {}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for InputSizeError {}

/// Activate `network` and return the action vector.
///
/// # Errors
///
/// Returns [`InputSizeError`] if `sensor_input` does not have
/// `network.num_senses()` entries. The state is left untouched in that case.
///
/// # Panics
///
/// Panics if `state.len()` differs from `network.neuron_count()`.
pub fn activate(
    network: &CompiledNetwork,
    sensor_input: &[f32],
    state: &mut [f32],
    iterations: usize,
) -> Result<Vec<f32>, InputSizeError> {
    let mut outputs = vec![0.0; network.num_actions()];
    activate_into(network, sensor_input, state, iterations, &mut outputs)?;
    Ok(outputs)
}

/// Activate `network`, writing actions into `outputs`.
///
/// Allocation-free apart from one scratch buffer per call, for hot
/// simulation loops.
///
/// # Errors
///
/// Returns [`InputSizeError`] if `sensor_input` does not have
/// `network.num_senses()` entries.
///
/// # Panics
///
/// Panics if `state.len()` differs from `network.neuron_count()` or
/// `outputs.len()` differs from `network.num_actions()`.
pub fn activate_into(
    network: &CompiledNetwork,
    sensor_input: &[f32],
    state: &mut [f32],
    iterations: usize,
    outputs: &mut [f32],
) -> Result<(), InputSizeError> {
    if sensor_input.len() != network.num_senses() {
        return Err(InputSizeError {
            expected: network.num_senses(),
            actual: sensor_input.len(),
        });
    }
    assert_eq!(
        state.len(),
        network.neuron_count(),
        "State length mismatch: expected {}, got {}",
        network.neuron_count(),
        state.len()
    );
    assert_eq!(
        outputs.len(),
        network.num_actions(),
        "Output length mismatch: expected {}, got {}",
        network.num_actions(),
        outputs.len()
    );

    if network.neuron_count() > 0 {
        let mut acc = vec![0.0f32; network.neuron_count()];
        for _ in 0..iterations {
            acc.fill(0.0);
            accumulate(&mut acc, network.sensor_neuron(), sensor_input);
            accumulate(&mut acc, network.neuron_neuron(), state);
            for (s, &a) in state.iter_mut().zip(&acc) {
                *s = a.tanh();
            }
        }
    }

    outputs.fill(0.0);
    accumulate(outputs, network.sensor_action(), sensor_input);
    accumulate(outputs, network.neuron_action(), state);
    for out in outputs.iter_mut() {
        *out = out.tanh().clamp(-ONE_BELOW, ONE_BELOW);
    }

    Ok(())
}

#[inline]
fn accumulate(acc: &mut [f32], edges: &[Edge], source: &[f32]) {
    for edge in edges {
        acc[edge.sink] += edge.weight * source[edge.source];
    }
}
