//! Integration tests for neurogene.

use std::collections::BTreeSet;

use neurogene::{
    activate, choose_kind, compile, cull, driven_neurons, mutate_with, Brain, BrainConfig,
    EndpointKind::*, Gene, Genome, MutationKind, NetworkTopology, WeightPolicy,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_inputs(n: usize, rng: &mut ChaCha8Rng) -> Vec<f32> {
    (0..n).map(|_| rng.random_range(-1.0..=1.0)).collect()
}

#[test]
fn test_scenario_single_neuron_memory() {
    let config = BrainConfig {
        activation_iterations: 1,
        ..BrainConfig::minimal(1, 1)
    };
    let genome = Genome::new(vec![
        Gene::new(Sensor, 0, Neuron, 5, 1.0),
        Gene::new(Neuron, 5, Neuron, 5, 1.0),
        Gene::new(Neuron, 5, Action, 0, 1.0),
    ]);

    let mut brain = Brain::new(genome, &config).unwrap();
    assert_eq!(brain.neuron_count(), 1);
    assert_eq!(brain.network().original_id(0), Some(5));

    let out = brain.activate(&[1.0]).unwrap();
    assert!((out[0] - 0.6420).abs() < 1e-4, "got {}", out[0]);
}

#[test]
fn test_scenario_pure_self_loop_is_empty() {
    let config = BrainConfig::minimal(1, 1);
    let genome = Genome::new(vec![Gene::new(Neuron, 5, Neuron, 5, 1.0)]);

    let mut brain = Brain::new(genome, &config).unwrap();
    assert_eq!(brain.neuron_count(), 0);
    assert!(brain.network().is_empty());
    assert_eq!(brain.activate(&[1.0]).unwrap(), vec![0.0]);
}

#[test]
fn test_scenario_remove_from_empty_genome() {
    let config = BrainConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let child = mutate_with(&Genome::default(), MutationKind::RemoveConnection, &config, &mut rng);
    assert!(child.is_empty());
}

#[test]
fn test_empty_genome_only_draws_additive_operators() {
    let config = BrainConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(21);

    for _ in 0..200 {
        let kind = choose_kind(&Genome::default(), &config, &mut rng);
        assert!(kind.is_additive(), "{kind:?}");
        assert!(!mutate_with(&Genome::default(), kind, &config, &mut rng).is_empty());
    }
}

#[test]
fn test_culling_is_idempotent() {
    let config = BrainConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for _ in 0..500 {
        let genome = Genome::random(&config, &mut rng);
        let survivors = Genome::new(cull(&genome));

        assert_eq!(cull(&survivors), survivors.genes());
        assert_eq!(
            compile(&genome, &config).unwrap(),
            compile(&survivors, &config).unwrap()
        );
    }
}

#[test]
fn test_every_neuron_is_sensor_reachable() {
    let config = BrainConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for _ in 0..500 {
        let genome = Genome::random(&config, &mut rng);
        let network = compile(&genome, &config).unwrap();
        let driven = driven_neurons(&genome);

        let topo = NetworkTopology::from_network(&network);
        assert!(topo.sensor_reachable().into_iter().all(|r| r));

        for compact in 0..network.neuron_count() {
            let original = network.original_id(compact).unwrap();
            assert!(driven.contains(&original));
        }
    }
}

#[test]
fn test_remap_is_order_preserving_bijection() {
    let config = BrainConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    for _ in 0..500 {
        let genome = Genome::random(&config, &mut rng);
        let network = compile(&genome, &config).unwrap();

        let originals: Vec<u32> = (0..network.neuron_count())
            .map(|i| network.original_id(i).unwrap())
            .collect();
        assert!(originals.windows(2).all(|w| w[0] < w[1]));
        for (compact, &original) in originals.iter().enumerate() {
            assert_eq!(network.compact_id(original), Some(compact));
        }

        // Every surviving gene's neuron ids are in the remap
        let survivor_ids: BTreeSet<u32> = cull(&genome)
            .iter()
            .flat_map(|g| g.source_neuron().into_iter().chain(g.sink_neuron()))
            .collect();
        assert_eq!(survivor_ids.into_iter().collect::<Vec<_>>(), originals);
    }
}

#[test]
fn test_activation_is_bitwise_deterministic() {
    let config = BrainConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    for _ in 0..100 {
        let genome = Genome::random(&config, &mut rng);
        let mut a = Brain::new(genome.clone(), &config).unwrap();
        let mut b = Brain::new(genome, &config).unwrap();

        for _ in 0..5 {
            let input = random_inputs(config.num_senses as usize, &mut rng);
            let out_a = a.activate(&input).unwrap();
            let out_b = b.activate(&input).unwrap();
            let bits_a: Vec<u32> = out_a.iter().map(|v| v.to_bits()).collect();
            let bits_b: Vec<u32> = out_b.iter().map(|v| v.to_bits()).collect();
            assert_eq!(bits_a, bits_b);
        }
    }
}

#[test]
fn test_outputs_stay_in_range() {
    let config = BrainConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    for _ in 0..200 {
        let genome = Genome::random(&config, &mut rng);
        let network = compile(&genome, &config).unwrap();
        let mut state = vec![0.0; network.neuron_count()];

        for _ in 0..10 {
            let input = random_inputs(config.num_senses as usize, &mut rng);
            let out = activate(&network, &input, &mut state, config.activation_iterations).unwrap();
            assert_eq!(out.len(), config.num_actions as usize);
            assert!(out.iter().all(|v| v.is_finite() && v.abs() < 1.0));
            assert!(state.iter().all(|v| v.is_finite() && v.abs() <= 1.0));
        }
    }
}

#[test]
fn test_saturating_genome_outputs_stay_strictly_inside() {
    let config = BrainConfig {
        activation_iterations: 1,
        ..BrainConfig::minimal(2, 2)
    };
    // Many parallel edges pile up on one neuron and each action
    let mut genes = Vec::new();
    for _ in 0..10 {
        genes.push(Gene::new(Sensor, 0, Neuron, 1, 1.0));
        genes.push(Gene::new(Sensor, 1, Neuron, 1, 1.0));
        genes.push(Gene::new(Neuron, 1, Action, 0, 1.0));
        genes.push(Gene::new(Neuron, 1, Action, 1, -1.0));
    }
    let genome = Genome::new(genes);
    assert!(genome.validate(&config).is_ok());

    let mut brain = Brain::new(genome, &config).unwrap();
    for input in [[1.0, 1.0], [-1.0, -1.0], [0.5, 0.75]] {
        let out = brain.activate(&input).unwrap();
        assert!(
            out.iter().all(|v| v.abs() < 1.0),
            "output {out:?} left (-1, 1) for input {input:?}"
        );
    }
}

#[test]
fn test_mutation_keeps_genomes_valid() {
    let config = BrainConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for _ in 0..10_000 {
        let genome = Genome::random(&config, &mut rng);
        let child = genome.mutate(&config, &mut rng);
        assert!(child.validate(&config).is_ok(), "invalid child: {}", child.to_log_line());
        assert!(compile(&child, &config).is_ok());
    }
}

#[test]
fn test_mutation_validity_with_reroll_policy() {
    let config = BrainConfig {
        weight_policy: WeightPolicy::Reroll,
        ..BrainConfig::minimal(4, 3)
    };
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let mut genome = Genome::random(&config, &mut rng);
    for _ in 0..2_000 {
        genome = genome.mutate(&config, &mut rng);
        assert!(genome.validate(&config).is_ok());
    }
}

#[test]
fn test_full_evolution_cycle() {
    let config = BrainConfig::minimal(2, 1);
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    // Reward controllers whose action follows the first sensor
    let fitness = |genome: &Genome| -> f32 {
        let mut brain = Brain::new(genome.clone(), &config).unwrap();
        [[1.0, 0.0], [-1.0, 0.0], [0.5, 1.0], [-0.5, -1.0]]
            .iter()
            .map(|input| {
                brain.reset_state();
                let out = brain.activate(input).unwrap()[0];
                -(out - input[0]).powi(2)
            })
            .sum()
    };

    let mut population: Vec<Genome> = (0..20).map(|_| Genome::random(&config, &mut rng)).collect();

    for _ in 0..30 {
        let mut scored: Vec<(f32, Genome)> = population.into_iter().map(|g| (fitness(&g), g)).collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(10);

        population = scored.into_iter().map(|(_, g)| g).collect();
        let offspring: Vec<Genome> = population
            .iter()
            .map(|g| g.mutate(&config, &mut rng))
            .collect();
        population.extend(offspring);

        assert_eq!(population.len(), 20);
        assert!(population.iter().all(|g| g.validate(&config).is_ok()));
    }
}

#[test]
fn test_log_line_roundtrips_through_json() {
    let config = BrainConfig::minimal(3, 2);
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let genome = Genome::random(&config, &mut rng);

    let parsed: Vec<(u8, u32, u8, u32, f32)> = serde_json::from_str(&genome.to_log_line()).unwrap();
    let expected: Vec<_> = genome.iter().map(Gene::as_tuple).collect();
    assert_eq!(parsed, expected);
}

#[test]
fn test_config_from_yaml_drives_brains() {
    let yaml = "num_senses: 2\nnum_actions: 3\nactivation_iterations: 2\n";
    let config = BrainConfig::from_yaml_str(yaml).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let mut brain = Brain::new(Genome::random(&config, &mut rng), &config).unwrap();
    assert_eq!(brain.iterations(), 2);
    assert_eq!(brain.activate(&[0.1, 0.2]).unwrap().len(), 3);
}
