//! Wandering agents evolved to reach a corner of a square arena.
//!
//! Each agent senses its normalised position and emits two actions; an action
//! above 0.5 moves it one cell in the positive direction, below -0.5 one cell
//! back. After every generation the half that ended nearest the target corner
//! is kept and each survivor is mutated once to refill the population.
//!
//! Run with: `cargo run --example wander [config.yaml]`
//! Set `RUST_LOG=debug` to see compile summaries.

use neurogene::{Brain, BrainConfig, Genome};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ARENA: f32 = 100.0;
const TARGET: (f32, f32) = (95.0, 95.0);

struct Agent {
    brain: Brain,
    x: f32,
    y: f32,
}

impl Agent {
    fn step(&mut self) -> Result<(), neurogene::InputSizeError> {
        let actions = self.brain.activate(&[self.x / ARENA, self.y / ARENA])?;
        self.x = (self.x + movement(actions[0])).clamp(1.0, ARENA - 1.0);
        self.y = (self.y + movement(actions[1])).clamp(1.0, ARENA - 1.0);
        Ok(())
    }

    fn distance_to_target(&self) -> f32 {
        ((self.x - TARGET.0).powi(2) + (self.y - TARGET.1).powi(2)).sqrt()
    }
}

fn movement(action: f32) -> f32 {
    if action > 0.5 {
        1.0
    } else if action < -0.5 {
        -1.0
    } else {
        0.0
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => BrainConfig::from_file(path)?,
        None => BrainConfig {
            num_senses: 2,
            num_actions: 2,
            ..BrainConfig::default()
        },
    };
    config.validate()?;
    if config.num_senses != 2 || config.num_actions < 2 {
        return Err("wander needs num_senses = 2 and num_actions >= 2".into());
    }

    let population_size = 60;
    let generations = 40;
    let steps = 120;
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let mut genomes: Vec<Genome> = (0..population_size)
        .map(|_| Genome::random(&config, &mut rng))
        .collect();

    for generation in 0..generations {
        let mut agents = Vec::with_capacity(genomes.len());
        for genome in genomes {
            agents.push(Agent {
                brain: Brain::new(genome, &config)?,
                x: rng.random_range(1.0..ARENA - 1.0),
                y: rng.random_range(1.0..ARENA - 1.0),
            });
        }

        for _ in 0..steps {
            for agent in &mut agents {
                agent.step()?;
            }
        }

        agents.sort_by(|a, b| a.distance_to_target().total_cmp(&b.distance_to_target()));
        let best = &agents[0];
        let mean = agents.iter().map(Agent::distance_to_target).sum::<f32>() / agents.len() as f32;
        log::info!(
            "Generation {:3} | best distance {:6.2} | mean {:6.2} | neurons {:2}",
            generation,
            best.distance_to_target(),
            mean,
            best.brain.neuron_count()
        );
        log::debug!("best genome: {}", best.brain.genome().to_log_line());

        agents.truncate(population_size / 2);
        let survivors: Vec<Genome> = agents.into_iter().map(|a| a.brain.into_genome()).collect();
        let offspring: Vec<Genome> = survivors
            .iter()
            .map(|g| g.mutate(&config, &mut rng))
            .collect();
        genomes = survivors.into_iter().chain(offspring).collect();
    }

    if let Some(champion) = genomes.first() {
        log::info!("Champion genome: {}", champion.to_log_line());
    }
    Ok(())
}
