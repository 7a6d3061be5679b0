use std::path::PathBuf;

use anyhow::Context;
use dilemma_core::{EvolutionConfig, EvolutionEngine, GenerationRecord, StrategyRegistry};

use crate::util;

const DEFAULT_ELITE_PERCENT: f64 = 10.0;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct EvolveArg {
    /// Comma-separated strategy names [default: the four classic strategies]
    #[arg(long, value_delimiter = ',')]
    strategies: Vec<String>,
    /// Number of generations to run
    #[arg(long)]
    generations: Option<usize>,
    /// Individuals per generation
    #[arg(long)]
    population: Option<usize>,
    /// Individuals that survive unchanged
    #[arg(long, conflicts_with = "elite_percent")]
    elite: Option<usize>,
    /// Survivors as a percentage of the population, rounded down
    #[arg(long)]
    elite_percent: Option<f64>,
    /// Probability that a new slot gets a random strategy instead of a clone
    #[arg(long)]
    mutation_rate: Option<f64>,
    /// Rounds per match
    #[arg(long)]
    rounds: Option<u32>,
    /// Probability that any single move is flipped
    #[arg(long)]
    noise: Option<f64>,
    /// Root seed for the whole run
    #[arg(long)]
    seed: Option<u64>,
    /// Worker threads for fitness evaluation; results do not depend on it
    #[arg(long)]
    threads: Option<usize>,
    /// JSON evolution config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the generation records as JSON
    #[arg(long)]
    json: bool,
}

impl EvolveArg {
    fn evolution_config(&self) -> anyhow::Result<EvolutionConfig> {
        let mut config: EvolutionConfig =
            util::load_config("evolution config", self.config.as_ref())?;
        if let Some(generations) = self.generations {
            config.generations = generations;
        }
        if let Some(population) = self.population {
            config.population_size = population;
        }
        if let Some(mutation_rate) = self.mutation_rate {
            config.mutation_rate = mutation_rate;
        }
        if let Some(rounds) = self.rounds {
            config.rounds = rounds;
        }
        if let Some(noise) = self.noise {
            config.noise = noise;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }

        // An explicit elite count wins; otherwise the elite share follows
        // the population when the population was set on the command line.
        // A derived share keeps at least one elite to clone from.
        match (self.elite, self.elite_percent, self.population) {
            (Some(elite), _, _) => config.elite_size = elite,
            (None, Some(percent), _) => config = config.with_elite_percent(percent),
            (None, None, Some(population)) => {
                config = config.with_elite_percent(DEFAULT_ELITE_PERCENT);
                config.elite_size = config.elite_size.max(1).min(population);
            }
            (None, None, None) => {}
        }
        Ok(config)
    }
}

pub(crate) fn run(arg: &EvolveArg) -> anyhow::Result<()> {
    let config = arg.evolution_config()?;
    let registry = util::strategy_registry(&arg.strategies)?;

    let records = EvolutionEngine::new(config)
        .and_then(|engine| engine.run(&registry))
        .context("Evolution failed")?;

    if arg.json {
        return util::print_json(&records);
    }
    print_records(&registry, &records);
    Ok(())
}

fn print_records(registry: &StrategyRegistry, records: &[GenerationRecord]) {
    let names: Vec<&str> = registry.names().collect();
    let widths: Vec<usize> = names.iter().map(|name| name.len().max(5)).collect();

    print!("{:>5}", "Gen");
    for (name, &width) in names.iter().zip(&widths) {
        print!("  {name:>width$}");
    }
    println!("  {:>9}  {:>9}", "Best", "Mean");

    for record in records {
        print!("{:>5}", record.generation);
        for (name, &width) in names.iter().zip(&widths) {
            print!("  {:>width$}", record.count(name));
        }
        println!("  {:>9}  {:>9.1}", record.best_fitness, record.mean_fitness);
    }

    if let Some(last) = records.last() {
        if let Some((name, count)) = last.counts.iter().max_by_key(|&(_, &count)| count) {
            println!();
            println!(
                "Most common after {} generations: {name} ({count} of {})",
                records.len(),
                last.total()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_flag_rescales_elites() {
        let arg = EvolveArg {
            population: Some(40),
            ..Default::default()
        };
        let config = arg.evolution_config().unwrap();
        assert_eq!(config.population_size, 40);
        assert_eq!(config.elite_size, 4);
    }

    #[test]
    fn test_small_population_keeps_one_elite() {
        let arg = EvolveArg {
            population: Some(5),
            generations: Some(2),
            rounds: Some(5),
            ..Default::default()
        };
        assert_eq!(arg.evolution_config().unwrap().elite_size, 1);
        run(&arg).unwrap();
    }

    #[test]
    fn test_explicit_elite_wins() {
        let arg = EvolveArg {
            population: Some(40),
            elite: Some(7),
            ..Default::default()
        };
        assert_eq!(arg.evolution_config().unwrap().elite_size, 7);

        let arg = EvolveArg {
            population: Some(40),
            elite_percent: Some(25.0),
            ..Default::default()
        };
        assert_eq!(arg.evolution_config().unwrap().elite_size, 10);
    }

    #[test]
    fn test_defaults_untouched() {
        let config = EvolveArg::default().evolution_config().unwrap();
        assert_eq!(config, EvolutionConfig::default());
    }

    #[test]
    fn test_run_small_population() {
        let arg = EvolveArg {
            generations: Some(3),
            population: Some(20),
            rounds: Some(10),
            ..Default::default()
        };
        run(&arg).unwrap();
    }

    #[test]
    fn test_run_rejects_oversized_elite() {
        let arg = EvolveArg {
            population: Some(5),
            elite: Some(6),
            ..Default::default()
        };
        assert!(run(&arg).is_err());
    }
}
