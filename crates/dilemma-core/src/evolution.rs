//! Evolutionary population dynamics
//!
//! Each generation:
//!
//! 1. **Fitness** - every pair of distinct individuals plays one match;
//!    an individual's fitness is the sum of its match scores.
//! 2. **Record** - the population's composition by strategy kind is stored.
//! 3. **Selection** - the `elite_size` fittest individuals survive unchanged.
//! 4. **Reproduction** - each remaining slot is either a mutation (a kind
//!    drawn uniformly from the whole registry, with probability
//!    `mutation_rate`) or a clone of a uniformly drawn elite.
//!
//! The population is an index arena: a `Vec` of strategy kinds with a
//! parallel `Vec` of fitness values. Agents themselves only live for the
//! duration of a single match.
//!
//! # Reproducibility
//!
//! Generation `g` works from `root.derive(g)`. Match `k` of that
//! generation's schedule uses `derive(k)` of it, and all reproduction draws
//! come from `derive(u64::MAX)`, so a seed replays the same run for any
//! number of worker threads.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, event, Level};

use crate::error::{ensure_probability, Result, SimulationError};
use crate::game::{MatchConfig, MatchSimulator};
use crate::pairing::{all_pairings, SelfPlay};
use crate::random::SeededRng;
use crate::registry::{StrategyKind, StrategyRegistry};
use crate::schedule::{play_all, rank_by_score};

const REPRODUCTION_STREAM: u64 = u64::MAX;

/// Parameters of an evolutionary run
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub generations: usize,
    pub population_size: usize,
    pub elite_size: usize,
    pub mutation_rate: f64,
    pub rounds: u32,
    pub noise: f64,
    pub seed: u64,
    /// Worker threads for fitness evaluation; results do not depend on it
    pub threads: usize,
}

impl EvolutionConfig {
    /// Set `elite_size` to `percent`% of the population, rounded down
    pub fn with_elite_percent(mut self, percent: f64) -> Self {
        let elites = (self.population_size as f64 * percent / 100.0).floor();
        self.elite_size = if elites.is_finite() && elites > 0.0 {
            elites as usize
        } else {
            0
        };
        self
    }

    pub fn match_config(&self) -> MatchConfig {
        MatchConfig::new(self.rounds, self.noise)
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(SimulationError::config(
                "population_size",
                "must be greater than 0",
            ));
        }
        if self.elite_size > self.population_size {
            return Err(SimulationError::config(
                "elite_size",
                format!(
                    "must not exceed population_size ({} > {})",
                    self.elite_size, self.population_size
                ),
            ));
        }
        ensure_probability("mutation_rate", self.mutation_rate)?;
        // Cloning needs at least one elite to copy
        if self.elite_size == 0 && self.mutation_rate < 1.0 {
            return Err(SimulationError::config(
                "elite_size",
                "must be at least 1 unless mutation_rate is 1",
            ));
        }
        self.match_config().validate()?;
        if self.threads == 0 {
            return Err(SimulationError::config("threads", "must be at least 1"));
        }
        Ok(())
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            generations: 50,
            population_size: 100,
            elite_size: 10,
            mutation_rate: 0.05,
            rounds: 100,
            noise: 0.05,
            seed: 0,
            threads: 1,
        }
    }
}

/// Population composition for one generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    /// Strategy name to member count; kinds with no members are absent
    pub counts: BTreeMap<String, usize>,
    pub best_fitness: u64,
    pub mean_fitness: f64,
}

impl GenerationRecord {
    /// Sum of all counts, always the population size
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }
}

/// Fixed-size population of strategy kinds with their current fitness
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Population {
    kinds: Vec<StrategyKind>,
    fitness: Vec<u64>,
}

impl Population {
    /// Seed `size` slots by cycling through the registry in order
    pub fn seeded(registry: &StrategyRegistry, size: usize) -> Self {
        let kinds: Vec<StrategyKind> = registry.kinds().cycle().take(size).collect();
        Self::from_kinds(kinds)
    }

    pub fn from_kinds(kinds: Vec<StrategyKind>) -> Self {
        let fitness = vec![0; kinds.len()];
        Self { kinds, fitness }
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn kinds(&self) -> &[StrategyKind] {
        &self.kinds
    }

    /// Fitness from the last evaluation, zero before any
    pub fn fitness(&self) -> &[u64] {
        &self.fitness
    }

    pub fn composition(&self, registry: &StrategyRegistry) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for &kind in &self.kinds {
            *counts.entry(registry.name(kind).to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// Everything one generation step produced
#[derive(Clone, Debug)]
pub struct GenerationOutcome {
    pub record: GenerationRecord,
    /// The evaluated population, fitness filled in
    pub evaluated: Population,
    /// Elite kinds in rank order
    pub elites: Vec<StrategyKind>,
    /// The next generation; elites first, then reproduced slots
    pub next: Population,
}

/// Runs elitist selection with mutation over a strategy population
#[derive(Clone, Debug)]
pub struct EvolutionEngine {
    config: EvolutionConfig,
    simulator: MatchSimulator,
}

impl EvolutionEngine {
    pub fn new(config: EvolutionConfig) -> Result<Self> {
        config.validate()?;
        let simulator = MatchSimulator::new(config.match_config())?;
        Ok(Self { config, simulator })
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Evolve for `generations` generations, one record per generation
    pub fn run(&self, registry: &StrategyRegistry) -> Result<Vec<GenerationRecord>> {
        self.run_inner(registry, None)
    }

    /// Like [`EvolutionEngine::run`], but stops between generations once
    /// `cancel` is set and returns the records produced so far
    pub fn run_with_cancel(
        &self,
        registry: &StrategyRegistry,
        cancel: &AtomicBool,
    ) -> Result<Vec<GenerationRecord>> {
        self.run_inner(registry, Some(cancel))
    }

    fn run_inner(
        &self,
        registry: &StrategyRegistry,
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<GenerationRecord>> {
        registry.ensure_not_empty()?;

        event!(
            Level::INFO,
            strategies = registry.len(),
            generations = self.config.generations,
            population_size = self.config.population_size,
            elite_size = self.config.elite_size,
            mutation_rate = self.config.mutation_rate,
            seed = self.config.seed,
            "Starting evolution"
        );

        let root = SeededRng::new(self.config.seed);
        let mut population = Population::seeded(registry, self.config.population_size);
        let mut records = Vec::with_capacity(self.config.generations);

        for generation in 0..self.config.generations {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                event!(
                    Level::INFO,
                    completed = generation,
                    requested = self.config.generations,
                    "Evolution cancelled"
                );
                return Ok(records);
            }

            let outcome = self.step(registry, population, generation, &root)?;
            records.push(outcome.record);
            population = outcome.next;
        }

        if let Some(last) = records.last() {
            event!(
                Level::INFO,
                generations = records.len(),
                composition = ?last.counts,
                "Evolution finished"
            );
        }

        Ok(records)
    }

    /// Evaluate, record, select and reproduce a single generation.
    ///
    /// `root` is the run's root generator; the generation derives its own
    /// streams from it.
    pub fn step(
        &self,
        registry: &StrategyRegistry,
        population: Population,
        generation: usize,
        root: &SeededRng,
    ) -> Result<GenerationOutcome> {
        registry.ensure_not_empty()?;
        if population.len() != self.config.population_size {
            return Err(SimulationError::config(
                "population_size",
                format!(
                    "population has {} members, expected {}",
                    population.len(),
                    self.config.population_size
                ),
            ));
        }
        if let Some(kind) = population
            .kinds
            .iter()
            .find(|kind| kind.index() >= registry.len())
        {
            return Err(SimulationError::config(
                "population",
                format!(
                    "strategy kind {} is not in the registry of {} strategies",
                    kind.index(),
                    registry.len()
                ),
            ));
        }

        let generation_rng = root.derive(generation as u64);
        let evaluated = self.evaluate(registry, population, &generation_rng)?;

        let best_fitness = evaluated.fitness.iter().copied().max().unwrap_or(0);
        let mean_fitness =
            evaluated.fitness.iter().sum::<u64>() as f64 / evaluated.len() as f64;
        let record = GenerationRecord {
            generation,
            counts: evaluated.composition(registry),
            best_fitness,
            mean_fitness,
        };

        debug!(
            generation,
            best_fitness,
            mean_fitness,
            composition = ?record.counts,
            "generation evaluated"
        );

        let elites: Vec<StrategyKind> = rank_by_score(&evaluated.fitness)
            .into_iter()
            .take(self.config.elite_size)
            .map(|i| evaluated.kinds[i])
            .collect();

        let mut reproduction_rng = generation_rng.derive(REPRODUCTION_STREAM);
        let next = self.reproduce(registry, &elites, &mut reproduction_rng);

        Ok(GenerationOutcome {
            record,
            evaluated,
            elites,
            next,
        })
    }

    /// Round-robin among distinct individuals, accumulating fitness by index
    fn evaluate(
        &self,
        registry: &StrategyRegistry,
        mut population: Population,
        rng: &SeededRng,
    ) -> Result<Population> {
        let pairings = all_pairings(population.len(), SelfPlay::Excluded);
        let kinds = &population.kinds;

        let scores = play_all(&pairings, self.config.threads, None, |index, a, b| {
            let mut agent_a = registry.instantiate(kinds[a]);
            let mut agent_b = registry.instantiate(kinds[b]);
            self.simulator
                .play(agent_a.as_mut(), agent_b.as_mut(), rng.derive(index as u64))
                .final_scores()
        })?;

        let mut fitness = vec![0u64; population.len()];
        for (&(a, b), &(score_a, score_b)) in pairings.iter().zip(&scores) {
            fitness[a] += score_a;
            fitness[b] += score_b;
        }
        population.fitness = fitness;

        Ok(population)
    }

    /// Elites carry over, the remaining slots are mutations or clones
    fn reproduce(
        &self,
        registry: &StrategyRegistry,
        elites: &[StrategyKind],
        rng: &mut SeededRng,
    ) -> Population {
        let all_kinds: Vec<StrategyKind> = registry.kinds().collect();
        let mut kinds = Vec::with_capacity(self.config.population_size);
        kinds.extend_from_slice(elites);

        while kinds.len() < self.config.population_size {
            let pool = if rng.chance(self.config.mutation_rate) || elites.is_empty() {
                &all_kinds
            } else {
                elites
            };
            // Neither pool is empty: the registry was checked, and empty
            // elites fall back to mutation.
            if let Some(&kind) = rng.choose(pool) {
                kinds.push(kind);
            }
        }

        Population::from_kinds(kinds)
    }
}

/// Convenience wrapper mirroring the full parameter list
#[allow(clippy::too_many_arguments)]
pub fn run_evolution(
    registry: &StrategyRegistry,
    generations: usize,
    population_size: usize,
    elite_size: usize,
    mutation_rate: f64,
    rounds: u32,
    noise: f64,
    seed: u64,
) -> Result<Vec<GenerationRecord>> {
    EvolutionEngine::new(EvolutionConfig {
        generations,
        population_size,
        elite_size,
        mutation_rate,
        rounds,
        noise,
        seed,
        threads: 1,
    })?
    .run(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn small_config() -> EvolutionConfig {
        EvolutionConfig {
            generations: 5,
            population_size: 12,
            elite_size: 3,
            mutation_rate: 0.1,
            rounds: 20,
            noise: 0.05,
            seed: 7,
            threads: 1,
        }
    }

    #[test]
    fn test_seeded_population_cycles_registry() {
        let registry = catalog::default_registry().unwrap();
        let population = Population::seeded(&registry, 10);

        let indices: Vec<_> = population.kinds().iter().map(|k| k.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 0, 1, 2, 3, 0, 1]);
        assert_eq!(population.fitness(), &[0; 10]);

        let composition = population.composition(&registry);
        assert_eq!(composition["Tit for Tat"], 3);
        assert_eq!(composition["Random"], 2);
    }

    #[test]
    fn test_config_validation() {
        let cases = [
            (
                EvolutionConfig {
                    population_size: 0,
                    elite_size: 0,
                    ..small_config()
                },
                "population_size",
            ),
            (
                EvolutionConfig {
                    elite_size: 13,
                    ..small_config()
                },
                "elite_size",
            ),
            (
                EvolutionConfig {
                    mutation_rate: 1.5,
                    ..small_config()
                },
                "mutation_rate",
            ),
            (
                EvolutionConfig {
                    mutation_rate: -0.5,
                    ..small_config()
                },
                "mutation_rate",
            ),
            (
                EvolutionConfig {
                    elite_size: 0,
                    mutation_rate: 0.5,
                    ..small_config()
                },
                "elite_size",
            ),
            (
                EvolutionConfig {
                    noise: 2.0,
                    ..small_config()
                },
                "noise",
            ),
            (
                EvolutionConfig {
                    threads: 0,
                    ..small_config()
                },
                "threads",
            ),
        ];

        for (config, expected) in cases {
            match EvolutionEngine::new(config) {
                Err(SimulationError::Config { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected config error on {expected}, got {other:?}"),
            }
        }

        assert!(EvolutionEngine::new(EvolutionConfig {
            elite_size: 0,
            mutation_rate: 1.0,
            ..small_config()
        })
        .is_ok());
        assert!(EvolutionEngine::new(EvolutionConfig {
            elite_size: 12,
            ..small_config()
        })
        .is_ok());
    }

    #[test]
    fn test_elite_percent() {
        let config = EvolutionConfig {
            population_size: 100,
            ..Default::default()
        };
        assert_eq!(config.with_elite_percent(10.0).elite_size, 10);
        assert_eq!(config.with_elite_percent(2.5).elite_size, 2);
        assert_eq!(config.with_elite_percent(0.0).elite_size, 0);
    }

    #[test]
    fn test_zero_generations() {
        let registry = catalog::default_registry().unwrap();
        let engine = EvolutionEngine::new(EvolutionConfig {
            generations: 0,
            ..small_config()
        })
        .unwrap();

        assert!(engine.run(&registry).unwrap().is_empty());
    }

    #[test]
    fn test_record_totals() {
        let registry = catalog::default_registry().unwrap();
        let records = EvolutionEngine::new(small_config()).unwrap().run(&registry).unwrap();

        assert_eq!(records.len(), 5);
        for (generation, record) in records.iter().enumerate() {
            assert_eq!(record.generation, generation);
            assert_eq!(record.total(), 12);
        }
    }

    #[test]
    fn test_first_record_is_initial_seeding() {
        let registry = catalog::default_registry().unwrap();
        let records = EvolutionEngine::new(small_config()).unwrap().run(&registry).unwrap();

        for name in catalog::DEFAULT_LINEUP {
            assert_eq!(records[0].count(name), 3);
        }
    }

    #[test]
    fn test_step_fitness_known_values() {
        // 2 Coop + 1 Defect, 10 rounds, no noise:
        //   Coop-Coop: 30/30, each Coop-Defect: 0/50
        let registry = catalog::registry(&["Always Cooperate", "Always Defect"]).unwrap();
        let coop = registry.find("Always Cooperate").unwrap();
        let defect = registry.find("Always Defect").unwrap();

        let engine = EvolutionEngine::new(EvolutionConfig {
            population_size: 3,
            elite_size: 1,
            mutation_rate: 0.0,
            rounds: 10,
            noise: 0.0,
            ..small_config()
        })
        .unwrap();

        let population = Population::from_kinds(vec![coop, defect, coop]);
        let outcome = engine.step(&registry, population, 0, &SeededRng::new(1)).unwrap();

        assert_eq!(outcome.evaluated.fitness(), &[30, 100, 30]);
        assert_eq!(outcome.record.best_fitness, 100);
        assert!((outcome.record.mean_fitness - 160.0 / 3.0).abs() < 1e-9);
        assert_eq!(outcome.elites, vec![defect]);

        // Without mutation every slot clones the only elite
        assert_eq!(outcome.next.kinds(), &[defect, defect, defect]);
    }

    #[test]
    fn test_step_rejects_wrong_population_size() {
        let registry = catalog::default_registry().unwrap();
        let engine = EvolutionEngine::new(small_config()).unwrap();
        let population = Population::seeded(&registry, 5);

        assert!(engine.step(&registry, population, 0, &SeededRng::new(0)).is_err());
    }

    #[test]
    fn test_step_rejects_kinds_from_larger_registry() {
        let full = catalog::full_registry().unwrap();
        let lineup = catalog::default_registry().unwrap();
        let engine = EvolutionEngine::new(EvolutionConfig {
            population_size: 8,
            elite_size: 2,
            ..small_config()
        })
        .unwrap();

        // Seeding from the full catalog hands out kinds 4..8
        let population = Population::seeded(&full, 8);
        let err = engine.step(&lineup, population, 0, &SeededRng::new(0)).unwrap_err();
        assert!(matches!(err, SimulationError::Config { field: "population", .. }));
    }

    #[test]
    fn test_empty_registry_rejected() {
        let engine = EvolutionEngine::new(small_config()).unwrap();
        assert!(engine.run(&StrategyRegistry::new()).is_err());
    }

    #[test]
    fn test_cancel_before_first_generation() {
        let registry = catalog::default_registry().unwrap();
        let engine = EvolutionEngine::new(small_config()).unwrap();
        let cancel = AtomicBool::new(true);

        assert!(engine.run_with_cancel(&registry, &cancel).unwrap().is_empty());
    }

    #[test]
    fn test_run_evolution_wrapper() {
        let registry = catalog::default_registry().unwrap();
        let records = run_evolution(&registry, 3, 8, 2, 0.2, 10, 0.0, 3).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.total() == 8));
    }
}
