//! Round-robin tournaments between named strategies

use std::sync::atomic::AtomicBool;

use serde::{Deserialize, Serialize};
use tracing::{event, Level};

use crate::error::{Result, SimulationError};
use crate::game::{MatchConfig, MatchSimulator};
use crate::pairing::{all_pairings, SelfPlay};
use crate::random::SeededRng;
use crate::registry::{StrategyKind, StrategyRegistry};
use crate::schedule::{play_all, rank_by_score};

/// Settings for one tournament run
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    pub rounds: u32,
    pub noise: f64,
    pub seed: u64,
    /// Worker threads used to play matches; results do not depend on it
    pub threads: usize,
}

impl TournamentConfig {
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig::new(self.rounds, self.noise)
    }

    pub fn validate(&self) -> Result<()> {
        self.match_config().validate()?;
        if self.threads == 0 {
            return Err(SimulationError::config("threads", "must be at least 1"));
        }
        Ok(())
    }
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            rounds: 100,
            noise: 0.05,
            seed: 0,
            threads: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u64,
}

/// Final scores of one tournament match
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub strategy_a: String,
    pub strategy_b: String,
    pub score_a: u64,
    pub score_b: u64,
}

/// Tournament outcome.
///
/// `entries` is sorted by total score descending. Equal scores keep
/// registry order: the strategy registered first ranks higher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    /// Every match played, in schedule order
    pub matches: Vec<MatchSummary>,
}

impl Leaderboard {
    pub fn winner(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    pub fn score_of(&self, name: &str) -> Option<u64> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.score)
    }

    /// 1-based rank of `name`
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name).map(|i| i + 1)
    }

    pub fn matches_played(&self) -> usize {
        self.matches.len()
    }
}

/// Plays every strategy against every other strategy and itself
#[derive(Clone, Debug)]
pub struct Tournament {
    config: TournamentConfig,
    simulator: MatchSimulator,
}

impl Tournament {
    pub fn new(config: TournamentConfig) -> Result<Self> {
        config.validate()?;
        let simulator = MatchSimulator::new(config.match_config())?;
        Ok(Self { config, simulator })
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    /// Run the tournament over every registered strategy
    pub fn run(&self, registry: &StrategyRegistry) -> Result<Leaderboard> {
        self.run_inner(registry, None)
    }

    /// Like [`Tournament::run`], but gives up with
    /// [`SimulationError::Cancelled`] once `cancel` is set
    pub fn run_with_cancel(
        &self,
        registry: &StrategyRegistry,
        cancel: &AtomicBool,
    ) -> Result<Leaderboard> {
        self.run_inner(registry, Some(cancel))
    }

    fn run_inner(
        &self,
        registry: &StrategyRegistry,
        cancel: Option<&AtomicBool>,
    ) -> Result<Leaderboard> {
        registry.ensure_not_empty()?;

        let kinds: Vec<StrategyKind> = registry.kinds().collect();
        let pairings = all_pairings(kinds.len(), SelfPlay::Included);

        event!(
            Level::INFO,
            strategies = kinds.len(),
            matches = pairings.len(),
            rounds = self.config.rounds,
            noise = self.config.noise,
            seed = self.config.seed,
            "Starting tournament"
        );

        let root = SeededRng::new(self.config.seed);
        let scores = play_all(&pairings, self.config.threads, cancel, |index, a, b| {
            // Fresh agents every match, even for a strategy against itself
            let mut agent_a = registry.instantiate(kinds[a]);
            let mut agent_b = registry.instantiate(kinds[b]);
            self.simulator
                .play(agent_a.as_mut(), agent_b.as_mut(), root.derive(index as u64))
                .final_scores()
        })?;

        let mut totals = vec![0u64; kinds.len()];
        let mut matches = Vec::with_capacity(pairings.len());
        for (&(a, b), &(score_a, score_b)) in pairings.iter().zip(&scores) {
            totals[a] += score_a;
            totals[b] += score_b;
            matches.push(MatchSummary {
                strategy_a: registry.name(kinds[a]).to_string(),
                strategy_b: registry.name(kinds[b]).to_string(),
                score_a,
                score_b,
            });
        }

        let entries: Vec<LeaderboardEntry> = rank_by_score(&totals)
            .into_iter()
            .map(|i| LeaderboardEntry {
                name: registry.name(kinds[i]).to_string(),
                score: totals[i],
            })
            .collect();

        if let Some(winner) = entries.first() {
            event!(
                Level::INFO,
                winner = %winner.name,
                score = winner.score,
                "Tournament finished"
            );
        }

        Ok(Leaderboard { entries, matches })
    }
}

/// Convenience wrapper: `run(registry, rounds, noise)` with a fixed seed
pub fn run_tournament(
    registry: &StrategyRegistry,
    rounds: u32,
    noise: f64,
    seed: u64,
) -> Result<Leaderboard> {
    Tournament::new(TournamentConfig {
        rounds,
        noise,
        seed,
        ..Default::default()
    })?
    .run(registry)
}
