//! Simulation kernel for the Iterated Prisoner's Dilemma
//!
//! - [`MatchSimulator`] plays a fixed number of noisy rounds between two agents.
//! - [`Tournament`] runs a round-robin, self-play included, over named strategies.
//! - [`EvolutionEngine`] evolves a fixed-size population with elitism and mutation.
//!
//! Strategies plug in through the [`Agent`] trait and a [`StrategyRegistry`]
//! of factories. All randomness comes from an explicitly seeded
//! [`SeededRng`], so every run can be replayed.
//!
//! This crate is compiled to:
//! - Native (for the CLI and tests)
//! - WASM (for a browser frontend, `wasm` feature)

mod error;
mod evolution;
mod game;
mod pairing;
mod payoff;
mod random;
mod registry;
mod schedule;
mod strategy;
mod tournament;

pub mod catalog;

#[cfg(feature = "wasm")]
mod wasm;

pub use error::{Result, SimulationError};
pub use evolution::{
    run_evolution, EvolutionConfig, EvolutionEngine, GenerationOutcome, GenerationRecord,
    Population,
};
pub use game::{run_match, MatchConfig, MatchResult, MatchSimulator, RoundResult};
pub use pairing::{all_pairings, match_count, pairing_for_match, SelfPlay};
pub use payoff::{payoff, PayoffMatrix};
pub use random::SeededRng;
pub use registry::{AgentFactory, StrategyKind, StrategyRegistry};
pub use strategy::{Agent, History, Move};
pub use tournament::{
    run_tournament, Leaderboard, LeaderboardEntry, MatchSummary, Tournament, TournamentConfig,
};
