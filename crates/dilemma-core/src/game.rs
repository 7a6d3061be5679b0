//! Match execution engine

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_probability, Result};
use crate::payoff::PayoffMatrix;
use crate::random::SeededRng;
use crate::strategy::{Agent, Move};

/// Sub-stream indices within one match generator
const STREAM_AGENT_A: u64 = 0;
const STREAM_AGENT_B: u64 = 1;
const STREAM_NOISE: u64 = 2;

/// Result of a single round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round: u32,
    pub move_a: Move,
    pub move_b: Move,
    /// Whether noise replaced the intended move
    pub flipped_a: bool,
    pub flipped_b: bool,
    pub score_a: u32,
    pub score_b: u32,
    pub cumulative_a: u64,
    pub cumulative_b: u64,
}

/// Result of a complete match
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub rounds: Vec<RoundResult>,
    pub total_score_a: u64,
    pub total_score_b: u64,
}

impl MatchResult {
    pub fn final_scores(&self) -> (u64, u64) {
        (self.total_score_a, self.total_score_b)
    }

    /// Running totals after each round
    pub fn score_history(&self) -> Vec<(u64, u64)> {
        self.rounds
            .iter()
            .map(|r| (r.cumulative_a, r.cumulative_b))
            .collect()
    }

    /// Moves actually played each round, after noise
    pub fn move_history(&self) -> Vec<(Move, Move)> {
        self.rounds.iter().map(|r| (r.move_a, r.move_b)).collect()
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    /// Number of noise flips suffered by (A, B)
    pub fn flips(&self) -> (usize, usize) {
        self.rounds.iter().fold((0, 0), |(a, b), r| {
            (a + usize::from(r.flipped_a), b + usize::from(r.flipped_b))
        })
    }
}

/// Rounds per match and the per-move flip probability
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub rounds: u32,
    pub noise: f64,
}

impl MatchConfig {
    pub fn new(rounds: u32, noise: f64) -> Self {
        Self { rounds, noise }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_probability("noise", self.noise)
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            rounds: 100,
            noise: 0.05,
        }
    }
}

/// Plays fixed-length matches between two agents
#[derive(Clone, Debug, PartialEq)]
pub struct MatchSimulator {
    config: MatchConfig,
    payoff: PayoffMatrix,
}

impl MatchSimulator {
    /// Simulator using the standard payoff matrix
    pub fn new(config: MatchConfig) -> Result<Self> {
        Self::with_payoff(config, PayoffMatrix::standard())
    }

    pub fn with_payoff(config: MatchConfig, payoff: PayoffMatrix) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, payoff })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn payoff(&self) -> &PayoffMatrix {
        &self.payoff
    }

    /// Run a complete match between two agents
    ///
    /// # Arguments
    /// * `agent_a` - First player, fresh for this match
    /// * `agent_b` - Second player, fresh for this match
    /// * `rng` - This match's generator; both agents and the noise draws
    ///   get their own sub-stream of it
    ///
    /// # Returns
    /// Complete match result with round-by-round details
    pub fn play(
        &self,
        agent_a: &mut dyn Agent,
        agent_b: &mut dyn Agent,
        rng: SeededRng,
    ) -> MatchResult {
        let MatchConfig { rounds: round_count, noise } = self.config;

        let mut rng_a = rng.derive(STREAM_AGENT_A);
        let mut rng_b = rng.derive(STREAM_AGENT_B);
        let mut noise_rng = rng.derive(STREAM_NOISE);

        let mut rounds: Vec<RoundResult> = Vec::with_capacity(round_count as usize);
        let mut total_a = 0u64;
        let mut total_b = 0u64;

        for round in 0..round_count {
            // Both decisions are made before either side learns anything
            let intended_a = agent_a.decide(&mut rng_a);
            let intended_b = agent_b.decide(&mut rng_b);

            let flipped_a = noise_rng.chance(noise);
            let flipped_b = noise_rng.chance(noise);
            let move_a = if flipped_a { intended_a.flipped() } else { intended_a };
            let move_b = if flipped_b { intended_b.flipped() } else { intended_b };

            let (score_a, score_b) = self.payoff.score(move_a, move_b);
            total_a += u64::from(score_a);
            total_b += u64::from(score_b);

            rounds.push(RoundResult {
                round,
                move_a,
                move_b,
                flipped_a,
                flipped_b,
                score_a,
                score_b,
                cumulative_a: total_a,
                cumulative_b: total_b,
            });

            agent_a.observe(move_a, move_b);
            agent_b.observe(move_b, move_a);
        }

        let result = MatchResult {
            rounds,
            total_score_a: total_a,
            total_score_b: total_b,
        };

        let (flips_a, flips_b) = result.flips();
        debug!(
            rounds = round_count,
            noise,
            score_a = total_a,
            score_b = total_b,
            flips_a,
            flips_b,
            "match finished"
        );

        result
    }
}

/// Validate `config` and play one match with the standard payoff matrix
pub fn run_match(
    agent_a: &mut dyn Agent,
    agent_b: &mut dyn Agent,
    config: MatchConfig,
    rng: SeededRng,
) -> Result<MatchResult> {
    Ok(MatchSimulator::new(config)?.play(agent_a, agent_b, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AlwaysCooperate, AlwaysDefect, RandomAgent, TitForTat};
    use crate::error::SimulationError;
    use crate::strategy::History;

    fn deterministic(rounds: u32) -> MatchSimulator {
        MatchSimulator::new(MatchConfig::new(rounds, 0.0)).unwrap()
    }

    /// Records what it was told so the observe hook can be checked
    struct Recorder {
        intended: Move,
        history: History,
    }

    impl Recorder {
        fn new(intended: Move) -> Self {
            Self {
                intended,
                history: History::new(),
            }
        }

        fn seen(&self) -> Vec<(Move, Move)> {
            self.history
                .own()
                .iter()
                .copied()
                .zip(self.history.opponent().iter().copied())
                .collect()
        }
    }

    impl Agent for Recorder {
        fn decide(&mut self, _rng: &mut SeededRng) -> Move {
            self.intended
        }

        fn observe(&mut self, own: Move, opponent: Move) {
            self.history.record(own, opponent);
        }
    }

    #[test]
    fn test_zero_rounds() {
        let result = deterministic(0).play(
            &mut TitForTat::new(),
            &mut AlwaysDefect,
            SeededRng::new(42),
        );

        assert_eq!(result.final_scores(), (0, 0));
        assert!(result.score_history().is_empty());
        assert!(result.move_history().is_empty());
    }

    #[test]
    fn test_cooperate_vs_defect() {
        let result = deterministic(10).play(
            &mut AlwaysCooperate,
            &mut AlwaysDefect,
            SeededRng::new(42),
        );

        for round in &result.rounds {
            assert_eq!((round.score_a, round.score_b), (0, 5));
        }
        assert_eq!(result.final_scores(), (0, 50));
    }

    #[test]
    fn test_tft_vs_always_defect() {
        let result = deterministic(5).play(
            &mut TitForTat::new(),
            &mut AlwaysDefect,
            SeededRng::new(42),
        );

        // Round 0: TFT cooperates, AD defects
        assert_eq!(result.rounds[0].move_a, Move::Cooperate);
        assert_eq!((result.rounds[0].score_a, result.rounds[0].score_b), (0, 5));

        // Round 1+: TFT retaliates, both defect
        for round in result.rounds.iter().skip(1) {
            assert_eq!((round.move_a, round.move_b), (Move::Defect, Move::Defect));
            assert_eq!((round.score_a, round.score_b), (1, 1));
        }

        assert_eq!(result.final_scores(), (4, 9));
    }

    #[test]
    fn test_tft_vs_tft() {
        let result = deterministic(20).play(
            &mut TitForTat::new(),
            &mut TitForTat::new(),
            SeededRng::new(42),
        );

        for (a, b) in result.move_history() {
            assert_eq!((a, b), (Move::Cooperate, Move::Cooperate));
        }
        assert_eq!(result.final_scores(), (60, 60));
    }

    #[test]
    fn test_cumulative_scores() {
        let result = deterministic(30).play(
            &mut RandomAgent::default(),
            &mut TitForTat::new(),
            SeededRng::new(42),
        );

        let mut expected_a = 0u64;
        let mut expected_b = 0u64;

        for (round, cumulative) in result.rounds.iter().zip(result.score_history()) {
            expected_a += u64::from(round.score_a);
            expected_b += u64::from(round.score_b);
            assert_eq!(cumulative, (expected_a, expected_b));
        }
        assert_eq!(result.final_scores(), (expected_a, expected_b));
    }

    #[test]
    fn test_full_noise_flips_everything() {
        let simulator = MatchSimulator::new(MatchConfig::new(10, 1.0)).unwrap();
        let result = simulator.play(&mut AlwaysCooperate, &mut AlwaysCooperate, SeededRng::new(1));

        for (a, b) in result.move_history() {
            assert_eq!((a, b), (Move::Defect, Move::Defect));
        }
        assert_eq!(result.flips(), (10, 10));
        assert_eq!(result.final_scores(), (10, 10));
    }

    #[test]
    fn test_noise_flips_are_independent() {
        let simulator = MatchSimulator::new(MatchConfig::new(2000, 0.5)).unwrap();
        let result = simulator.play(&mut AlwaysCooperate, &mut AlwaysCooperate, SeededRng::new(9));

        let (flips_a, flips_b) = result.flips();
        assert!(flips_a > 850 && flips_a < 1150, "flips_a = {flips_a}");
        assert!(flips_b > 850 && flips_b < 1150, "flips_b = {flips_b}");

        let differing = result.rounds.iter().filter(|r| r.flipped_a != r.flipped_b).count();
        assert!(differing > 850 && differing < 1150, "differing = {differing}");
    }

    #[test]
    fn test_observe_sees_actual_moves() {
        let simulator = MatchSimulator::new(MatchConfig::new(50, 0.3)).unwrap();
        let mut a = Recorder::new(Move::Cooperate);
        let mut b = Recorder::new(Move::Defect);

        let result = simulator.play(&mut a, &mut b, SeededRng::new(5));
        let moves = result.move_history();

        let seen_by_a = a.seen();
        let seen_by_b: Vec<_> = b.seen().into_iter().map(|(own, opp)| (opp, own)).collect();
        assert_eq!(seen_by_a, moves);
        assert_eq!(seen_by_b, moves);
    }

    #[test]
    fn test_match_determinism() {
        let simulator = MatchSimulator::new(MatchConfig::new(100, 0.1)).unwrap();

        let result1 = simulator.play(
            &mut RandomAgent::default(),
            &mut TitForTat::new(),
            SeededRng::new(42),
        );
        let result2 = simulator.play(
            &mut RandomAgent::default(),
            &mut TitForTat::new(),
            SeededRng::new(42),
        );

        assert_eq!(result1, result2);
    }

    #[test]
    fn test_different_streams_differ() {
        let simulator = MatchSimulator::new(MatchConfig::new(100, 0.0)).unwrap();
        let root = SeededRng::new(42);

        let result1 = simulator.play(
            &mut RandomAgent::default(),
            &mut RandomAgent::default(),
            root.derive(0),
        );
        let result2 = simulator.play(
            &mut RandomAgent::default(),
            &mut RandomAgent::default(),
            root.derive(1),
        );

        assert_ne!(result1.move_history(), result2.move_history());
    }

    #[test]
    fn test_invalid_noise_rejected() {
        for noise in [-0.1, 1.5, f64::NAN] {
            let err = MatchSimulator::new(MatchConfig::new(10, noise)).unwrap_err();
            assert!(matches!(err, SimulationError::Config { field: "noise", .. }));
        }
    }

    #[test]
    fn test_run_match_validates() {
        let err = run_match(
            &mut AlwaysCooperate,
            &mut AlwaysDefect,
            MatchConfig::new(10, 2.0),
            SeededRng::new(0),
        )
        .unwrap_err();
        assert!(matches!(err, SimulationError::Config { .. }));

        let result = run_match(
            &mut AlwaysCooperate,
            &mut AlwaysDefect,
            MatchConfig::new(10, 0.0),
            SeededRng::new(0),
        )
        .unwrap();
        assert_eq!(result.final_scores(), (0, 50));
    }

    #[test]
    fn test_serialized_shape() {
        let result =
            deterministic(1).play(&mut AlwaysCooperate, &mut AlwaysDefect, SeededRng::new(0));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["total_score_b"], 5);
        assert_eq!(json["rounds"][0]["move_a"], "Cooperate");
    }
}
