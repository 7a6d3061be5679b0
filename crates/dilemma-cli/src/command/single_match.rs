use std::path::PathBuf;

use anyhow::Context;
use dilemma_core::{catalog, MatchConfig, MatchResult, MatchSimulator, SeededRng};
use tracing::info;

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct MatchArg {
    /// Strategy for player A
    strategy_a: String,
    /// Strategy for player B
    strategy_b: String,
    /// Rounds to play
    #[arg(long)]
    rounds: Option<u32>,
    /// Probability that any single move is flipped
    #[arg(long)]
    noise: Option<f64>,
    /// Seed for the match generator
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// JSON match config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Only print the final scores
    #[arg(long)]
    summary: bool,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl MatchArg {
    fn match_config(&self) -> anyhow::Result<MatchConfig> {
        let mut config: MatchConfig = util::load_config("match config", self.config.as_ref())?;
        if let Some(rounds) = self.rounds {
            config.rounds = rounds;
        }
        if let Some(noise) = self.noise {
            config.noise = noise;
        }
        Ok(config)
    }
}

pub(crate) fn run(arg: &MatchArg) -> anyhow::Result<()> {
    let config = arg.match_config()?;
    let name_a =
        catalog::canonical_name(&arg.strategy_a).context("Unknown strategy for player A")?;
    let name_b =
        catalog::canonical_name(&arg.strategy_b).context("Unknown strategy for player B")?;
    let mut agent_a = catalog::agent(name_a)?;
    let mut agent_b = catalog::agent(name_b)?;

    info!(player_a = name_a, player_b = name_b, seed = arg.seed, "Playing match");
    let simulator = MatchSimulator::new(config).context("Invalid match configuration")?;
    let result = simulator.play(agent_a.as_mut(), agent_b.as_mut(), SeededRng::new(arg.seed));

    if arg.json {
        return util::print_json(&result);
    }
    print_result(name_a, name_b, &result, arg.summary);
    Ok(())
}

fn print_result(name_a: &str, name_b: &str, result: &MatchResult, summary: bool) {
    if !summary {
        println!(
            "{:>5}  {:<2} {:<2}  {:>5} {:>5}  {:>7} {:>7}",
            "Round", "A", "B", "+A", "+B", "Total A", "Total B"
        );
        // Flipped moves are marked with '*'
        for round in &result.rounds {
            println!(
                "{:>5}  {}{} {}{}  {:>5} {:>5}  {:>7} {:>7}",
                round.round + 1,
                round.move_a,
                if round.flipped_a { "*" } else { " " },
                round.move_b,
                if round.flipped_b { "*" } else { " " },
                round.score_a,
                round.score_b,
                round.cumulative_a,
                round.cumulative_b,
            );
        }
        println!();
    }

    let (score_a, score_b) = result.final_scores();
    let (flips_a, flips_b) = result.flips();
    let width = util::name_width([name_a, name_b], 8);
    println!("{:<width$}  {:>7}  {:>5}", "Player", "Score", "Flips");
    println!("{name_a:<width$}  {score_a:>7}  {flips_a:>5}");
    println!("{name_b:<width$}  {score_b:>7}  {flips_b:>5}");

    match score_a.cmp(&score_b) {
        std::cmp::Ordering::Greater => println!("\n{name_a} wins"),
        std::cmp::Ordering::Less => println!("\n{name_b} wins"),
        std::cmp::Ordering::Equal => println!("\nDraw"),
    }
}
