use std::path::PathBuf;

use anyhow::Context;
use dilemma_core::{Leaderboard, Tournament, TournamentConfig};

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TournamentArg {
    /// Comma-separated strategy names [default: the four classic strategies]
    #[arg(long, value_delimiter = ',')]
    strategies: Vec<String>,
    /// Rounds per match
    #[arg(long)]
    rounds: Option<u32>,
    /// Probability that any single move is flipped
    #[arg(long)]
    noise: Option<f64>,
    /// Root seed; match k plays on the k-th derived stream
    #[arg(long)]
    seed: Option<u64>,
    /// Worker threads; results do not depend on it
    #[arg(long)]
    threads: Option<usize>,
    /// JSON tournament config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also list every match played
    #[arg(long)]
    matches: bool,
    /// Print the leaderboard as JSON
    #[arg(long)]
    json: bool,
}

impl TournamentArg {
    fn tournament_config(&self) -> anyhow::Result<TournamentConfig> {
        let mut config: TournamentConfig =
            util::load_config("tournament config", self.config.as_ref())?;
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
        Ok(config)
    }
}

pub(crate) fn run(arg: &TournamentArg) -> anyhow::Result<()> {
    let config = arg.tournament_config()?;
    let registry = util::strategy_registry(&arg.strategies)?;

    let leaderboard = Tournament::new(config)
        .and_then(|tournament| tournament.run(&registry))
        .context("Tournament failed")?;

    if arg.json {
        return util::print_json(&leaderboard);
    }
    print_leaderboard(&leaderboard, arg.matches);
    Ok(())
}

fn print_leaderboard(leaderboard: &Leaderboard, show_matches: bool) {
    let width = util::name_width(leaderboard.entries.iter().map(|e| e.name.as_str()), 8);

    if show_matches {
        println!("Matches ({}):", leaderboard.matches_played());
        for m in &leaderboard.matches {
            println!(
                "  {:<width$} vs {:<width$}  {:>7} : {:<7}",
                m.strategy_a, m.strategy_b, m.score_a, m.score_b
            );
        }
        println!();
    }

    println!("{:>4}  {:<width$}  {:>9}", "Rank", "Strategy", "Score");
    for (i, entry) in leaderboard.entries.iter().enumerate() {
        println!("{:>4}  {:<width$}  {:>9}", i + 1, entry.name, entry.score);
    }
}
