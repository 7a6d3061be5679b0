use clap::{Parser, Subcommand};

use self::{
    evolve::EvolveArg, single_match::MatchArg, strategies::StrategiesArg,
    tournament::TournamentArg,
};

mod evolve;
mod single_match;
mod strategies;
mod tournament;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play a single match between two strategies
    #[command(name = "match")]
    Match(#[clap(flatten)] MatchArg),
    /// Run a round-robin tournament, self-play included
    Tournament(#[clap(flatten)] TournamentArg),
    /// Evolve a population of strategies
    Evolve(#[clap(flatten)] EvolveArg),
    /// List the built-in strategies
    Strategies(#[clap(flatten)] StrategiesArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    crate::util::init_logging(args.verbose);
    match args.mode {
        Mode::Match(arg) => single_match::run(&arg)?,
        Mode::Tournament(arg) => tournament::run(&arg)?,
        Mode::Evolve(arg) => evolve::run(&arg)?,
        Mode::Strategies(arg) => strategies::run(&arg)?,
    }
    Ok(())
}
