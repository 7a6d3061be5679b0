//! Built-in strategies
//!
//! The simulation engines only need the [`Agent`] contract; these are the
//! stock strategies used by the CLI, the WASM bindings and the tests.

use crate::error::{Result, SimulationError};
use crate::payoff::payoff;
use crate::random::SeededRng;
use crate::registry::StrategyRegistry;
use crate::strategy::{Agent, History, Move};

/// Always cooperate, never defect.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysCooperate;

impl Agent for AlwaysCooperate {
    fn decide(&mut self, _rng: &mut SeededRng) -> Move {
        Move::Cooperate
    }
}

/// Always defect, never cooperate.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysDefect;

impl Agent for AlwaysDefect {
    fn decide(&mut self, _rng: &mut SeededRng) -> Move {
        Move::Defect
    }
}

/// Copy opponent's last move. Start with cooperate.
#[derive(Clone, Debug, Default)]
pub struct TitForTat {
    history: History,
}

impl TitForTat {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Agent for TitForTat {
    fn decide(&mut self, _rng: &mut SeededRng) -> Move {
        self.history
            .last()
            .map_or(Move::Cooperate, |(_, opponent)| opponent)
    }

    fn observe(&mut self, own: Move, opponent: Move) {
        self.history.record(own, opponent);
    }
}

/// Tit-for-Tat but start with defect.
#[derive(Clone, Debug, Default)]
pub struct SuspiciousTitForTat {
    history: History,
}

impl Agent for SuspiciousTitForTat {
    fn decide(&mut self, _rng: &mut SeededRng) -> Move {
        self.history
            .last()
            .map_or(Move::Defect, |(_, opponent)| opponent)
    }

    fn observe(&mut self, own: Move, opponent: Move) {
        self.history.record(own, opponent);
    }
}

/// Random choice each round, cooperating with probability `cooperate_bias`.
#[derive(Clone, Copy, Debug)]
pub struct RandomAgent {
    cooperate_bias: f64,
}

impl RandomAgent {
    /// `cooperate_bias` is clamped into `[0, 1]`
    pub fn with_bias(cooperate_bias: f64) -> Self {
        Self {
            cooperate_bias: cooperate_bias.clamp(0.0, 1.0),
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::with_bias(0.5)
    }
}

impl Agent for RandomAgent {
    fn decide(&mut self, rng: &mut SeededRng) -> Move {
        if rng.chance(self.cooperate_bias) {
            Move::Cooperate
        } else {
            Move::Defect
        }
    }
}

/// Cooperate until the opponent defects more than `noise_tolerance` times,
/// then always defect.
#[derive(Clone, Debug, Default)]
pub struct GrimTrigger {
    history: History,
    noise_tolerance: usize,
}

impl GrimTrigger {
    pub fn with_tolerance(noise_tolerance: usize) -> Self {
        Self {
            history: History::new(),
            noise_tolerance,
        }
    }
}

impl Agent for GrimTrigger {
    fn decide(&mut self, _rng: &mut SeededRng) -> Move {
        if self.history.opponent_defections() > self.noise_tolerance {
            Move::Defect
        } else {
            Move::Cooperate
        }
    }

    fn observe(&mut self, own: Move, opponent: Move) {
        self.history.record(own, opponent);
    }
}

/// Win-stay, lose-switch.
/// - If last round was good (3+ points), repeat move
/// - If last round was bad (<3 points), switch move
#[derive(Clone, Debug, Default)]
pub struct Pavlov {
    history: History,
}

impl Agent for Pavlov {
    fn decide(&mut self, _rng: &mut SeededRng) -> Move {
        let Some((own, opponent)) = self.history.last() else {
            return Move::Cooperate;
        };

        let (score, _) = payoff(own, opponent);
        if score >= 3 {
            own
        } else {
            own.flipped()
        }
    }

    fn observe(&mut self, own: Move, opponent: Move) {
        self.history.record(own, opponent);
    }
}

/// Defect only if opponent defected twice in a row.
#[derive(Clone, Debug, Default)]
pub struct TitForTwoTats {
    history: History,
}

impl Agent for TitForTwoTats {
    fn decide(&mut self, _rng: &mut SeededRng) -> Move {
        match self.history.opponent() {
            [.., Move::Defect, Move::Defect] => Move::Defect,
            _ => Move::Cooperate,
        }
    }

    fn observe(&mut self, own: Move, opponent: Move) {
        self.history.record(own, opponent);
    }
}

struct Builtin {
    name: &'static str,
    description: &'static str,
    make: fn() -> Box<dyn Agent>,
}

fn boxed<A: Agent + Default + 'static>() -> Box<dyn Agent> {
    Box::new(A::default())
}

const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "Tit for Tat",
        description: "Copies opponent's last move. Starts by cooperating.",
        make: boxed::<TitForTat>,
    },
    Builtin {
        name: "Always Cooperate",
        description: "Never defects. Always cooperates.",
        make: boxed::<AlwaysCooperate>,
    },
    Builtin {
        name: "Always Defect",
        description: "Never cooperates. Always defects.",
        make: boxed::<AlwaysDefect>,
    },
    Builtin {
        name: "Random",
        description: "Randomly cooperates or defects each round.",
        make: boxed::<RandomAgent>,
    },
    Builtin {
        name: "Grim Trigger",
        description: "Cooperates until betrayed, then always defects.",
        make: boxed::<GrimTrigger>,
    },
    Builtin {
        name: "Pavlov",
        description: "Repeats move if outcome was good, switches if bad.",
        make: boxed::<Pavlov>,
    },
    Builtin {
        name: "Tit for Two Tats",
        description: "Only retaliates after two consecutive defections.",
        make: boxed::<TitForTwoTats>,
    },
    Builtin {
        name: "Suspicious Tit for Tat",
        description: "Like Tit for Tat, but starts with defect.",
        make: boxed::<SuspiciousTitForTat>,
    },
];

/// The four strategies of the classic line-up, in registry order
pub const DEFAULT_LINEUP: [&str; 4] = [
    "Tit for Tat",
    "Always Cooperate",
    "Always Defect",
    "Random",
];

/// "Tit for Tat", "tit-for-tat" and "TitForTat" all name the same strategy
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn lookup(name: &str) -> Result<&'static Builtin> {
    let wanted = normalize(name);
    BUILTINS
        .iter()
        .find(|b| normalize(b.name) == wanted)
        .ok_or_else(|| SimulationError::InvalidAgent {
            kind: name.to_string(),
            capability: "decide",
        })
}

/// Display names of every built-in strategy
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}

pub fn describe(name: &str) -> Result<&'static str> {
    Ok(lookup(name)?.description)
}

/// Canonical display name for any accepted spelling
pub fn canonical_name(name: &str) -> Result<&'static str> {
    Ok(lookup(name)?.name)
}

/// A fresh agent of the named strategy
pub fn agent(name: &str) -> Result<Box<dyn Agent>> {
    Ok((lookup(name)?.make)())
}

/// Registry of the named built-ins, in the order given
pub fn registry<S: AsRef<str>>(names: &[S]) -> Result<StrategyRegistry> {
    let mut registry = StrategyRegistry::new();
    for name in names {
        let builtin = lookup(name.as_ref())?;
        registry.register_boxed(builtin.name, Box::new(builtin.make))?;
    }
    Ok(registry)
}

/// Registry of [`DEFAULT_LINEUP`]
pub fn default_registry() -> Result<StrategyRegistry> {
    registry(&DEFAULT_LINEUP)
}

/// Registry of every built-in strategy
pub fn full_registry() -> Result<StrategyRegistry> {
    let all: Vec<&str> = names().collect();
    registry(all.as_slice())
}
