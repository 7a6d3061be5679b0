//! Moves, the agent decision contract, and per-agent history

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::random::SeededRng;

/// A move in the Prisoner's Dilemma
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Cooperate,
    Defect,
}

impl Move {
    pub const ALL: [Move; 2] = [Move::Cooperate, Move::Defect];

    /// The opposite move, used when noise flips an intended move
    pub fn flipped(self) -> Self {
        match self {
            Move::Cooperate => Move::Defect,
            Move::Defect => Move::Cooperate,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Move::Cooperate => 0,
            Move::Defect => 1,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Cooperate => f.write_str("C"),
            Move::Defect => f.write_str("D"),
        }
    }
}

/// The decision capability every strategy implements.
///
/// An agent is a single instance of a strategy kind. It is created fresh
/// for each match and only ever sees what the match tells it through
/// [`Agent::observe`]; it has no access to its opponent's internals.
pub trait Agent {
    /// Pick the intended move for the next round.
    ///
    /// `rng` is this agent's own stream for the current match. Deterministic
    /// strategies simply ignore it.
    fn decide(&mut self, rng: &mut SeededRng) -> Move;

    /// Called after every round with the moves that were actually played,
    /// after noise. Agents that keep no history can rely on the default.
    fn observe(&mut self, _own: Move, _opponent: Move) {}
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    fn decide(&mut self, rng: &mut SeededRng) -> Move {
        (**self).decide(rng)
    }

    fn observe(&mut self, own: Move, opponent: Move) {
        (**self).observe(own, opponent)
    }
}

/// Both sides of the rounds an agent has played so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct History {
    own: Vec<Move>,
    opponent: Vec<Move>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, own: Move, opponent: Move) {
        self.own.push(own);
        self.opponent.push(opponent);
    }

    pub fn own(&self) -> &[Move] {
        &self.own
    }

    pub fn opponent(&self) -> &[Move] {
        &self.opponent
    }

    /// The last round as `(own, opponent)`
    pub fn last(&self) -> Option<(Move, Move)> {
        Some((*self.own.last()?, *self.opponent.last()?))
    }

    pub fn len(&self) -> usize {
        self.own.len()
    }

    pub fn is_empty(&self) -> bool {
        self.own.is_empty()
    }

    pub fn opponent_defections(&self) -> usize {
        self.opponent.iter().filter(|m| **m == Move::Defect).count()
    }
}
