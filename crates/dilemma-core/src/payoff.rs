//! Payoff matrix for the Prisoner's Dilemma

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::strategy::Move;

/// Scores for every ordered pair of moves, as (row player, column player).
///
/// The table is indexed by move, so a constructed matrix is always total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffMatrix {
    table: [[(u32, u32); 2]; 2],
}

impl PayoffMatrix {
    /// Reward 3, Temptation 5, Sucker 0, Punishment 1
    pub const fn standard() -> Self {
        Self {
            table: [[(3, 3), (0, 5)], [(5, 0), (1, 1)]],
        }
    }

    /// Build a matrix from explicit entries.
    ///
    /// Every move pair must appear exactly once, and swapping the players
    /// must swap the scores.
    pub fn from_entries(entries: &[((Move, Move), (u32, u32))]) -> Result<Self> {
        let mut slots: [[Option<(u32, u32)>; 2]; 2] = [[None; 2]; 2];

        for &((row, column), scores) in entries {
            let slot = &mut slots[row.index()][column.index()];
            if slot.is_some() {
                return Err(SimulationError::InvalidPayoff {
                    row,
                    column,
                    reason: "entry defined more than once",
                });
            }
            *slot = Some(scores);
        }

        let mut table = [[(0, 0); 2]; 2];
        for row in Move::ALL {
            for column in Move::ALL {
                table[row.index()][column.index()] = slots[row.index()][column.index()]
                    .ok_or(SimulationError::InvalidPayoff {
                        row,
                        column,
                        reason: "entry missing",
                    })?;
            }
        }

        for row in Move::ALL {
            for column in Move::ALL {
                let (a, b) = table[row.index()][column.index()];
                let (swapped_a, swapped_b) = table[column.index()][row.index()];
                if (a, b) != (swapped_b, swapped_a) {
                    return Err(SimulationError::InvalidPayoff {
                        row,
                        column,
                        reason: "scores are not symmetric under player swap",
                    });
                }
            }
        }

        Ok(Self { table })
    }

    /// Returns (score_a, score_b)
    pub fn score(&self, a: Move, b: Move) -> (u32, u32) {
        self.table[a.index()][b.index()]
    }
}

impl Default for PayoffMatrix {
    fn default() -> Self {
        Self::standard()
    }
}

/// Standard payoff lookup
/// Returns (score_a, score_b)
pub fn payoff(a: Move, b: Move) -> (u32, u32) {
    PayoffMatrix::standard().score(a, b)
}
