//! Error types for the simulation kernel

use thiserror::Error;

use crate::strategy::Move;

/// Everything that can go wrong while setting up or running a simulation.
///
/// All variants are raised synchronously, before or between units of work.
/// None of them are retryable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("invalid configuration: `{field}` {reason}")]
    Config { field: &'static str, reason: String },

    #[error("strategy `{kind}` does not provide the `{capability}` capability")]
    InvalidAgent {
        kind: String,
        capability: &'static str,
    },

    #[error("invalid payoff entry ({row}, {column}): {reason}")]
    InvalidPayoff {
        row: Move,
        column: Move,
        reason: &'static str,
    },

    #[error("run cancelled after {completed} completed matches")]
    Cancelled { completed: usize },
}

impl SimulationError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Config {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;

/// Probabilities must be finite and inside `[0, 1]`.
pub(crate) fn ensure_probability(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimulationError::config(
            field,
            format!("must be within [0, 1], got {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_bounds() {
        assert!(ensure_probability("noise", 0.0).is_ok());
        assert!(ensure_probability("noise", 1.0).is_ok());
        assert!(ensure_probability("noise", 0.5).is_ok());
        assert!(ensure_probability("noise", -0.01).is_err());
        assert!(ensure_probability("noise", 1.01).is_err());
        assert!(ensure_probability("noise", f64::NAN).is_err());
    }

    #[test]
    fn test_messages_name_the_problem() {
        let err = ensure_probability("mutation_rate", 2.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: `mutation_rate` must be within [0, 1], got 2"
        );

        let err = SimulationError::InvalidAgent {
            kind: "Bogus".to_string(),
            capability: "decide",
        };
        assert_eq!(
            err.to_string(),
            "strategy `Bogus` does not provide the `decide` capability"
        );
    }
}
