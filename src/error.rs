use thiserror::Error;

use crate::hand::Rank;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },
    #[error("invalid card rank {rank}, expected 1..=13")]
    InvalidCard { rank: Rank },
}

impl SimulationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SimulationError::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the configuration field that failed validation, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            SimulationError::InvalidConfiguration { field, .. } => Some(field),
            SimulationError::InvalidCard { .. } => None,
        }
    }
}
