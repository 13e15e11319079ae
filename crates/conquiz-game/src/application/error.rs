//! Application-level error type.

use conquiz_core::error::DomainError;
use thiserror::Error;

use crate::domain::errors::GameError;

/// Anything that can abort a handler.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The game refused the operation.
    #[error(transparent)]
    Game(#[from] GameError),

    /// A port failed: missing aggregate, version conflict, broker or trivia
    /// service unavailable.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A message could not be encoded or decoded.
    #[error("message serialization failed: {0}")]
    Serialization(String),
}

impl ServiceError {
    /// Returns true for faults in the engine or its infrastructure, as
    /// opposed to a client sending an action the game does not accept.
    #[must_use]
    pub fn is_internal_fault(&self) -> bool {
        match self {
            Self::Game(err) => err.is_internal_fault(),
            Self::Domain(_) | Self::Serialization(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::game::GameState;
    use crate::domain::values::PlayerId;

    #[test]
    fn test_rejected_actions_are_not_internal_faults() {
        let err = ServiceError::from(GameError::NotYourTurn(PlayerId(2)));

        assert!(!err.is_internal_fault());
        assert_eq!(err.to_string(), GameError::NotYourTurn(PlayerId(2)).to_string());
    }

    #[test]
    fn test_invalid_stage_and_infrastructure_are_internal_faults() {
        let stage = ServiceError::from(GameError::InvalidStage {
            operation: "start_round",
            state: GameState::Ended,
        });
        let infra = ServiceError::from(DomainError::Infrastructure("down".into()));

        assert!(stage.is_internal_fault());
        assert!(infra.is_internal_fault());
    }
}
