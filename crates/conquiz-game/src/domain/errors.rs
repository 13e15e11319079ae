//! Rule violations raised by the `Game` aggregate.

use thiserror::Error;

use super::game::GameState;
use super::values::{AnswerId, FieldId, PlayerId};

/// Errors raised by game operations. None of them leaves a mutation or an
/// event behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Seats can no longer change.
    #[error("game has already started")]
    GameAlreadyStarted,

    /// Every seat is taken.
    #[error("game is full")]
    GameIsFull,

    /// Attacks are only accepted from the active player of an open battling round.
    #[error("game is not waiting for an attack")]
    GameNotWaitingForAttack,

    /// Another player is active this round.
    #[error("it is not the turn of player {0}")]
    NotYourTurn(PlayerId),

    /// The field already belongs to someone (or to the actor).
    #[error("field {0} is already owned")]
    FieldAlreadyOwned(FieldId),

    /// No such field on the board.
    #[error("field {0} does not exist")]
    FieldNotFound(FieldId),

    /// The player has no seat at this game.
    #[error("player {0} is not in the game")]
    PlayerNotInGame(PlayerId),

    /// One mark per player per round.
    #[error("player {0} has already marked a field this round")]
    FieldAlreadyMarked(PlayerId),

    /// Only contenders may answer.
    #[error("player {0} does not take part in the current battle")]
    NotAParticipant(PlayerId),

    /// One answer per question.
    #[error("player {0} has already answered")]
    AlreadyAnswered(PlayerId),

    /// The answer belongs to some other question.
    #[error("answer {0} does not belong to the current question")]
    ForeignAnswer(AnswerId),

    /// A client action arrived while the game cannot accept it.
    #[error("{action} is not allowed while the game is {state}")]
    ActionNotAllowed {
        /// The rejected action.
        action: &'static str,
        /// The state at the time.
        state: GameState,
    },

    /// A stage operation was dispatched in a state that does not serve it.
    #[error("internal fault: {operation} dispatched while the game is {state}")]
    InvalidStage {
        /// The misrouted operation.
        operation: &'static str,
        /// The state at the time.
        state: GameState,
    },
}

impl GameError {
    /// Returns true for logic faults, as opposed to rejected client actions.
    #[must_use]
    pub fn is_internal_fault(&self) -> bool {
        matches!(self, Self::InvalidStage { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_invalid_stage_is_internal_fault() {
        let fault = GameError::InvalidStage {
            operation: "start_round",
            state: GameState::Ended,
        };

        assert!(fault.is_internal_fault());
        assert!(!GameError::GameIsFull.is_internal_fault());
        assert!(!GameError::NotYourTurn(PlayerId(1)).is_internal_fault());
    }

    #[test]
    fn test_messages_name_the_state() {
        let err = GameError::ActionNotAllowed {
            action: "mark_field",
            state: GameState::BattlingStage,
        };

        assert_eq!(
            err.to_string(),
            "mark_field is not allowed while the game is battling_stage"
        );
    }
}
