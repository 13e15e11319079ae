//! Player entity as seen by a single game.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::values::{AnswerId, FieldId, PlayerId};

/// An answer given by a player, stamped with the time it arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAnswer {
    /// The chosen answer.
    pub answer_id: AnswerId,
    /// When the answer was received.
    pub answered_at: DateTime<Utc>,
}

/// A seated player with per-round transient state.
///
/// Equality is by identity only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Player identifier.
    pub id: PlayerId,
    /// When the player connected to the game.
    pub connected_at: DateTime<Utc>,
    answer: Option<PlayerAnswer>,
    marked_field: Option<FieldId>,
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Player {}

impl Player {
    /// Creates a player without any answer or mark.
    #[must_use]
    pub fn new(id: PlayerId, connected_at: DateTime<Utc>) -> Self {
        Self {
            id,
            connected_at,
            answer: None,
            marked_field: None,
        }
    }

    /// Returns the current answer, if any.
    #[must_use]
    pub fn answer(&self) -> Option<PlayerAnswer> {
        self.answer
    }

    /// Returns true once the player has answered the current question.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }

    /// Returns true if the player's answer matches `correct`. An unanswered
    /// player is never correct.
    #[must_use]
    pub fn answered_correctly(&self, correct: Option<AnswerId>) -> bool {
        match (self.answer, correct) {
            (Some(answer), Some(correct)) => answer.answer_id == correct,
            _ => false,
        }
    }

    pub(crate) fn set_answer(&mut self, answer_id: AnswerId, answered_at: DateTime<Utc>) {
        self.answer = Some(PlayerAnswer {
            answer_id,
            answered_at,
        });
    }

    pub(crate) fn clear_answer(&mut self) {
        self.answer = None;
    }

    /// Returns the field the player marked this round.
    #[must_use]
    pub fn marked_field(&self) -> Option<FieldId> {
        self.marked_field
    }

    pub(crate) fn mark_field(&mut self, field_id: FieldId) {
        self.marked_field = Some(field_id);
    }

    pub(crate) fn clear_marked_field(&mut self) {
        self.marked_field = None;
    }
}
