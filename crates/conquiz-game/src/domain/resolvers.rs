//! Winner policies for marking conflicts.

use std::fmt::Debug;

use super::capture::MarkingConflict;
use super::player::Player;
use super::values::{AnswerId, PlayerId};

/// Picks the winner of a marking conflict once its question is settled.
pub trait ConflictResolver: Send + Sync + Debug {
    /// Returns the winning player, or `None` if the conflict has no players.
    fn get_winner(
        &self,
        conflict: &MarkingConflict,
        correct_answer: Option<AnswerId>,
    ) -> Option<PlayerId>;
}

/// Correct answers beat wrong ones, wrong ones beat silence; within a tier the
/// earliest answer wins and ids break exact ties.
#[derive(Debug, Default, Clone, Copy)]
pub struct FastestCorrectAnswerResolver;

impl FastestCorrectAnswerResolver {
    fn tier(player: &Player, correct_answer: Option<AnswerId>) -> u8 {
        if player.answered_correctly(correct_answer) {
            0
        } else if player.is_answered() {
            1
        } else {
            2
        }
    }
}

impl ConflictResolver for FastestCorrectAnswerResolver {
    fn get_winner(
        &self,
        conflict: &MarkingConflict,
        correct_answer: Option<AnswerId>,
    ) -> Option<PlayerId> {
        conflict
            .players
            .iter()
            .min_by_key(|player| {
                (
                    Self::tier(player, correct_answer),
                    player.answer().map(|answer| answer.answered_at),
                    player.id,
                )
            })
            .map(|player| player.id)
    }
}
