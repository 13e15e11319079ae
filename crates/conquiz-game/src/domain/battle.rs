//! State of the battling stage and of the one-on-one duel it hosts.

use serde::{Deserialize, Serialize};

use super::field::Field;
use super::player::Player;
use super::values::{AnswerId, Category, DuelOutcome, FieldId, PlayerId, QuestionId};

/// An attack on an owned field, waiting for its duel to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    /// The attacking player.
    pub attacker: PlayerId,
    /// The current owner of the field.
    pub defender: PlayerId,
    /// The attacked field.
    pub field_id: FieldId,
}

/// A multi-round trivia contest deciding who keeps a field.
///
/// The default value is the idle duel; `stop` returns it to that state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duel {
    /// Current 1-based duel round, `0` while idle.
    pub round_number: u32,
    /// The attacking player.
    pub attacker: Option<PlayerId>,
    /// The defending player.
    pub defender: Option<PlayerId>,
    /// The contested field.
    pub field_id: Option<FieldId>,
    /// Category chosen for the whole duel.
    pub category: Option<Category>,
    /// Question of the current duel round.
    pub question: Option<QuestionId>,
    /// Correct answer to that question.
    pub correct_answer: Option<AnswerId>,
}

impl Duel {
    pub(crate) fn start(&mut self, attack: Attack) {
        self.round_number = 1;
        self.attacker = Some(attack.attacker);
        self.defender = Some(attack.defender);
        self.field_id = Some(attack.field_id);
        self.category = None;
        self.question = None;
        self.correct_answer = None;
    }

    /// Returns true between `start` and `stop`.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.attacker.is_some()
    }

    /// Returns `(attacker, defender)` of an active duel.
    #[must_use]
    pub fn participants(&self) -> Option<(PlayerId, PlayerId)> {
        self.attacker.zip(self.defender)
    }

    /// Returns true if `player_id` is the attacker or the defender.
    #[must_use]
    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.attacker == Some(player_id) || self.defender == Some(player_id)
    }

    pub(crate) fn start_round(&mut self) {
        self.question = None;
        self.correct_answer = None;
    }

    pub(crate) fn set_question(&mut self, question_id: QuestionId, correct: Option<AnswerId>) {
        self.question = Some(question_id);
        self.correct_answer = correct;
    }

    pub(crate) fn finish_round(&mut self) {
        self.round_number += 1;
    }

    /// Decides, after `finish_round`, whether another duel round is played.
    ///
    /// The duel stops once `duel_max_rounds` rounds were played or as soon as
    /// exactly one side answered correctly. Agreement, both right or both
    /// wrong, continues it. An unanswered player counts as wrong.
    #[must_use]
    pub fn is_continuing(&self, attacker: &Player, defender: &Player, duel_max_rounds: u32) -> bool {
        let finished_by_round_number = self.round_number.saturating_sub(1) >= duel_max_rounds;
        let attacker_correct = attacker.answered_correctly(self.correct_answer);
        let defender_correct = defender.answered_correctly(self.correct_answer);
        !finished_by_round_number && attacker_correct == defender_correct
    }

    /// Settles the duel on `field` and resets every piece of duel state.
    ///
    /// The attacker takes the field only when they answered correctly and the
    /// defender did not; otherwise the field is defended.
    pub(crate) fn stop(
        &mut self,
        field: &mut Field,
        attacker: &Player,
        defender: &Player,
        step: i64,
    ) -> DuelOutcome {
        let attacker_correct = attacker.answered_correctly(self.correct_answer);
        let defender_correct = defender.answered_correctly(self.correct_answer);

        let outcome = if attacker_correct && !defender_correct {
            field.capture(attacker.id, false, step);
            DuelOutcome::Captured
        } else {
            field.defend(step);
            DuelOutcome::Defended
        };

        *self = Self::default();
        outcome
    }
}

/// Round state of the battling stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    /// Current 1-based round, `0` before the stage starts.
    pub round_number: u32,
    /// Set once the active player attacked or the round timer expired.
    pub round_closed: bool,
    /// An attack on an owned field whose duel has not started yet.
    pub attack: Option<Attack>,
    /// The duel of the current round.
    pub duel: Duel,
}

impl Battle {
    pub(crate) fn start(&mut self) {
        self.round_number = 1;
        self.round_closed = false;
    }

    pub(crate) fn stop_round(&mut self) {
        self.round_number += 1;
        self.round_closed = false;
    }
}
