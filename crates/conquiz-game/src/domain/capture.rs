//! State of the capturing stage: simultaneous marking and marking battles.

use serde::{Deserialize, Serialize};

use super::player::Player;
use super::values::{AnswerId, Category, FieldId, PlayerId, QuestionId};

/// Players that marked one unowned field in the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedField {
    /// The marked field.
    pub field_id: FieldId,
    /// Markers in the order their marks arrived.
    pub players: Vec<PlayerId>,
}

/// A field marked by two or more players, with the players' current answers.
#[derive(Debug, Clone)]
pub struct MarkingConflict {
    /// The contested field.
    pub field_id: FieldId,
    /// The contenders.
    pub players: Vec<Player>,
}

/// Round state of the capturing stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    /// Current 1-based round, `0` before the stage starts.
    pub round_number: u32,
    /// Marks accumulated this round.
    pub marked_fields: Vec<MarkedField>,
    /// Set once every player marked or the round timer expired.
    pub marks_closed: bool,
    /// Field contested by the running marking battle.
    pub battle_field: Option<FieldId>,
    /// Category of the running marking battle.
    pub category: Option<Category>,
    /// Question asked in the running marking battle.
    pub question: Option<QuestionId>,
    /// Correct answer to that question.
    pub correct_answer: Option<AnswerId>,
}

impl Capture {
    pub(crate) fn start(&mut self) {
        self.round_number = 1;
        self.start_round();
    }

    pub(crate) fn start_round(&mut self) {
        self.marked_fields.clear();
        self.marks_closed = false;
        self.end_battle();
    }

    pub(crate) fn stop_round(&mut self) {
        self.round_number += 1;
    }

    pub(crate) fn mark_field(&mut self, field_id: FieldId, player_id: PlayerId) {
        match self
            .marked_fields
            .iter_mut()
            .find(|marked| marked.field_id == field_id)
        {
            Some(marked) => marked.players.push(player_id),
            None => self.marked_fields.push(MarkedField {
                field_id,
                players: vec![player_id],
            }),
        }
    }

    /// Returns true iff some field has two or more markers.
    #[must_use]
    pub fn has_marking_conflict(&self) -> bool {
        self.marking_conflict().is_some()
    }

    /// Returns the first field with two or more markers.
    #[must_use]
    pub fn marking_conflict(&self) -> Option<&MarkedField> {
        self.marked_fields
            .iter()
            .find(|marked| marked.players.len() > 1)
    }

    /// Returns the marked fields that have exactly one marker.
    #[must_use]
    pub fn single_marks(&self) -> Vec<(FieldId, PlayerId)> {
        self.marked_fields
            .iter()
            .filter_map(|marked| match marked.players.as_slice() {
                [player_id] => Some((marked.field_id, *player_id)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn start_battle(&mut self, field_id: FieldId) {
        self.battle_field = Some(field_id);
    }

    pub(crate) fn set_question(&mut self, question_id: QuestionId, correct: Option<AnswerId>) {
        self.question = Some(question_id);
        self.correct_answer = correct;
    }

    /// Keeps `winner` as the only marker of `field_id` and returns the
    /// players whose marks were dropped.
    pub(crate) fn keep_only(&mut self, field_id: FieldId, winner: PlayerId) -> Vec<PlayerId> {
        let Some(marked) = self
            .marked_fields
            .iter_mut()
            .find(|marked| marked.field_id == field_id)
        else {
            return Vec::new();
        };
        let losers = marked
            .players
            .iter()
            .copied()
            .filter(|player_id| *player_id != winner)
            .collect();
        marked.players = vec![winner];
        losers
    }

    pub(crate) fn end_battle(&mut self) {
        self.battle_field = None;
        self.category = None;
        self.question = None;
        self.correct_answer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_marks_have_no_conflict() {
        // Arrange
        let mut capture = Capture::default();
        capture.start();

        // Act
        capture.mark_field(FieldId(1), PlayerId(1));
        capture.mark_field(FieldId(2), PlayerId(2));
        capture.mark_field(FieldId(3), PlayerId(3));

        // Assert
        assert!(!capture.has_marking_conflict());
        assert_eq!(
            capture.single_marks(),
            vec![
                (FieldId(1), PlayerId(1)),
                (FieldId(2), PlayerId(2)),
                (FieldId(3), PlayerId(3)),
            ]
        );
    }

    #[test]
    fn test_shared_mark_is_a_conflict() {
        let mut capture = Capture::default();
        capture.start();

        capture.mark_field(FieldId(4), PlayerId(1));
        capture.mark_field(FieldId(4), PlayerId(2));
        capture.mark_field(FieldId(5), PlayerId(3));

        assert!(capture.has_marking_conflict());
        let conflict = capture.marking_conflict().unwrap();
        assert_eq!(conflict.field_id, FieldId(4));
        assert_eq!(conflict.players, vec![PlayerId(1), PlayerId(2)]);
        assert_eq!(capture.single_marks(), vec![(FieldId(5), PlayerId(3))]);
    }

    #[test]
    fn test_keep_only_resolves_conflict_and_reports_losers() {
        let mut capture = Capture::default();
        capture.start();
        for player in 1..=3 {
            capture.mark_field(FieldId(4), PlayerId(player));
        }

        let losers = capture.keep_only(FieldId(4), PlayerId(2));

        assert_eq!(losers, vec![PlayerId(1), PlayerId(3)]);
        assert!(!capture.has_marking_conflict());
        assert_eq!(capture.single_marks(), vec![(FieldId(4), PlayerId(2))]);
    }

    #[test]
    fn test_start_round_clears_marks_and_battle() {
        let mut capture = Capture::default();
        capture.start();
        capture.mark_field(FieldId(1), PlayerId(1));
        capture.marks_closed = true;
        capture.start_battle(FieldId(1));
        capture.set_question(QuestionId(9), Some(AnswerId(3)));

        capture.stop_round();
        capture.start_round();

        assert_eq!(capture.round_number, 2);
        assert!(capture.marked_fields.is_empty());
        assert!(!capture.marks_closed);
        assert_eq!(capture.battle_field, None);
        assert_eq!(capture.correct_answer, None);
    }
}
