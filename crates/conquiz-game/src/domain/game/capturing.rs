//! Capturing stage: simultaneous marking, marking battles, bulk capture.

use tracing::info;

use super::{DuelStage, Game, GameContext, GameState};
use crate::domain::capture::MarkingConflict;
use crate::domain::errors::GameError;
use crate::domain::events::{
    CapturingBattleCategorySet, CapturingBattleFinished, CapturingBattlePlayerAnswered,
    CapturingBattleStarted, FieldCapture, FieldMarked, FieldsMarked, GameEventKind,
    MarkingConflictDetected, RoundFinished, RoundStarted, StageFinished, StageStarted,
};
use crate::domain::values::{Answer, Category, FieldId, PlayerId, Stage};

impl Game {
    pub(super) fn start_capturing_stage(&mut self, ctx: &GameContext<'_>) {
        self.state = GameState::CapturingStage;
        self.capture.start();
        info!(game_id = %self.id, "capturing stage started");
        self.record(
            GameEventKind::StageStarted(StageStarted {
                stage: Stage::Capturing,
                rounds_count: None,
            }),
            ctx,
        );
    }

    pub(super) fn start_capturing_round(&mut self, ctx: &GameContext<'_>) {
        self.capture.start_round();
        for player in &mut self.players {
            player.clear_marked_field();
            player.clear_answer();
        }
        self.record(
            GameEventKind::RoundStarted(RoundStarted {
                stage: Stage::Capturing,
                round_number: self.capture.round_number,
                player_id: None,
                duration_seconds: self.settings.round_time_seconds,
            }),
            ctx,
        );
    }

    /// Marks a free field for `player_id`, producing `FieldMarked`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::ActionNotAllowed` outside an open capturing round,
    /// `GameError::PlayerNotInGame`, `GameError::FieldAlreadyMarked`,
    /// `GameError::FieldNotFound` or `GameError::FieldAlreadyOwned`.
    pub fn mark_field(
        &mut self,
        player_id: PlayerId,
        field_id: FieldId,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        if self.state != GameState::CapturingStage || self.capture.marks_closed {
            return Err(self.not_allowed("mark_field"));
        }
        if self.player(player_id)?.marked_field().is_some() {
            return Err(GameError::FieldAlreadyMarked(player_id));
        }
        let field = self
            .field(field_id)
            .ok_or(GameError::FieldNotFound(field_id))?;
        if field.is_captured() {
            return Err(GameError::FieldAlreadyOwned(field_id));
        }

        self.capture.mark_field(field_id, player_id);
        self.player_mut(player_id)?.mark_field(field_id);
        self.record(
            GameEventKind::FieldMarked(FieldMarked {
                player_id,
                field_id,
            }),
            ctx,
        );
        Ok(())
    }

    /// Closes marking once every player has marked a field.
    pub fn check_are_all_players_marked_fields(&mut self, ctx: &GameContext<'_>) {
        if self.state != GameState::CapturingStage || self.capture.marks_closed {
            return;
        }
        if self
            .players
            .iter()
            .all(|player| player.marked_field().is_some())
        {
            self.close_marking(ctx);
        }
    }

    pub(super) fn close_marking(&mut self, ctx: &GameContext<'_>) {
        self.capture.marks_closed = true;
        self.record(
            GameEventKind::FieldsMarked(FieldsMarked {
                marked_fields: self.capture.marked_fields.clone(),
            }),
            ctx,
        );
    }

    /// Reports the next marking conflict, or closes the round by capturing
    /// every singly-marked field when none is left.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` outside the capturing stage.
    pub fn check_marking_conflict(&mut self, ctx: &GameContext<'_>) -> Result<(), GameError> {
        if self.state != GameState::CapturingStage {
            return Err(self.invalid_stage("check_marking_conflict"));
        }

        match self.capture.marking_conflict().cloned() {
            Some(conflict) => {
                self.record(
                    GameEventKind::MarkingConflictDetected(MarkingConflictDetected {
                        field_id: conflict.field_id,
                        players: conflict.players,
                    }),
                    ctx,
                );
                Ok(())
            }
            None => self.finish_capturing_round(ctx),
        }
    }

    /// Opens a marking battle over the first conflicting field.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` unless a conflict is pending in the
    /// capturing stage.
    pub fn start_capturing_battle(&mut self, ctx: &GameContext<'_>) -> Result<(), GameError> {
        if self.state != GameState::CapturingStage {
            return Err(self.invalid_stage("start_capturing_battle"));
        }
        let Some(conflict) = self.capture.marking_conflict().cloned() else {
            return Err(self.invalid_stage("start_capturing_battle"));
        };

        self.state = GameState::Dueling(DuelStage::Capturing);
        self.capture.start_battle(conflict.field_id);
        self.clear_answers(&conflict.players);
        self.record(
            GameEventKind::CapturingBattleStarted(CapturingBattleStarted {
                field_id: conflict.field_id,
                players: conflict.players,
            }),
            ctx,
        );
        Ok(())
    }

    /// Markers of the field contested by the running marking battle.
    pub(super) fn capturing_contenders(&self) -> Vec<PlayerId> {
        self.capture
            .battle_field
            .and_then(|field_id| {
                self.capture
                    .marked_fields
                    .iter()
                    .find(|marked| marked.field_id == field_id)
            })
            .map(|marked| marked.players.clone())
            .unwrap_or_default()
    }

    pub(super) fn set_capturing_battle_category(
        &mut self,
        category: Category,
        ctx: &GameContext<'_>,
    ) {
        self.capture.category = Some(category.clone());
        self.record(
            GameEventKind::CapturingBattleCategorySet(CapturingBattleCategorySet { category }),
            ctx,
        );
    }

    /// Records a contender's answer, producing `CapturingBattlePlayerAnswered`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::ActionNotAllowed` unless a marking-battle question
    /// is open, `GameError::NotAParticipant` for non-contenders,
    /// `GameError::ForeignAnswer` or `GameError::AlreadyAnswered`.
    pub fn send_marking_conflict_answer(
        &mut self,
        player_id: PlayerId,
        answer: &Answer,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        if self.state != GameState::Dueling(DuelStage::Capturing) || !self.question_open {
            return Err(self.not_allowed("send_marking_conflict_answer"));
        }
        self.player(player_id)?;
        if !self.capturing_contenders().contains(&player_id) {
            return Err(GameError::NotAParticipant(player_id));
        }

        self.record_answer(player_id, answer, ctx)?;
        self.record(
            GameEventKind::CapturingBattlePlayerAnswered(CapturingBattlePlayerAnswered {
                player_id,
            }),
            ctx,
        );
        Ok(())
    }

    /// Decides the running marking battle: the winner keeps the mark, every
    /// other contender loses theirs.
    pub(super) fn finish_capturing_battle(
        &mut self,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        let Some(field_id) = self.capture.battle_field else {
            return Err(self.invalid_stage("finish_capturing_battle"));
        };
        let contenders = self.capturing_contenders();
        let conflict = MarkingConflict {
            field_id,
            players: self
                .players
                .iter()
                .filter(|player| contenders.contains(&player.id))
                .cloned()
                .collect(),
        };
        let correct_answer_id = self.capture.correct_answer;
        let winner_id = ctx
            .conflict_resolver
            .get_winner(&conflict, correct_answer_id)
            .ok_or_else(|| self.invalid_stage("finish_capturing_battle"))?;

        let losers = self.capture.keep_only(field_id, winner_id);
        for player in &mut self.players {
            if losers.contains(&player.id) {
                player.clear_marked_field();
            }
        }
        self.clear_answers(&contenders);
        self.capture.end_battle();
        self.question_open = false;
        self.state = GameState::CapturingStage;
        info!(game_id = %self.id, %field_id, %winner_id, "marking battle decided");
        self.record(
            GameEventKind::CapturingBattleFinished(CapturingBattleFinished {
                field_id,
                winner_id,
                correct_answer_id,
            }),
            ctx,
        );
        Ok(())
    }

    /// Captures every singly-marked field and closes the round.
    pub(super) fn finish_capturing_round(
        &mut self,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        let step = self.settings.field_value_step;
        let mut captured_fields = Vec::new();
        for (field_id, owner_id) in self.capture.single_marks() {
            let field = self.field_mut(field_id)?;
            if field.is_captured() {
                continue;
            }
            field.capture(owner_id, false, step);
            captured_fields.push(FieldCapture {
                field_id,
                owner_id,
                new_field_value: field.value,
            });
        }

        self.capture.marks_closed = true;
        self.record(
            GameEventKind::RoundFinished(RoundFinished {
                stage: Stage::Capturing,
                round_number: self.capture.round_number,
                captured_fields,
            }),
            ctx,
        );
        Ok(())
    }

    pub(super) fn check_capturing_round_outcome(&mut self, ctx: &GameContext<'_>) {
        if self.all_fields_captured() {
            self.record(
                GameEventKind::StageFinished(StageFinished {
                    stage: Stage::Capturing,
                }),
                ctx,
            );
            return;
        }

        self.capture.stop_round();
        self.start_capturing_round(ctx);
    }
}
