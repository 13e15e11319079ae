//! Preparatory stage: every player, in turn, picks a base.

use tracing::info;

use super::{Game, GameContext, GameState};
use crate::domain::errors::GameError;
use crate::domain::events::{
    BaseSelected, GameEventKind, RoundFinished, RoundStarted, StageFinished, StageStarted,
};
use crate::domain::strategies::turn_of;
use crate::domain::values::{FieldId, PlayerId, Stage};

impl Game {
    pub(super) fn start_preparatory_stage(&mut self, ctx: &GameContext<'_>) {
        self.state = GameState::PreparatoryStage;
        self.preparation.start();
        info!(game_id = %self.id, "preparatory stage started");
        self.record(
            GameEventKind::StageStarted(StageStarted {
                stage: Stage::Preparatory,
                rounds_count: u32::try_from(self.players.len()).ok(),
            }),
            ctx,
        );
    }

    pub(super) fn start_preparatory_round(&mut self, ctx: &GameContext<'_>) -> Result<(), GameError> {
        let player_id = self.active_preparatory_player()?;
        self.record(
            GameEventKind::RoundStarted(RoundStarted {
                stage: Stage::Preparatory,
                round_number: self.preparation.round_number,
                player_id: Some(player_id),
                duration_seconds: self.settings.round_time_seconds,
            }),
            ctx,
        );
        Ok(())
    }

    fn active_preparatory_player(&self) -> Result<PlayerId, GameError> {
        turn_of(self.preparation.round_number, &self.order)
            .ok_or_else(|| self.invalid_stage("select_preparatory_player"))
    }

    /// Makes `field_id` the base of `player_id`, producing `BaseSelected`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::ActionNotAllowed` outside an open preparatory
    /// round, `GameError::PlayerNotInGame`, `GameError::NotYourTurn`,
    /// `GameError::FieldNotFound` or `GameError::FieldAlreadyOwned`.
    pub fn select_base(
        &mut self,
        player_id: PlayerId,
        field_id: FieldId,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        if self.state != GameState::PreparatoryStage || self.preparation.round_closed {
            return Err(self.not_allowed("select_base"));
        }
        self.player(player_id)?;
        if self.active_preparatory_player()? != player_id {
            return Err(GameError::NotYourTurn(player_id));
        }
        let field = self
            .field(field_id)
            .ok_or(GameError::FieldNotFound(field_id))?;
        if field.is_captured() {
            return Err(GameError::FieldAlreadyOwned(field_id));
        }

        self.capture_base(player_id, field_id, ctx)
    }

    /// Round timer fallback: the active player gets the lowest free field.
    pub(super) fn assign_fallback_base(&mut self, ctx: &GameContext<'_>) -> Result<(), GameError> {
        let player_id = self.active_preparatory_player()?;
        match self.fields.iter().find(|field| !field.is_captured()) {
            Some(field) => {
                let field_id = field.id;
                self.capture_base(player_id, field_id, ctx)
            }
            None => {
                self.finish_preparatory_round(ctx);
                Ok(())
            }
        }
    }

    fn capture_base(
        &mut self,
        player_id: PlayerId,
        field_id: FieldId,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        let step = self.settings.field_value_step;
        let field = self.field_mut(field_id)?;
        field.capture(player_id, true, step);
        let new_field_value = field.value;
        self.preparation.round_closed = true;
        self.record(
            GameEventKind::BaseSelected(BaseSelected {
                player_id,
                field_id,
                new_field_value,
            }),
            ctx,
        );
        Ok(())
    }

    pub(super) fn finish_preparatory_round(&mut self, ctx: &GameContext<'_>) {
        self.preparation.round_closed = true;
        self.record(
            GameEventKind::RoundFinished(RoundFinished {
                stage: Stage::Preparatory,
                round_number: self.preparation.round_number,
                captured_fields: Vec::new(),
            }),
            ctx,
        );
    }

    pub(super) fn check_preparatory_round_outcome(
        &mut self,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        let rounds = u32::try_from(self.players.len()).unwrap_or(u32::MAX);
        if self.preparation.round_number >= rounds {
            self.record(
                GameEventKind::StageFinished(StageFinished {
                    stage: Stage::Preparatory,
                }),
                ctx,
            );
            return Ok(());
        }

        self.preparation.stop_round();
        self.start_preparatory_round(ctx)
    }
}
