//! Battling stage: turn-based attacks and the duels they trigger.

use tracing::info;

use super::{DuelStage, Game, GameContext, GameState};
use crate::domain::battle::Attack;
use crate::domain::errors::GameError;
use crate::domain::events::{
    DuelCategorySet, DuelFinished, DuelRoundFinished, DuelRoundStarted, DuelStarted,
    FieldCaptured, GameEventKind, PlayerAnswered, PlayerFieldAttacked, RoundFinished,
    RoundStarted, StageFinished, StageStarted,
};
use crate::domain::strategies::turn_of;
use crate::domain::values::{Answer, Category, FieldId, PlayerId, Stage};

impl Game {
    fn battle_rounds_count(&self) -> u32 {
        self.settings.battle_rounds_count(self.players.len())
    }

    pub(super) fn start_battling_stage(&mut self, ctx: &GameContext<'_>) {
        self.state = GameState::BattlingStage;
        self.battle.start();
        info!(game_id = %self.id, rounds = self.battle_rounds_count(), "battling stage started");
        self.record(
            GameEventKind::StageStarted(StageStarted {
                stage: Stage::Battling,
                rounds_count: Some(self.battle_rounds_count()),
            }),
            ctx,
        );
    }

    pub(super) fn start_battling_round(&mut self, ctx: &GameContext<'_>) -> Result<(), GameError> {
        let player_id = self.active_battling_player()?;
        self.battle.round_closed = false;
        self.record(
            GameEventKind::RoundStarted(RoundStarted {
                stage: Stage::Battling,
                round_number: self.battle.round_number,
                player_id: Some(player_id),
                duration_seconds: self.settings.round_time_seconds,
            }),
            ctx,
        );
        Ok(())
    }

    fn active_battling_player(&self) -> Result<PlayerId, GameError> {
        turn_of(self.battle.round_number, &self.order)
            .ok_or_else(|| self.invalid_stage("select_battling_player"))
    }

    /// Lets the active player attack `field_id`.
    ///
    /// A free field is captured at once (`FieldCaptured`); a field owned by
    /// another player opens a duel (`PlayerFieldAttacked`).
    ///
    /// # Errors
    ///
    /// Returns `GameError::GameNotWaitingForAttack` outside an open battling
    /// round, `GameError::PlayerNotInGame`, `GameError::NotYourTurn`,
    /// `GameError::FieldNotFound` or `GameError::FieldAlreadyOwned` when the
    /// attacker already owns the field.
    pub fn attack_field(
        &mut self,
        player_id: PlayerId,
        field_id: FieldId,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        if self.state != GameState::BattlingStage || self.battle.round_closed {
            return Err(GameError::GameNotWaitingForAttack);
        }
        self.player(player_id)?;
        if self.active_battling_player()? != player_id {
            return Err(GameError::NotYourTurn(player_id));
        }
        let owner = self
            .field(field_id)
            .ok_or(GameError::FieldNotFound(field_id))?
            .owner();

        match owner {
            Some(owner) if owner == player_id => Err(GameError::FieldAlreadyOwned(field_id)),
            Some(defender) => {
                self.battle.attack = Some(Attack {
                    attacker: player_id,
                    defender,
                    field_id,
                });
                self.battle.round_closed = true;
                self.state = GameState::Dueling(DuelStage::Battling);
                info!(game_id = %self.id, attacker = %player_id, %defender, %field_id, "field attacked");
                self.record(
                    GameEventKind::PlayerFieldAttacked(PlayerFieldAttacked {
                        attacker_id: player_id,
                        defender_id: defender,
                        field_id,
                    }),
                    ctx,
                );
                Ok(())
            }
            None => {
                let step = self.settings.field_value_step;
                let field = self.field_mut(field_id)?;
                field.capture(player_id, false, step);
                let new_field_value = field.value;
                self.battle.round_closed = true;
                self.record(
                    GameEventKind::FieldCaptured(FieldCaptured {
                        field_id,
                        capturer_id: player_id,
                        new_field_value,
                    }),
                    ctx,
                );
                Ok(())
            }
        }
    }

    /// Opens the duel for the pending attack, producing `DuelStarted`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` unless an attack is pending.
    pub fn start_duel(&mut self, ctx: &GameContext<'_>) -> Result<(), GameError> {
        if self.state != GameState::Dueling(DuelStage::Battling) {
            return Err(self.invalid_stage("start_duel"));
        }
        let Some(attack) = self.battle.attack.take() else {
            return Err(self.invalid_stage("start_duel"));
        };

        self.battle.duel.start(attack);
        self.clear_answers(&[attack.attacker, attack.defender]);
        self.record(
            GameEventKind::DuelStarted(DuelStarted {
                attacker_id: attack.attacker,
                defender_id: attack.defender,
                field_id: attack.field_id,
            }),
            ctx,
        );
        Ok(())
    }

    pub(super) fn set_duel_category(
        &mut self,
        category: Category,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        if !self.battle.duel.is_active() {
            return Err(self.invalid_stage("set_duel_category"));
        }
        self.battle.duel.category = Some(category.clone());
        self.record(
            GameEventKind::DuelCategorySet(DuelCategorySet { category }),
            ctx,
        );
        Ok(())
    }

    /// Opens the next duel round, producing `DuelRoundStarted`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` unless a duel is running.
    pub fn start_duel_round(&mut self, ctx: &GameContext<'_>) -> Result<(), GameError> {
        let Some((attacker, defender)) = self
            .battle
            .duel
            .participants()
            .filter(|_| self.state == GameState::Dueling(DuelStage::Battling))
        else {
            return Err(self.invalid_stage("start_duel_round"));
        };

        self.battle.duel.start_round();
        self.clear_answers(&[attacker, defender]);
        self.record(
            GameEventKind::DuelRoundStarted(DuelRoundStarted {
                round_number: self.battle.duel.round_number,
            }),
            ctx,
        );
        Ok(())
    }

    /// Records a duelist's answer, producing `PlayerAnswered`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::ActionNotAllowed` unless a duel question is open,
    /// `GameError::NotAParticipant` for bystanders, `GameError::ForeignAnswer`
    /// or `GameError::AlreadyAnswered`.
    pub fn send_answer(
        &mut self,
        player_id: PlayerId,
        answer: &Answer,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        if self.state != GameState::Dueling(DuelStage::Battling) || !self.question_open {
            return Err(self.not_allowed("send_answer"));
        }
        self.player(player_id)?;
        if !self.battle.duel.involves(player_id) {
            return Err(GameError::NotAParticipant(player_id));
        }

        self.record_answer(player_id, answer, ctx)?;
        self.record(
            GameEventKind::PlayerAnswered(PlayerAnswered { player_id }),
            ctx,
        );
        Ok(())
    }

    /// Closes the current duel round, producing `DuelRoundFinished`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` unless a duel is running.
    pub fn finish_battle_round(&mut self, ctx: &GameContext<'_>) -> Result<(), GameError> {
        if self.state != GameState::Dueling(DuelStage::Battling) || !self.battle.duel.is_active() {
            return Err(self.invalid_stage("finish_battle_round"));
        }

        let round_number = self.battle.duel.round_number;
        let correct_answer_id = self.battle.duel.correct_answer;
        self.battle.duel.finish_round();
        self.question_open = false;
        self.record(
            GameEventKind::DuelRoundFinished(DuelRoundFinished {
                round_number,
                correct_answer_id,
            }),
            ctx,
        );
        Ok(())
    }

    /// Plays another duel round while the duelists agree, otherwise settles
    /// the duel and returns to the battling stage with `DuelFinished`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` unless a duel is running.
    pub fn check_battle_round_outcome(&mut self, ctx: &GameContext<'_>) -> Result<(), GameError> {
        let (Some((attacker_id, defender_id)), Some(field_id)) =
            (self.battle.duel.participants(), self.battle.duel.field_id)
        else {
            return Err(self.invalid_stage("check_battle_round_outcome"));
        };
        if self.state != GameState::Dueling(DuelStage::Battling) {
            return Err(self.invalid_stage("check_battle_round_outcome"));
        }
        let attacker = self.player(attacker_id)?.clone();
        let defender = self.player(defender_id)?.clone();

        if self
            .battle
            .duel
            .is_continuing(&attacker, &defender, self.settings.duel_max_rounds)
        {
            return self.start_duel_round(ctx);
        }

        let step = self.settings.field_value_step;
        let Some(field) = self.fields.iter_mut().find(|field| field.id == field_id) else {
            return Err(GameError::FieldNotFound(field_id));
        };
        let outcome = self.battle.duel.stop(field, &attacker, &defender, step);
        let owner_id = field.owner().unwrap_or(defender_id);
        let new_field_value = field.value;

        self.clear_answers(&[attacker_id, defender_id]);
        self.state = GameState::BattlingStage;
        info!(game_id = %self.id, %field_id, ?outcome, %owner_id, "duel finished");
        self.record(
            GameEventKind::DuelFinished(DuelFinished {
                field_id,
                outcome,
                owner_id,
                new_field_value,
            }),
            ctx,
        );
        Ok(())
    }

    pub(super) fn finish_battling_round(&mut self, ctx: &GameContext<'_>) {
        self.battle.round_closed = true;
        self.record(
            GameEventKind::RoundFinished(RoundFinished {
                stage: Stage::Battling,
                round_number: self.battle.round_number,
                captured_fields: Vec::new(),
            }),
            ctx,
        );
    }

    pub(super) fn check_battling_round_outcome(
        &mut self,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        if self.battle.round_number >= self.battle_rounds_count() {
            self.record(
                GameEventKind::StageFinished(StageFinished {
                    stage: Stage::Battling,
                }),
                ctx,
            );
            return Ok(());
        }

        self.battle.stop_round();
        self.start_battling_round(ctx)
    }
}
