//! The `Game` aggregate root.
//!
//! `Game` is one state machine with a stage-dependent "mode". Operations that
//! every stage understands (`start_round`, `finish_round`,
//! `check_round_outcome`, question handling) are routed on `state` to the
//! stage modules below; each module holds that stage's `impl Game` block.

mod battling;
mod capturing;
mod preparatory;

use std::fmt;

use conquiz_core::aggregate::AggregateRoot;
use conquiz_core::clock::Clock;
use conquiz_core::event::EventMetadata;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::battle::Battle;
use super::capture::Capture;
use super::errors::GameError;
use super::events::{
    GameCreated, GameEvent, GameEventKind, GameFinished, GameStarted, PlayerAdded, PlayerRemoved,
    QuestionSet,
};
use super::field::Field;
use super::player::Player;
use super::preparation::Preparation;
use super::resolvers::ConflictResolver;
use super::settings::GameSettings;
use super::strategies::PlayerTurnSelector;
use super::values::{
    Answer, Category, FieldId, GameId, GameResultLine, PlayerId, Question, Stage,
};

/// Which stage a duel is nested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelStage {
    /// A marking battle between the markers of one field.
    Capturing,
    /// A one-on-one duel over an attacked field.
    Battling,
}

/// Lifecycle state of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// Seats are open.
    PlayersWaiting,
    /// Seats are filled; the first stage has not begun.
    InProcess,
    /// Players pick bases.
    PreparatoryStage,
    /// Players mark free fields.
    CapturingStage,
    /// Players attack each other's fields.
    BattlingStage,
    /// A question contest nested in the capturing or battling stage.
    Dueling(DuelStage),
    /// Final state.
    Ended,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PlayersWaiting => "players_waiting",
            Self::InProcess => "in_process",
            Self::PreparatoryStage => "preparatory_stage",
            Self::CapturingStage => "capturing_stage",
            Self::BattlingStage => "battling_stage",
            Self::Dueling(DuelStage::Capturing) => "dueling_capturing",
            Self::Dueling(DuelStage::Battling) => "dueling_battling",
            Self::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Collaborators every mutating operation needs.
#[derive(Clone, Copy)]
pub struct GameContext<'a> {
    /// Correlation ID of the inbound message that started the cascade.
    pub correlation_id: Uuid,
    /// ID of the command or event being handled.
    pub causation_id: Uuid,
    /// Time source for event and answer timestamps.
    pub clock: &'a dyn Clock,
    /// Turn-order policy.
    pub turn_selector: &'a dyn PlayerTurnSelector,
    /// Marking-conflict policy.
    pub conflict_resolver: &'a dyn ConflictResolver,
}

/// Persistable state of a game, without its pending events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Game identifier.
    pub id: GameId,
    /// Committed version.
    pub version: i64,
    /// Lifecycle state.
    pub state: GameState,
    /// Settings captured at creation.
    pub settings: GameSettings,
    /// Seated players in join order.
    pub players: Vec<Player>,
    /// Turn order captured at start.
    pub order: Vec<PlayerId>,
    /// The board.
    pub fields: Vec<Field>,
    /// Preparatory stage state.
    pub preparation: Preparation,
    /// Capturing stage state.
    pub capture: Capture,
    /// Battling stage state.
    pub battle: Battle,
    /// Counter of questions asked, used to discard stale question timers.
    pub question_number: u32,
    /// Whether the current question still accepts answers.
    pub question_open: bool,
}

/// The aggregate root for a game.
#[derive(Debug, Clone)]
pub struct Game {
    /// Aggregate identifier.
    pub id: GameId,
    pub(crate) version: i64,
    pub(crate) state: GameState,
    pub(crate) settings: GameSettings,
    pub(crate) players: Vec<Player>,
    pub(crate) order: Vec<PlayerId>,
    pub(crate) fields: Vec<Field>,
    pub(crate) preparation: Preparation,
    pub(crate) capture: Capture,
    pub(crate) battle: Battle,
    pub(crate) question_number: u32,
    pub(crate) question_open: bool,
    uncommitted_events: Vec<GameEvent>,
}

impl Game {
    /// Creates an empty game waiting for players, producing `GameCreated`.
    #[must_use]
    pub fn create(id: GameId, settings: GameSettings, ctx: &GameContext<'_>) -> Self {
        let fields = (1..=settings.fields_count)
            .map(|n| Field::new(FieldId(i64::try_from(n).unwrap_or(i64::MAX))))
            .collect();
        let mut game = Self::restore(GameSnapshot {
            id,
            version: 0,
            state: GameState::PlayersWaiting,
            settings,
            players: Vec::new(),
            order: Vec::new(),
            fields,
            preparation: Preparation::default(),
            capture: Capture::default(),
            battle: Battle::default(),
            question_number: 0,
            question_open: false,
        });
        game.record(
            GameEventKind::GameCreated(GameCreated {
                fields_count: game.settings.fields_count,
                players_capacity: game.settings.players_count_to_start,
            }),
            ctx,
        );
        game
    }

    /// Rebuilds a game from persisted state.
    #[must_use]
    pub fn restore(snapshot: GameSnapshot) -> Self {
        Self {
            id: snapshot.id,
            version: snapshot.version,
            state: snapshot.state,
            settings: snapshot.settings,
            players: snapshot.players,
            order: snapshot.order,
            fields: snapshot.fields,
            preparation: snapshot.preparation,
            capture: snapshot.capture,
            battle: snapshot.battle,
            question_number: snapshot.question_number,
            question_open: snapshot.question_open,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns the persistable state. Pending events are not part of it.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            id: self.id,
            version: self.version,
            state: self.state,
            settings: self.settings.clone(),
            players: self.players.clone(),
            order: self.order.clone(),
            fields: self.fields.clone(),
            preparation: self.preparation.clone(),
            capture: self.capture.clone(),
            battle: self.battle.clone(),
            question_number: self.question_number,
            question_open: self.question_open,
        }
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Returns the settings captured at creation.
    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Returns the seated players in join order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Returns the turn order captured at start.
    #[must_use]
    pub fn order(&self) -> &[PlayerId] {
        &self.order
    }

    /// Returns the board.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns one field of the board.
    #[must_use]
    pub fn field(&self, field_id: FieldId) -> Option<&Field> {
        self.fields.iter().find(|field| field.id == field_id)
    }

    /// Returns the capturing stage state.
    #[must_use]
    pub fn capture(&self) -> &Capture {
        &self.capture
    }

    /// Returns the battling stage state.
    #[must_use]
    pub fn battle(&self) -> &Battle {
        &self.battle
    }

    /// Returns the number of questions asked so far.
    #[must_use]
    pub fn question_number(&self) -> u32 {
        self.question_number
    }

    /// Returns the current round of the active stage, if any.
    #[must_use]
    pub fn round_number(&self) -> Option<u32> {
        match self.state {
            GameState::PreparatoryStage => Some(self.preparation.round_number),
            GameState::CapturingStage | GameState::Dueling(DuelStage::Capturing) => {
                Some(self.capture.round_number)
            }
            GameState::BattlingStage | GameState::Dueling(DuelStage::Battling) => {
                Some(self.battle.round_number)
            }
            GameState::PlayersWaiting | GameState::InProcess | GameState::Ended => None,
        }
    }

    /// Returns the number of seats.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.settings.players_count_to_start
    }

    /// Returns true when every seat is taken.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity()
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(&mut self, kind: GameEventKind, ctx: &GameContext<'_>) {
        let event = GameEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id.0,
                sequence_number: self.next_sequence_number(),
                correlation_id: ctx.correlation_id,
                causation_id: ctx.causation_id,
                occurred_at: ctx.clock.now(),
            },
            kind,
        };
        self.uncommitted_events.push(event);
    }

    fn invalid_stage(&self, operation: &'static str) -> GameError {
        GameError::InvalidStage {
            operation,
            state: self.state,
        }
    }

    fn not_allowed(&self, action: &'static str) -> GameError {
        GameError::ActionNotAllowed {
            action,
            state: self.state,
        }
    }

    fn player(&self, player_id: PlayerId) -> Result<&Player, GameError> {
        self.players
            .iter()
            .find(|player| player.id == player_id)
            .ok_or(GameError::PlayerNotInGame(player_id))
    }

    fn player_mut(&mut self, player_id: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .iter_mut()
            .find(|player| player.id == player_id)
            .ok_or(GameError::PlayerNotInGame(player_id))
    }

    fn field_mut(&mut self, field_id: FieldId) -> Result<&mut Field, GameError> {
        self.fields
            .iter_mut()
            .find(|field| field.id == field_id)
            .ok_or(GameError::FieldNotFound(field_id))
    }

    fn clear_answers(&mut self, player_ids: &[PlayerId]) {
        for player in &mut self.players {
            if player_ids.contains(&player.id) {
                player.clear_answer();
            }
        }
    }

    fn all_fields_captured(&self) -> bool {
        self.fields.iter().all(Field::is_captured)
    }

    // --- seating ---

    /// Seats `player`, producing `PlayerAdded`. Re-adding a seated player is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns `GameError::GameAlreadyStarted` once seats are closed and
    /// `GameError::GameIsFull` when every seat is taken.
    pub fn add_player(&mut self, player: Player, ctx: &GameContext<'_>) -> Result<(), GameError> {
        if self.state != GameState::PlayersWaiting {
            return Err(GameError::GameAlreadyStarted);
        }
        if self.players.contains(&player) {
            return Ok(());
        }
        if self.is_full() {
            return Err(GameError::GameIsFull);
        }

        let player_id = player.id;
        self.players.push(player);
        let players = self.players.iter().map(|p| p.id).collect();
        self.record(
            GameEventKind::PlayerAdded(PlayerAdded { player_id, players }),
            ctx,
        );
        Ok(())
    }

    /// Unseats a waiting player, producing `PlayerRemoved`. Unknown players
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns `GameError::GameAlreadyStarted` once seats are closed.
    pub fn remove_player(
        &mut self,
        player_id: PlayerId,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        if self.state != GameState::PlayersWaiting {
            return Err(GameError::GameAlreadyStarted);
        }
        let Some(index) = self.players.iter().position(|p| p.id == player_id) else {
            return Ok(());
        };

        self.players.remove(index);
        let players = self.players.iter().map(|p| p.id).collect();
        self.record(
            GameEventKind::PlayerRemoved(PlayerRemoved { player_id, players }),
            ctx,
        );
        Ok(())
    }

    /// Starts the game once every seat is taken, producing `GameStarted`
    /// with the turn order. Does nothing otherwise.
    pub fn try_start(&mut self, ctx: &GameContext<'_>) {
        if self.state != GameState::PlayersWaiting || !self.is_full() {
            return;
        }

        self.state = GameState::InProcess;
        self.order = ctx.turn_selector.get_order(&self.players);
        info!(game_id = %self.id, order = ?self.order, "game started");
        self.record(
            GameEventKind::GameStarted(GameStarted {
                fields: self.fields.clone(),
                order: self.order.clone(),
            }),
            ctx,
        );
    }

    // --- stage routing ---

    /// Starts the first stage of a started game.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` unless the game is `InProcess`.
    pub fn start_stage(&mut self, ctx: &GameContext<'_>) -> Result<(), GameError> {
        match self.state {
            GameState::InProcess => {
                self.start_preparatory_stage(ctx);
                Ok(())
            }
            _ => Err(self.invalid_stage("start_stage")),
        }
    }

    /// Starts the current round of the active stage.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` outside the three stages.
    pub fn start_round(&mut self, ctx: &GameContext<'_>) -> Result<(), GameError> {
        match self.state {
            GameState::PreparatoryStage => self.start_preparatory_round(ctx),
            GameState::CapturingStage => {
                self.start_capturing_round(ctx);
                Ok(())
            }
            GameState::BattlingStage => self.start_battling_round(ctx),
            _ => Err(self.invalid_stage("start_round")),
        }
    }

    /// Closes the current round of the active stage.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` outside the three stages.
    pub fn finish_round(&mut self, ctx: &GameContext<'_>) -> Result<(), GameError> {
        match self.state {
            GameState::PreparatoryStage => {
                self.finish_preparatory_round(ctx);
                Ok(())
            }
            GameState::CapturingStage => self.finish_capturing_round(ctx),
            GameState::BattlingStage => {
                self.finish_battling_round(ctx);
                Ok(())
            }
            _ => Err(self.invalid_stage("finish_round")),
        }
    }

    /// Advances to the next round, or finishes the stage after its last one.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` outside the three stages.
    pub fn check_round_outcome(&mut self, ctx: &GameContext<'_>) -> Result<(), GameError> {
        match self.state {
            GameState::PreparatoryStage => self.check_preparatory_round_outcome(ctx),
            GameState::CapturingStage => {
                self.check_capturing_round_outcome(ctx);
                Ok(())
            }
            GameState::BattlingStage => self.check_battling_round_outcome(ctx),
            _ => Err(self.invalid_stage("check_round_outcome")),
        }
    }

    /// Moves from a finished stage to the next one, or ends the game after
    /// the battling stage.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` outside the three stages.
    pub fn start_next_stage(&mut self, ctx: &GameContext<'_>) -> Result<(), GameError> {
        match self.state {
            GameState::PreparatoryStage => {
                self.start_capturing_stage(ctx);
                Ok(())
            }
            GameState::CapturingStage => {
                self.start_battling_stage(ctx);
                Ok(())
            }
            GameState::BattlingStage => {
                self.finish(ctx);
                Ok(())
            }
            _ => Err(self.invalid_stage("start_next_stage")),
        }
    }

    /// Sets the category of the running marking battle or duel.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` unless a contest is running.
    pub fn set_category(
        &mut self,
        category: Category,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        match self.state {
            GameState::Dueling(DuelStage::Capturing) => {
                self.set_capturing_battle_category(category, ctx);
                Ok(())
            }
            GameState::Dueling(DuelStage::Battling) => self.set_duel_category(category, ctx),
            _ => Err(self.invalid_stage("set_category")),
        }
    }

    /// Returns the category of the running marking battle or duel.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` if no contest with a category is
    /// running.
    pub fn current_category(&self) -> Result<&Category, GameError> {
        let category = match self.state {
            GameState::Dueling(DuelStage::Capturing) => self.capture.category.as_ref(),
            GameState::Dueling(DuelStage::Battling) => self.battle.duel.category.as_ref(),
            _ => None,
        };
        category.ok_or_else(|| self.invalid_stage("current_category"))
    }

    /// Puts `question` to the contenders, producing `QuestionSet`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` unless a contest is running.
    pub fn set_question(
        &mut self,
        question: Question,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        let correct = question.correct_answer();
        let contenders = match self.state {
            GameState::Dueling(DuelStage::Capturing) => {
                self.capture.set_question(question.id, correct);
                self.capturing_contenders()
            }
            GameState::Dueling(DuelStage::Battling) => {
                self.battle.duel.set_question(question.id, correct);
                self.battle
                    .duel
                    .participants()
                    .map(|(attacker, defender)| vec![attacker, defender])
                    .unwrap_or_default()
            }
            _ => return Err(self.invalid_stage("set_question")),
        };

        self.clear_answers(&contenders);
        self.question_number += 1;
        self.question_open = true;
        self.record(
            GameEventKind::QuestionSet(QuestionSet {
                question_number: self.question_number,
                question_id: question.id,
                answers: question.options(),
                body: question.body,
                duration_seconds: self.settings.question_time_seconds,
            }),
            ctx,
        );
        Ok(())
    }

    /// Settles the current question once every contender answered.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidStage` unless a contest is running.
    pub fn check_are_all_players_answered(
        &mut self,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        match self.state {
            GameState::Dueling(DuelStage::Capturing) => {
                let contenders = self.capturing_contenders();
                let all_answered = self
                    .players
                    .iter()
                    .filter(|player| contenders.contains(&player.id))
                    .all(Player::is_answered);
                if all_answered {
                    self.finish_capturing_battle(ctx)?;
                }
                Ok(())
            }
            GameState::Dueling(DuelStage::Battling) => {
                let all_answered = self
                    .players
                    .iter()
                    .filter(|player| self.battle.duel.involves(player.id))
                    .all(Player::is_answered);
                if all_answered {
                    self.finish_battle_round(ctx)?;
                }
                Ok(())
            }
            _ => Err(self.invalid_stage("check_are_all_players_answered")),
        }
    }

    /// Handles an expired round timer. Timers for another stage, another
    /// round, or a round that already closed are ignored.
    ///
    /// # Errors
    ///
    /// Propagates errors of the stage fallback.
    pub fn expire_round(
        &mut self,
        stage: Stage,
        round_number: u32,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        let current = match (self.state, stage) {
            (GameState::PreparatoryStage, Stage::Preparatory) => {
                (self.preparation.round_number, self.preparation.round_closed)
            }
            (GameState::CapturingStage, Stage::Capturing) => {
                (self.capture.round_number, self.capture.marks_closed)
            }
            (GameState::BattlingStage, Stage::Battling) => {
                (self.battle.round_number, self.battle.round_closed)
            }
            _ => (0, true),
        };
        if current != (round_number, false) {
            debug!(game_id = %self.id, %stage, round_number, state = %self.state, "stale round timer ignored");
            return Ok(());
        }

        info!(game_id = %self.id, %stage, round_number, "round timed out");
        match stage {
            Stage::Preparatory => self.assign_fallback_base(ctx),
            Stage::Capturing => {
                self.close_marking(ctx);
                Ok(())
            }
            Stage::Battling => {
                self.finish_battling_round(ctx);
                Ok(())
            }
        }
    }

    /// Handles an expired question timer. Unanswered contenders count as
    /// wrong. Timers for an earlier or already settled question are ignored.
    ///
    /// # Errors
    ///
    /// Propagates errors of settling the contest.
    pub fn expire_question(
        &mut self,
        question_number: u32,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        if !self.question_open || question_number != self.question_number {
            debug!(game_id = %self.id, question_number, "stale question timer ignored");
            return Ok(());
        }

        info!(game_id = %self.id, question_number, "question timed out");
        match self.state {
            GameState::Dueling(DuelStage::Capturing) => self.finish_capturing_battle(ctx),
            GameState::Dueling(DuelStage::Battling) => self.finish_battle_round(ctx),
            _ => Ok(()),
        }
    }

    /// Validates an answer against the question of the running contest.
    fn ensure_current_answer(&self, answer: &Answer) -> Result<(), GameError> {
        let current = match self.state {
            GameState::Dueling(DuelStage::Capturing) => self.capture.question,
            GameState::Dueling(DuelStage::Battling) => self.battle.duel.question,
            _ => None,
        };
        if current == Some(answer.question_id) {
            Ok(())
        } else {
            Err(GameError::ForeignAnswer(answer.id))
        }
    }

    /// Stamps `answer` onto a contender who has not answered yet.
    fn record_answer(
        &mut self,
        player_id: PlayerId,
        answer: &Answer,
        ctx: &GameContext<'_>,
    ) -> Result<(), GameError> {
        self.ensure_current_answer(answer)?;
        let player = self.player_mut(player_id)?;
        if player.is_answered() {
            return Err(GameError::AlreadyAnswered(player_id));
        }
        player.set_answer(answer.id, ctx.clock.now());
        Ok(())
    }

    /// Final scoreboard: owned field values summed per player, best first,
    /// ties kept in join order.
    #[must_use]
    pub fn results(&self) -> Vec<GameResultLine> {
        let mut scores: Vec<(PlayerId, i64)> = self
            .players
            .iter()
            .map(|player| {
                let score = self
                    .fields
                    .iter()
                    .filter(|field| field.is_owned_by(player.id))
                    .map(|field| field.value)
                    .sum();
                (player.id, score)
            })
            .collect();
        scores.sort_by(|a, b| b.1.cmp(&a.1));

        scores
            .into_iter()
            .zip(1..)
            .map(|((player_id, score), place)| GameResultLine {
                place,
                player_id,
                score,
            })
            .collect()
    }

    fn finish(&mut self, ctx: &GameContext<'_>) {
        self.state = GameState::Ended;
        let results = self.results();
        info!(game_id = %self.id, ?results, "game finished");
        self.record(GameEventKind::GameFinished(GameFinished { results }), ctx);
    }
}

impl AggregateRoot for Game {
    type Id = GameId;
    type Event = GameEvent;

    fn aggregate_id(&self) -> GameId {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn uncommitted_events(&self) -> &[GameEvent] {
        &self.uncommitted_events
    }

    #[allow(clippy::cast_possible_wrap)]
    fn take_uncommitted_events(&mut self) -> Vec<GameEvent> {
        let events = std::mem::take(&mut self.uncommitted_events);
        self.version += events.len() as i64;
        events
    }
}
