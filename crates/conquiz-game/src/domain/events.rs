//! Domain events of the game context.

use conquiz_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};

use super::capture::MarkedField;
use super::field::Field;
use super::values::{
    AnswerId, AnswerOption, Category, DuelOutcome, FieldId, GameResultLine, PlayerId, QuestionId,
    Stage,
};

/// Emitted when an empty game is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCreated {
    /// Number of fields on the board.
    pub fields_count: usize,
    /// Number of seats.
    pub players_capacity: usize,
}

/// Emitted when a player takes a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAdded {
    /// The seated player.
    pub player_id: PlayerId,
    /// Everyone seated now, in join order.
    pub players: Vec<PlayerId>,
}

/// Emitted when a waiting player leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRemoved {
    /// The leaving player.
    pub player_id: PlayerId,
    /// Everyone still seated, in join order.
    pub players: Vec<PlayerId>,
}

/// Emitted when the last seat is filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStarted {
    /// The board.
    pub fields: Vec<Field>,
    /// Turn order.
    pub order: Vec<PlayerId>,
}

/// Emitted when a stage begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStarted {
    /// The stage.
    pub stage: Stage,
    /// Number of rounds, when fixed in advance.
    pub rounds_count: Option<u32>,
}

/// Emitted when a round begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStarted {
    /// The stage.
    pub stage: Stage,
    /// 1-based round within the stage.
    pub round_number: u32,
    /// The active player for turn-based rounds.
    pub player_id: Option<PlayerId>,
    /// Time to act.
    pub duration_seconds: u64,
}

/// Emitted when a player picks their base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseSelected {
    /// The player.
    pub player_id: PlayerId,
    /// The base.
    pub field_id: FieldId,
    /// Value of the base after capture.
    pub new_field_value: i64,
}

/// Emitted when a player marks a free field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMarked {
    /// The player.
    pub player_id: PlayerId,
    /// The marked field.
    pub field_id: FieldId,
}

/// Emitted when marking closes for the round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsMarked {
    /// Every mark of the round.
    pub marked_fields: Vec<MarkedField>,
}

/// Emitted when several players marked the same field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkingConflictDetected {
    /// The contested field.
    pub field_id: FieldId,
    /// The contenders.
    pub players: Vec<PlayerId>,
}

/// Emitted when the contenders of a marking conflict enter a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturingBattleStarted {
    /// The contested field.
    pub field_id: FieldId,
    /// The contenders.
    pub players: Vec<PlayerId>,
}

/// Emitted when a marking battle gets its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturingBattleCategorySet {
    /// The category.
    pub category: Category,
}

/// Emitted when a question is put to the contenders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    /// Game-wide question counter.
    pub question_number: u32,
    /// The question.
    pub question_id: QuestionId,
    /// Question text.
    pub body: String,
    /// Options, without the correct one revealed.
    pub answers: Vec<AnswerOption>,
    /// Time to answer.
    pub duration_seconds: u64,
}

/// Emitted when a contender of a marking battle answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturingBattlePlayerAnswered {
    /// The player.
    pub player_id: PlayerId,
}

/// Emitted when a marking battle is decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturingBattleFinished {
    /// The contested field.
    pub field_id: FieldId,
    /// The only remaining marker.
    pub winner_id: PlayerId,
    /// The correct answer, now revealed.
    pub correct_answer_id: Option<AnswerId>,
}

/// A field captured at the end of a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCapture {
    /// The field.
    pub field_id: FieldId,
    /// Its new owner.
    pub owner_id: PlayerId,
    /// Its value after capture.
    pub new_field_value: i64,
}

/// Emitted when a round ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundFinished {
    /// The stage.
    pub stage: Stage,
    /// The round that ended.
    pub round_number: u32,
    /// Fields captured when the round closed.
    pub captured_fields: Vec<FieldCapture>,
}

/// Emitted when a stage ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFinished {
    /// The stage.
    pub stage: Stage,
}

/// Emitted when an attack takes a free field outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCaptured {
    /// The field.
    pub field_id: FieldId,
    /// Its new owner.
    pub capturer_id: PlayerId,
    /// Its value after capture.
    pub new_field_value: i64,
}

/// Emitted when a player attacks an opponent's field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerFieldAttacked {
    /// The attacker.
    pub attacker_id: PlayerId,
    /// The owner of the field.
    pub defender_id: PlayerId,
    /// The attacked field.
    pub field_id: FieldId,
}

/// Emitted when a duel begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelStarted {
    /// The attacker.
    pub attacker_id: PlayerId,
    /// The defender.
    pub defender_id: PlayerId,
    /// The contested field.
    pub field_id: FieldId,
}

/// Emitted when a duel gets its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelCategorySet {
    /// The category.
    pub category: Category,
}

/// Emitted when a duel round begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelRoundStarted {
    /// 1-based duel round.
    pub round_number: u32,
}

/// Emitted when a duellist answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAnswered {
    /// The player.
    pub player_id: PlayerId,
}

/// Emitted when both duellists answered or the question expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelRoundFinished {
    /// The duel round that ended.
    pub round_number: u32,
    /// The correct answer, now revealed.
    pub correct_answer_id: Option<AnswerId>,
}

/// Emitted when a duel is decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelFinished {
    /// The contested field.
    pub field_id: FieldId,
    /// Whether the attacker took it.
    pub outcome: DuelOutcome,
    /// Owner after the duel.
    pub owner_id: PlayerId,
    /// Value after the duel.
    pub new_field_value: i64,
}

/// Emitted when the last stage ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameFinished {
    /// Final scoreboard, best first.
    pub results: Vec<GameResultLine>,
}

/// Event payload variants of the game context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GameEventKind {
    /// An empty game was created.
    GameCreated(GameCreated),
    /// A player took a seat.
    PlayerAdded(PlayerAdded),
    /// A waiting player left.
    PlayerRemoved(PlayerRemoved),
    /// All seats are filled.
    GameStarted(GameStarted),
    /// A stage began.
    StageStarted(StageStarted),
    /// A round began.
    RoundStarted(RoundStarted),
    /// A base was picked.
    BaseSelected(BaseSelected),
    /// A free field was marked.
    FieldMarked(FieldMarked),
    /// Marking closed for the round.
    FieldsMarked(FieldsMarked),
    /// Several players marked one field.
    MarkingConflictDetected(MarkingConflictDetected),
    /// A marking battle began.
    CapturingBattleStarted(CapturingBattleStarted),
    /// A marking battle got its category.
    CapturingBattleCategorySet(CapturingBattleCategorySet),
    /// A question was asked.
    QuestionSet(QuestionSet),
    /// A marking-battle contender answered.
    CapturingBattlePlayerAnswered(CapturingBattlePlayerAnswered),
    /// A marking battle was decided.
    CapturingBattleFinished(CapturingBattleFinished),
    /// A round ended.
    RoundFinished(RoundFinished),
    /// A stage ended.
    StageFinished(StageFinished),
    /// A free field was taken by attack.
    FieldCaptured(FieldCaptured),
    /// An owned field was attacked.
    PlayerFieldAttacked(PlayerFieldAttacked),
    /// A duel began.
    DuelStarted(DuelStarted),
    /// A duel got its category.
    DuelCategorySet(DuelCategorySet),
    /// A duel round began.
    DuelRoundStarted(DuelRoundStarted),
    /// A duellist answered.
    PlayerAnswered(PlayerAnswered),
    /// A duel round ended.
    DuelRoundFinished(DuelRoundFinished),
    /// A duel was decided.
    DuelFinished(DuelFinished),
    /// The game ended.
    GameFinished(GameFinished),
}

impl GameEventKind {
    /// Returns the routing name of the variant.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::GameCreated(_) => "game.game_created",
            Self::PlayerAdded(_) => "game.player_added",
            Self::PlayerRemoved(_) => "game.player_removed",
            Self::GameStarted(_) => "game.game_started",
            Self::StageStarted(_) => "game.stage_started",
            Self::RoundStarted(_) => "game.round_started",
            Self::BaseSelected(_) => "game.base_selected",
            Self::FieldMarked(_) => "game.field_marked",
            Self::FieldsMarked(_) => "game.fields_marked",
            Self::MarkingConflictDetected(_) => "game.marking_conflict_detected",
            Self::CapturingBattleStarted(_) => "game.capturing_battle_started",
            Self::CapturingBattleCategorySet(_) => "game.capturing_battle_category_set",
            Self::QuestionSet(_) => "game.question_set",
            Self::CapturingBattlePlayerAnswered(_) => "game.capturing_battle_player_answered",
            Self::CapturingBattleFinished(_) => "game.capturing_battle_finished",
            Self::RoundFinished(_) => "game.round_finished",
            Self::StageFinished(_) => "game.stage_finished",
            Self::FieldCaptured(_) => "game.field_captured",
            Self::PlayerFieldAttacked(_) => "game.player_field_attacked",
            Self::DuelStarted(_) => "game.duel_started",
            Self::DuelCategorySet(_) => "game.duel_category_set",
            Self::DuelRoundStarted(_) => "game.duel_round_started",
            Self::PlayerAnswered(_) => "game.player_answered",
            Self::DuelRoundFinished(_) => "game.duel_round_finished",
            Self::DuelFinished(_) => "game.duel_finished",
            Self::GameFinished(_) => "game.game_finished",
        }
    }
}

/// Domain event envelope of the game context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: GameEventKind,
}

impl DomainEvent for GameEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("GameEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
