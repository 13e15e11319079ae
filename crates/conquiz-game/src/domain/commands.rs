//! Commands accepted by the game context.

use conquiz_core::command::Command;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::values::{AnswerId, FieldId, GameId, PlayerId, Stage};

/// Command to create an empty game waiting for players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGame {
    /// The game to create.
    pub game_id: GameId,
}

/// Command to seat a connected user at a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddUser {
    /// Target game.
    pub game_id: GameId,
    /// The connecting user.
    pub player_id: PlayerId,
}

/// Command to unseat a disconnected user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveUser {
    /// Target game.
    pub game_id: GameId,
    /// The leaving user.
    pub player_id: PlayerId,
}

/// Command to pick a base during the preparatory stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectBase {
    /// Target game.
    pub game_id: GameId,
    /// The acting player.
    pub player_id: PlayerId,
    /// The chosen field.
    pub field_id: FieldId,
}

/// Command to mark a free field during the capturing stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkField {
    /// Target game.
    pub game_id: GameId,
    /// The acting player.
    pub player_id: PlayerId,
    /// The marked field.
    pub field_id: FieldId,
}

/// Command to answer the question of a marking battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMarkingConflictAnswer {
    /// Target game.
    pub game_id: GameId,
    /// The answering player.
    pub player_id: PlayerId,
    /// The chosen answer.
    pub answer_id: AnswerId,
}

/// Command to attack a field during the battling stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackField {
    /// Target game.
    pub game_id: GameId,
    /// The attacking player.
    pub player_id: PlayerId,
    /// The attacked field.
    pub field_id: FieldId,
}

/// Command to answer the question of a duel round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendAnswer {
    /// Target game.
    pub game_id: GameId,
    /// The answering player.
    pub player_id: PlayerId,
    /// The chosen answer.
    pub answer_id: AnswerId,
}

/// Deferred command fired when an action round runs out of time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpireRound {
    /// Target game.
    pub game_id: GameId,
    /// Stage the round belonged to.
    pub stage: Stage,
    /// The round that timed out.
    pub round_number: u32,
}

/// Deferred command fired when a question runs out of time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpireQuestion {
    /// Target game.
    pub game_id: GameId,
    /// The question that timed out.
    pub question_number: u32,
}

/// Every command the game context handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GameCommand {
    /// See [`CreateGame`].
    CreateGame(CreateGame),
    /// See [`AddUser`].
    AddUser(AddUser),
    /// See [`RemoveUser`].
    RemoveUser(RemoveUser),
    /// See [`SelectBase`].
    SelectBase(SelectBase),
    /// See [`MarkField`].
    MarkField(MarkField),
    /// See [`SendMarkingConflictAnswer`].
    SendMarkingConflictAnswer(SendMarkingConflictAnswer),
    /// See [`AttackField`].
    AttackField(AttackField),
    /// See [`SendAnswer`].
    SendAnswer(SendAnswer),
    /// See [`ExpireRound`].
    ExpireRound(ExpireRound),
    /// See [`ExpireQuestion`].
    ExpireQuestion(ExpireQuestion),
}

impl GameCommand {
    /// Returns the game the command targets.
    #[must_use]
    pub fn game_id(&self) -> GameId {
        match self {
            Self::CreateGame(c) => c.game_id,
            Self::AddUser(c) => c.game_id,
            Self::RemoveUser(c) => c.game_id,
            Self::SelectBase(c) => c.game_id,
            Self::MarkField(c) => c.game_id,
            Self::SendMarkingConflictAnswer(c) => c.game_id,
            Self::AttackField(c) => c.game_id,
            Self::SendAnswer(c) => c.game_id,
            Self::ExpireRound(c) => c.game_id,
            Self::ExpireQuestion(c) => c.game_id,
        }
    }
}

impl Command for GameCommand {
    fn command_type(&self) -> &'static str {
        match self {
            Self::CreateGame(_) => "game.create_game",
            Self::AddUser(_) => "game.add_user",
            Self::RemoveUser(_) => "game.remove_user",
            Self::SelectBase(_) => "game.select_base",
            Self::MarkField(_) => "game.mark_field",
            Self::SendMarkingConflictAnswer(_) => "game.send_marking_conflict_answer",
            Self::AttackField(_) => "game.attack_field",
            Self::SendAnswer(_) => "game.send_answer",
            Self::ExpireRound(_) => "game.expire_round",
            Self::ExpireQuestion(_) => "game.expire_question",
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.game_id().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serializes_with_type_tag() {
        let game_id = GameId(Uuid::nil());
        let command = GameCommand::MarkField(MarkField {
            game_id,
            player_id: PlayerId(2),
            field_id: FieldId(5),
        });

        let json = serde_json::to_value(&command).unwrap();

        assert_eq!(json["type"], "MarkField");
        assert_eq!(json["data"]["field_id"], 5);
        assert_eq!(command.aggregate_id(), Uuid::nil());
        assert_eq!(command.command_type(), "game.mark_field");
    }
}
