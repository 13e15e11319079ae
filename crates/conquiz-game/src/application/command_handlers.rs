//! Command handlers for the game context.
//!
//! Each handler loads the target game through the unit of work, applies one
//! domain operation and leaves the resulting events pending on the game.

use tracing::instrument;

use super::error::ServiceError;
use super::unit_of_work::UnitOfWork;
use crate::domain::commands::{
    AddUser, AttackField, CreateGame, ExpireQuestion, ExpireRound, GameCommand, MarkField,
    RemoveUser, SelectBase, SendAnswer, SendMarkingConflictAnswer,
};
use crate::domain::game::{Game, GameContext};

/// Routes `command` to its handler.
///
/// # Errors
///
/// Returns the handler's `ServiceError`.
pub async fn handle(
    command: &GameCommand,
    uow: &mut UnitOfWork<'_>,
    ctx: &GameContext<'_>,
) -> Result<(), ServiceError> {
    match command {
        GameCommand::CreateGame(c) => {
            handle_create_game(c, uow, ctx);
            Ok(())
        }
        GameCommand::AddUser(c) => handle_add_user(c, uow, ctx).await,
        GameCommand::RemoveUser(c) => handle_remove_user(c, uow, ctx).await,
        GameCommand::SelectBase(c) => handle_select_base(c, uow, ctx).await,
        GameCommand::MarkField(c) => handle_mark_field(c, uow, ctx).await,
        GameCommand::SendMarkingConflictAnswer(c) => {
            handle_send_marking_conflict_answer(c, uow, ctx).await
        }
        GameCommand::AttackField(c) => handle_attack_field(c, uow, ctx).await,
        GameCommand::SendAnswer(c) => handle_send_answer(c, uow, ctx).await,
        GameCommand::ExpireRound(c) => handle_expire_round(c, uow, ctx).await,
        GameCommand::ExpireQuestion(c) => handle_expire_question(c, uow, ctx).await,
    }
}

/// Creates an empty game with the configured settings.
pub fn handle_create_game(command: &CreateGame, uow: &mut UnitOfWork<'_>, ctx: &GameContext<'_>) {
    let settings = uow.services().settings.clone();
    uow.add_new(Game::create(command.game_id, settings, ctx));
}

/// Seats a connecting user, registering them on first sight.
///
/// # Errors
///
/// Returns `GameError::GameAlreadyStarted` or `GameError::GameIsFull`, or a
/// port failure.
#[instrument(skip(uow, ctx), fields(game_id = %command.game_id))]
pub async fn handle_add_user(
    command: &AddUser,
    uow: &mut UnitOfWork<'_>,
    ctx: &GameContext<'_>,
) -> Result<(), ServiceError> {
    let player = uow
        .services()
        .players
        .get_or_create(command.player_id, ctx.clock.now())
        .await?;
    uow.game(command.game_id).await?.add_player(player, ctx)?;
    Ok(())
}

/// Unseats a disconnecting user.
///
/// # Errors
///
/// Returns `GameError::GameAlreadyStarted` or a port failure.
pub async fn handle_remove_user(
    command: &RemoveUser,
    uow: &mut UnitOfWork<'_>,
    ctx: &GameContext<'_>,
) -> Result<(), ServiceError> {
    uow.game(command.game_id)
        .await?
        .remove_player(command.player_id, ctx)?;
    Ok(())
}

/// Picks a base for the active player.
///
/// # Errors
///
/// Returns the `GameError` of `Game::select_base` or a port failure.
pub async fn handle_select_base(
    command: &SelectBase,
    uow: &mut UnitOfWork<'_>,
    ctx: &GameContext<'_>,
) -> Result<(), ServiceError> {
    uow.game(command.game_id)
        .await?
        .select_base(command.player_id, command.field_id, ctx)?;
    Ok(())
}

/// Marks a free field.
///
/// # Errors
///
/// Returns the `GameError` of `Game::mark_field` or a port failure.
pub async fn handle_mark_field(
    command: &MarkField,
    uow: &mut UnitOfWork<'_>,
    ctx: &GameContext<'_>,
) -> Result<(), ServiceError> {
    uow.game(command.game_id)
        .await?
        .mark_field(command.player_id, command.field_id, ctx)?;
    Ok(())
}

/// Answers the question of a marking battle.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown answer, the
/// `GameError` of `Game::send_marking_conflict_answer`, or a port failure.
pub async fn handle_send_marking_conflict_answer(
    command: &SendMarkingConflictAnswer,
    uow: &mut UnitOfWork<'_>,
    ctx: &GameContext<'_>,
) -> Result<(), ServiceError> {
    let answer = uow.services().answers.get(command.answer_id).await?;
    uow.game(command.game_id)
        .await?
        .send_marking_conflict_answer(command.player_id, &answer, ctx)?;
    Ok(())
}

/// Attacks a field.
///
/// # Errors
///
/// Returns the `GameError` of `Game::attack_field` or a port failure.
pub async fn handle_attack_field(
    command: &AttackField,
    uow: &mut UnitOfWork<'_>,
    ctx: &GameContext<'_>,
) -> Result<(), ServiceError> {
    uow.game(command.game_id)
        .await?
        .attack_field(command.player_id, command.field_id, ctx)?;
    Ok(())
}

/// Answers the question of a duel round.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown answer, the
/// `GameError` of `Game::send_answer`, or a port failure.
pub async fn handle_send_answer(
    command: &SendAnswer,
    uow: &mut UnitOfWork<'_>,
    ctx: &GameContext<'_>,
) -> Result<(), ServiceError> {
    let answer = uow.services().answers.get(command.answer_id).await?;
    uow.game(command.game_id)
        .await?
        .send_answer(command.player_id, &answer, ctx)?;
    Ok(())
}

/// Applies the timeout fallback of a round that is still open.
///
/// # Errors
///
/// Propagates stage errors and port failures.
pub async fn handle_expire_round(
    command: &ExpireRound,
    uow: &mut UnitOfWork<'_>,
    ctx: &GameContext<'_>,
) -> Result<(), ServiceError> {
    uow.game(command.game_id)
        .await?
        .expire_round(command.stage, command.round_number, ctx)?;
    Ok(())
}

/// Settles a question that is still open.
///
/// # Errors
///
/// Propagates stage errors and port failures.
pub async fn handle_expire_question(
    command: &ExpireQuestion,
    uow: &mut UnitOfWork<'_>,
    ctx: &GameContext<'_>,
) -> Result<(), ServiceError> {
    uow.game(command.game_id)
        .await?
        .expire_question(command.question_number, ctx)?;
    Ok(())
}
