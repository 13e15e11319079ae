//! Event handlers: the reactions that chain one game step to the next.

use std::time::Duration;

use tracing::debug;

use super::dispatch::EventHandler;
use super::error::ServiceError;
use super::unit_of_work::UnitOfWork;
use crate::domain::commands::{ExpireQuestion, ExpireRound, GameCommand};
use crate::domain::events::{GameEvent, GameEventKind};
use crate::domain::game::GameContext;
use crate::domain::values::GameId;

/// Runs `handler` for `event`.
///
/// # Errors
///
/// Returns the handler's `ServiceError`.
pub async fn handle(
    handler: EventHandler,
    event: &GameEvent,
    uow: &mut UnitOfWork<'_>,
    ctx: &GameContext<'_>,
) -> Result<(), ServiceError> {
    let game_id = GameId(event.metadata.aggregate_id);
    match handler {
        EventHandler::TryStartGame => {
            uow.game(game_id).await?.try_start(ctx);
            Ok(())
        }
        EventHandler::StartStage => Ok(uow.game(game_id).await?.start_stage(ctx)?),
        EventHandler::StartRound => Ok(uow.game(game_id).await?.start_round(ctx)?),
        EventHandler::ScheduleRoundTimer => schedule_round_timer(game_id, &event.kind, uow).await,
        EventHandler::FinishRound => Ok(uow.game(game_id).await?.finish_round(ctx)?),
        EventHandler::CheckRoundOutcome => Ok(uow.game(game_id).await?.check_round_outcome(ctx)?),
        EventHandler::StartNextStage => Ok(uow.game(game_id).await?.start_next_stage(ctx)?),
        EventHandler::CheckAreAllPlayersMarkedFields => {
            uow.game(game_id)
                .await?
                .check_are_all_players_marked_fields(ctx);
            Ok(())
        }
        EventHandler::CheckMarkingConflict => {
            Ok(uow.game(game_id).await?.check_marking_conflict(ctx)?)
        }
        EventHandler::StartCapturingBattle => {
            Ok(uow.game(game_id).await?.start_capturing_battle(ctx)?)
        }
        EventHandler::SelectCapturingCategory | EventHandler::SelectDuelCategory => {
            select_category(game_id, uow, ctx).await
        }
        EventHandler::SelectQuestion => select_question(game_id, uow, ctx).await,
        EventHandler::ScheduleQuestionTimer => {
            schedule_question_timer(game_id, &event.kind, uow).await
        }
        EventHandler::CheckAreAllPlayersAnswered => {
            Ok(uow.game(game_id).await?.check_are_all_players_answered(ctx)?)
        }
        EventHandler::StartDuel => Ok(uow.game(game_id).await?.start_duel(ctx)?),
        EventHandler::StartDuelRound => Ok(uow.game(game_id).await?.start_duel_round(ctx)?),
        EventHandler::CheckBattleRoundOutcome => {
            Ok(uow.game(game_id).await?.check_battle_round_outcome(ctx)?)
        }
    }
}

/// Arms the timer of the action round announced by `RoundStarted`.
async fn schedule_round_timer(
    game_id: GameId,
    kind: &GameEventKind,
    uow: &UnitOfWork<'_>,
) -> Result<(), ServiceError> {
    let GameEventKind::RoundStarted(started) = kind else {
        return Ok(());
    };
    debug!(%game_id, stage = %started.stage, round_number = started.round_number, "round timer armed");
    uow.services()
        .timers
        .schedule(
            Duration::from_secs(started.duration_seconds),
            GameCommand::ExpireRound(ExpireRound {
                game_id,
                stage: started.stage,
                round_number: started.round_number,
            }),
        )
        .await?;
    Ok(())
}

/// Arms the timer of the question announced by `QuestionSet`.
async fn schedule_question_timer(
    game_id: GameId,
    kind: &GameEventKind,
    uow: &UnitOfWork<'_>,
) -> Result<(), ServiceError> {
    let GameEventKind::QuestionSet(set) = kind else {
        return Ok(());
    };
    uow.services()
        .timers
        .schedule(
            Duration::from_secs(set.duration_seconds),
            GameCommand::ExpireQuestion(ExpireQuestion {
                game_id,
                question_number: set.question_number,
            }),
        )
        .await?;
    Ok(())
}

/// Draws a random category for the running marking battle or duel.
async fn select_category(
    game_id: GameId,
    uow: &mut UnitOfWork<'_>,
    ctx: &GameContext<'_>,
) -> Result<(), ServiceError> {
    let category = uow.services().categories.random().await?;
    uow.game(game_id).await?.set_category(category, ctx)?;
    Ok(())
}

/// Draws a question of the current category and puts it to the contenders.
async fn select_question(
    game_id: GameId,
    uow: &mut UnitOfWork<'_>,
    ctx: &GameContext<'_>,
) -> Result<(), ServiceError> {
    let category_id = uow.game(game_id).await?.current_category()?.id;
    let question = uow
        .services()
        .questions
        .random_by_category(category_id)
        .await?;
    uow.game(game_id).await?.set_question(question, ctx)?;
    Ok(())
}
