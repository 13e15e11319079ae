//! Event dispatch table.
//!
//! Every event variant maps to an ordered, possibly empty, list of handlers.
//! The match is exhaustive, so a new event cannot be added without deciding
//! who reacts to it.

use crate::domain::events::GameEventKind;

/// Reactions to game events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventHandler {
    /// Start the game once every seat is taken.
    TryStartGame,
    /// Start the first stage.
    StartStage,
    /// Start the current round of the active stage.
    StartRound,
    /// Arm the action-round timer.
    ScheduleRoundTimer,
    /// Close the current round.
    FinishRound,
    /// Advance the round counter or finish the stage.
    CheckRoundOutcome,
    /// Move on to the next stage or end the game.
    StartNextStage,
    /// Close marking once everyone marked.
    CheckAreAllPlayersMarkedFields,
    /// Detect the next marking conflict or capture the marked fields.
    CheckMarkingConflict,
    /// Open a marking battle.
    StartCapturingBattle,
    /// Draw the marking-battle category.
    SelectCapturingCategory,
    /// Draw a question for the running contest.
    SelectQuestion,
    /// Arm the question timer.
    ScheduleQuestionTimer,
    /// Settle the question once every contender answered.
    CheckAreAllPlayersAnswered,
    /// Open the duel for a pending attack.
    StartDuel,
    /// Draw the duel category.
    SelectDuelCategory,
    /// Open a duel round.
    StartDuelRound,
    /// Continue or settle the duel.
    CheckBattleRoundOutcome,
}

/// Returns the handlers reacting to `kind`, in execution order.
#[must_use]
pub fn handlers_for(kind: &GameEventKind) -> &'static [EventHandler] {
    use EventHandler as H;
    use GameEventKind as K;

    match kind {
        K::GameCreated(_) | K::PlayerRemoved(_) | K::GameFinished(_) => &[],
        K::PlayerAdded(_) => &[H::TryStartGame],
        K::GameStarted(_) => &[H::StartStage],
        K::StageStarted(_) => &[H::StartRound],
        K::RoundStarted(_) => &[H::ScheduleRoundTimer],
        K::BaseSelected(_) | K::FieldCaptured(_) | K::DuelFinished(_) => &[H::FinishRound],
        K::RoundFinished(_) => &[H::CheckRoundOutcome],
        K::StageFinished(_) => &[H::StartNextStage],
        K::FieldMarked(_) => &[H::CheckAreAllPlayersMarkedFields],
        K::FieldsMarked(_) | K::CapturingBattleFinished(_) => &[H::CheckMarkingConflict],
        K::MarkingConflictDetected(_) => &[H::StartCapturingBattle],
        K::CapturingBattleStarted(_) => &[H::SelectCapturingCategory],
        K::CapturingBattleCategorySet(_) | K::DuelRoundStarted(_) => &[H::SelectQuestion],
        K::QuestionSet(_) => &[H::ScheduleQuestionTimer],
        K::CapturingBattlePlayerAnswered(_) | K::PlayerAnswered(_) => {
            &[H::CheckAreAllPlayersAnswered]
        }
        K::PlayerFieldAttacked(_) => &[H::StartDuel],
        K::DuelStarted(_) => &[H::SelectDuelCategory],
        K::DuelCategorySet(_) => &[H::StartDuelRound],
        K::DuelRoundFinished(_) => &[H::CheckBattleRoundOutcome],
    }
}
