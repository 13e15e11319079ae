//! Round and question timers on the tokio runtime.

use std::time::Duration;

use async_trait::async_trait;
use conquiz_core::error::DomainError;
use conquiz_game::application::ports::TimerScheduler;
use conquiz_game::domain::commands::GameCommand;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::dispatcher::GameDispatcher;

type Scheduled = (Duration, GameCommand);

/// Hands deferred commands to the timer driver.
#[derive(Debug, Clone)]
pub struct TokioTimerScheduler {
    sender: mpsc::UnboundedSender<Scheduled>,
}

/// The receiving end, turned into a driver task with [`TimerQueue::spawn`].
#[derive(Debug)]
pub struct TimerQueue {
    receiver: mpsc::UnboundedReceiver<Scheduled>,
}

/// Creates a connected scheduler and queue.
#[must_use]
pub fn timer_channel() -> (TokioTimerScheduler, TimerQueue) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (TokioTimerScheduler { sender }, TimerQueue { receiver })
}

#[async_trait]
impl TimerScheduler for TokioTimerScheduler {
    async fn schedule(&self, delay: Duration, command: GameCommand) -> Result<(), DomainError> {
        self.sender
            .send((delay, command))
            .map_err(|_| DomainError::Infrastructure("timer driver stopped".into()))
    }
}

impl TimerQueue {
    /// Spawns the driver. Each command sleeps on its own task, then goes
    /// through `dispatcher`. Failures are logged; stale timers are no-ops in
    /// the game itself.
    pub fn spawn(mut self, dispatcher: GameDispatcher) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some((delay, command)) = self.receiver.recv().await {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    debug!(game_id = %command.game_id(), "timer fired");
                    if let Err(e) = dispatcher.dispatch(command).await {
                        warn!(error = %e, "timer command failed");
                    }
                });
            }
            debug!("timer driver stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schedule_fails_once_queue_is_gone() {
        // Arrange
        let (scheduler, queue) = timer_channel();
        drop(queue);

        // Act
        let result = scheduler
            .schedule(
                Duration::from_secs(1),
                GameCommand::CreateGame(conquiz_game::domain::commands::CreateGame {
                    game_id: conquiz_game::domain::values::GameId::generate(),
                }),
            )
            .await;

        // Assert
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
