//! Timer scheduler that only records. The caller decides when timers fire.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use conquiz_core::error::DomainError;
use conquiz_game::application::ports::TimerScheduler;
use conquiz_game::domain::commands::GameCommand;

/// Records scheduled commands until they are drained.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: Mutex<Vec<(Duration, GameCommand)>>,
}

impl ManualScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every scheduled command in scheduling order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the lock is poisoned.
    pub fn drain(&self) -> Result<Vec<(Duration, GameCommand)>, DomainError> {
        Ok(std::mem::take(&mut *self.lock()?))
    }

    /// Number of commands waiting to fire.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the lock is poisoned.
    pub fn pending_count(&self) -> Result<usize, DomainError> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<(Duration, GameCommand)>>, DomainError> {
        self.pending
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("scheduler lock poisoned: {e}")))
    }
}

#[async_trait]
impl TimerScheduler for ManualScheduler {
    async fn schedule(&self, delay: Duration, command: GameCommand) -> Result<(), DomainError> {
        self.lock()?.push((delay, command));
        Ok(())
    }
}
