//! Serialized command entry point.
//!
//! The bus assumes a single writer per game. Every command that enters the
//! server (HTTP, WebSocket, timers) goes through here and holds the game's
//! lock for its whole cascade.

use std::sync::Arc;

use conquiz_core::command::Command;
use conquiz_game::application::error::ServiceError;
use conquiz_game::application::message_bus::MessageBus;
use conquiz_game::domain::commands::GameCommand;
use conquiz_game::domain::events::GameEvent;
use conquiz_game::domain::values::GameId;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::instrument;

/// Runs commands on the bus one game at a time.
#[derive(Clone)]
pub struct GameDispatcher {
    bus: MessageBus,
    locks: Arc<DashMap<GameId, Arc<Mutex<()>>>>,
}

impl GameDispatcher {
    /// Wraps `bus`.
    #[must_use]
    pub fn new(bus: MessageBus) -> Self {
        Self {
            bus,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// The wrapped bus.
    #[must_use]
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Dispatches `command` once no other cascade of the same game runs.
    ///
    /// # Errors
    ///
    /// Returns the first `ServiceError` raised in the cascade.
    #[instrument(skip(self, command), fields(game_id = %command.game_id(), command_type = command.command_type()))]
    pub async fn dispatch(&self, command: GameCommand) -> Result<Vec<GameEvent>, ServiceError> {
        let game_id = command.game_id();
        let lock = self.locks.entry(game_id).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            self.bus.dispatch(command).await
        };
        drop(lock);
        self.locks.remove_if(&game_id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }
}
