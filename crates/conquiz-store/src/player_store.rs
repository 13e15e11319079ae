//! In-memory player registry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conquiz_core::error::DomainError;
use conquiz_game::application::ports::PlayersRepository;
use conquiz_game::domain::player::Player;
use conquiz_game::domain::values::PlayerId;
use dashmap::DashMap;

/// Players keyed by id. The first connection time sticks.
#[derive(Debug, Default)]
pub struct InMemoryPlayerStore {
    players: DashMap<PlayerId, Player>,
}

impl InMemoryPlayerStore {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlayersRepository for InMemoryPlayerStore {
    async fn get(&self, player_id: PlayerId) -> Result<Player, DomainError> {
        self.players
            .get(&player_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DomainError::AggregateNotFound(format!("player {player_id}")))
    }

    async fn get_or_create(
        &self,
        player_id: PlayerId,
        connected_at: DateTime<Utc>,
    ) -> Result<Player, DomainError> {
        Ok(self
            .players
            .entry(player_id)
            .or_insert_with(|| Player::new(player_id, connected_at))
            .value()
            .clone())
    }
}
