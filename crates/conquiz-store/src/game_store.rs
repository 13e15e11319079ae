//! In-memory game store with optimistic versioning.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use conquiz_core::aggregate::AggregateRoot;
use conquiz_core::error::DomainError;
use conquiz_game::application::ports::{FieldsRepository, GamesRepository};
use conquiz_game::domain::field::Field;
use conquiz_game::domain::game::{Game, GameSnapshot};
use conquiz_game::domain::values::{FieldId, GameId};
use tracing::debug;

/// Keeps one snapshot per game. A save succeeds only if the stored version
/// still equals the version the game was loaded at.
#[derive(Debug, Default)]
pub struct InMemoryGameStore {
    games: Mutex<HashMap<GameId, GameSnapshot>>,
}

impl InMemoryGameStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `snapshot` as is, replacing any previous state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store lock is poisoned.
    pub fn insert(&self, snapshot: GameSnapshot) -> Result<(), DomainError> {
        self.lock()?.insert(snapshot.id, snapshot);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<GameId, GameSnapshot>>, DomainError> {
        self.games
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("game store lock poisoned: {e}")))
    }
}

/// The state to persist: the snapshot with its pending events counted into
/// the version.
fn committed_snapshot(game: &Game) -> GameSnapshot {
    let mut snapshot = game.snapshot();
    snapshot.version += i64::try_from(game.uncommitted_events().len()).unwrap_or(i64::MAX);
    snapshot
}

#[async_trait]
impl GamesRepository for InMemoryGameStore {
    async fn get(&self, game_id: GameId) -> Result<Game, DomainError> {
        self.lock()?
            .get(&game_id)
            .cloned()
            .map(Game::restore)
            .ok_or_else(|| DomainError::AggregateNotFound(game_id.to_string()))
    }

    async fn create(&self, game: &Game) -> Result<(), DomainError> {
        let mut games = self.lock()?;
        if let Some(existing) = games.get(&game.id) {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: game.id.to_string(),
                expected: 0,
                actual: existing.version,
            });
        }
        let snapshot = committed_snapshot(game);
        debug!(game_id = %game.id, version = snapshot.version, "game created");
        games.insert(game.id, snapshot);
        Ok(())
    }

    async fn save(&self, game: &Game) -> Result<(), DomainError> {
        let mut games = self.lock()?;
        let stored = games
            .get(&game.id)
            .map(|snapshot| snapshot.version)
            .ok_or_else(|| DomainError::AggregateNotFound(game.id.to_string()))?;
        if stored != game.version() {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: game.id.to_string(),
                expected: game.version(),
                actual: stored,
            });
        }
        if game.uncommitted_events().is_empty() {
            return Ok(());
        }
        let snapshot = committed_snapshot(game);
        debug!(game_id = %game.id, version = snapshot.version, "game saved");
        games.insert(game.id, snapshot);
        Ok(())
    }
}

#[async_trait]
impl FieldsRepository for InMemoryGameStore {
    async fn get(&self, game_id: GameId, field_id: FieldId) -> Result<Field, DomainError> {
        let games = self.lock()?;
        let snapshot = games
            .get(&game_id)
            .ok_or_else(|| DomainError::AggregateNotFound(game_id.to_string()))?;
        snapshot
            .fields
            .iter()
            .find(|field| field.id == field_id)
            .cloned()
            .ok_or_else(|| DomainError::AggregateNotFound(format!("field {field_id} of game {game_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conquiz_game::domain::game::GameContext;
    use conquiz_game::domain::player::Player;
    use conquiz_game::domain::resolvers::FastestCorrectAnswerResolver;
    use conquiz_game::domain::settings::GameSettings;
    use conquiz_game::domain::strategies::ConnectionTimeAndIdentityPlayerTurnSelector;
    use conquiz_game::domain::values::PlayerId;
    use conquiz_test_support::{FixedClock, fixed_time};
    use uuid::Uuid;

    fn ctx(clock: &FixedClock) -> GameContext<'_> {
        GameContext {
            correlation_id: Uuid::new_v4(),
            causation_id: Uuid::new_v4(),
            clock,
            turn_selector: &ConnectionTimeAndIdentityPlayerTurnSelector,
            conflict_resolver: &FastestCorrectAnswerResolver,
        }
    }

    fn new_game() -> Game {
        Game::create(
            GameId::generate(),
            GameSettings::default(),
            &ctx(&FixedClock::default()),
        )
    }

    #[tokio::test]
    async fn test_create_then_get_counts_pending_events_into_version() {
        // Arrange
        let store = InMemoryGameStore::new();
        let game = new_game();

        // Act
        store.create(&game).await.unwrap();
        let loaded = GamesRepository::get(&store, game.id).await.unwrap();

        // Assert
        assert_eq!(loaded.version(), 1);
        assert!(loaded.uncommitted_events().is_empty());
        assert_eq!(loaded.fields().len(), 9);
    }

    #[tokio::test]
    async fn test_create_twice_conflicts() {
        let store = InMemoryGameStore::new();
        let game = new_game();
        store.create(&game).await.unwrap();

        let result = store.create(&game).await;

        assert!(matches!(
            result,
            Err(DomainError::ConcurrencyConflict { expected: 0, actual: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_save_with_stale_version_conflicts() {
        // Arrange
        let clock = FixedClock::default();
        let store = InMemoryGameStore::new();
        let game = new_game();
        let game_id = game.id;
        store.create(&game).await.unwrap();
        let mut first = GamesRepository::get(&store, game_id).await.unwrap();
        let mut second = GamesRepository::get(&store, game_id).await.unwrap();
        first
            .add_player(Player::new(PlayerId(1), fixed_time()), &ctx(&clock))
            .unwrap();
        second
            .add_player(Player::new(PlayerId(2), fixed_time()), &ctx(&clock))
            .unwrap();
        store.save(&first).await.unwrap();

        // Act
        let result = store.save(&second).await;

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::ConcurrencyConflict { expected: 1, actual: 2, .. })
        ));
        let stored = GamesRepository::get(&store, game_id).await.unwrap();
        assert_eq!(stored.players()[0].id, PlayerId(1));
    }

    #[tokio::test]
    async fn test_save_unknown_game_is_not_found() {
        let store = InMemoryGameStore::new();

        let result = store.save(&new_game()).await;

        assert!(matches!(result, Err(DomainError::AggregateNotFound(_))));
    }

    #[tokio::test]
    async fn test_fields_repository_reads_single_field() {
        let store = InMemoryGameStore::new();
        let game = new_game();
        store.create(&game).await.unwrap();

        let field = FieldsRepository::get(&store, game.id, FieldId(4)).await.unwrap();
        let missing = FieldsRepository::get(&store, game.id, FieldId(40)).await;

        assert_eq!(field.id, FieldId(4));
        assert_eq!(field.value, 0);
        assert!(matches!(missing, Err(DomainError::AggregateNotFound(_))));
    }
}
