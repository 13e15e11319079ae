//! Query handlers for the game context.
//!
//! Queries read the stored state and return read-only view DTOs. Correct
//! answers of running contests never leave the aggregate.

use conquiz_core::aggregate::AggregateRoot;
use conquiz_core::error::DomainError;
use serde::Serialize;

use super::ports::{FieldsRepository, GamesRepository};
use crate::domain::field::Field;
use crate::domain::game::{Game, GameState};
use crate::domain::values::{FieldId, GameId, GameResultLine, PlayerId};

/// Read-only view of a seated player.
#[derive(Debug, Serialize)]
pub struct PlayerView {
    /// The player identifier.
    pub player_id: PlayerId,
    /// Field marked in the current capturing round.
    pub marked_field: Option<FieldId>,
    /// Whether the player answered the current question.
    pub answered: bool,
}

/// Read-only view of a game.
#[derive(Debug, Serialize)]
pub struct GameView {
    /// The game identifier.
    pub game_id: GameId,
    /// Lifecycle state.
    pub state: GameState,
    /// Current round of the active stage.
    pub round_number: Option<u32>,
    /// Seats.
    pub capacity: usize,
    /// Seated players in join order.
    pub players: Vec<PlayerView>,
    /// Turn order, empty until the game starts.
    pub order: Vec<PlayerId>,
    /// The board.
    pub fields: Vec<Field>,
    /// Standings by owned field value.
    pub standings: Vec<GameResultLine>,
    /// Committed version.
    pub version: i64,
}

impl From<&Game> for GameView {
    fn from(game: &Game) -> Self {
        Self {
            game_id: game.id,
            state: game.state(),
            round_number: game.round_number(),
            capacity: game.capacity(),
            players: game
                .players()
                .iter()
                .map(|player| PlayerView {
                    player_id: player.id,
                    marked_field: player.marked_field(),
                    answered: player.is_answered(),
                })
                .collect(),
            order: game.order().to_vec(),
            fields: game.fields().to_vec(),
            standings: game.results(),
            version: game.version(),
        }
    }
}

/// Retrieves a game view by id.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown game.
pub async fn get_game_view(
    game_id: GameId,
    repo: &dyn GamesRepository,
) -> Result<GameView, DomainError> {
    let game = repo.get(game_id).await?;
    Ok(GameView::from(&game))
}

/// Retrieves one field of a game.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the game or field is unknown.
pub async fn get_field(
    game_id: GameId,
    field_id: FieldId,
    repo: &dyn FieldsRepository,
) -> Result<Field, DomainError> {
    repo.get(game_id, field_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::game::{GameContext, GameSnapshot};
    use crate::domain::player::Player;
    use crate::domain::resolvers::FastestCorrectAnswerResolver;
    use crate::domain::settings::GameSettings;
    use crate::domain::strategies::ConnectionTimeAndIdentityPlayerTurnSelector;
    use async_trait::async_trait;
    use conquiz_test_support::{FixedClock, fixed_time};
    use uuid::Uuid;

    struct SingleGame(GameSnapshot);

    #[async_trait]
    impl GamesRepository for SingleGame {
        async fn get(&self, game_id: GameId) -> Result<Game, DomainError> {
            if game_id == self.0.id {
                Ok(Game::restore(self.0.clone()))
            } else {
                Err(DomainError::AggregateNotFound(game_id.to_string()))
            }
        }

        async fn create(&self, _game: &Game) -> Result<(), DomainError> {
            Ok(())
        }

        async fn save(&self, _game: &Game) -> Result<(), DomainError> {
            Ok(())
        }
    }

    fn stored_game() -> GameSnapshot {
        let clock = FixedClock::default();
        let ctx = GameContext {
            correlation_id: Uuid::new_v4(),
            causation_id: Uuid::new_v4(),
            clock: &clock,
            turn_selector: &ConnectionTimeAndIdentityPlayerTurnSelector,
            conflict_resolver: &FastestCorrectAnswerResolver,
        };
        let mut game = Game::create(GameId::generate(), GameSettings::default(), &ctx);
        game.add_player(Player::new(PlayerId(4), fixed_time()), &ctx)
            .unwrap();
        game.take_uncommitted_events();
        game.snapshot()
    }

    #[tokio::test]
    async fn test_get_game_view_returns_view_for_existing_game() {
        // Arrange
        let snapshot = stored_game();
        let game_id = snapshot.id;
        let repo = SingleGame(snapshot);

        // Act
        let view = get_game_view(game_id, &repo).await.unwrap();

        // Assert
        assert_eq!(view.game_id, game_id);
        assert_eq!(view.state, GameState::PlayersWaiting);
        assert_eq!(view.round_number, None);
        assert_eq!(view.version, 2);
        assert_eq!(view.players.len(), 1);
        assert_eq!(view.players[0].player_id, PlayerId(4));
        assert_eq!(view.fields.len(), 9);
    }

    #[tokio::test]
    async fn test_get_game_view_returns_not_found_for_unknown_game() {
        let repo = SingleGame(stored_game());

        let result = get_game_view(GameId::generate(), &repo).await;

        assert!(matches!(result, Err(DomainError::AggregateNotFound(_))));
    }

    #[test]
    fn test_game_view_serializes_state_in_snake_case() {
        let view = GameView::from(&Game::restore(stored_game()));

        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["state"], "players_waiting");
        assert_eq!(json["capacity"], 2);
    }
}
