//! Ports the application layer depends on, and the bundle of collaborators
//! handed to the message bus.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conquiz_core::broker::Producer;
use conquiz_core::clock::Clock;
use conquiz_core::error::DomainError;
use uuid::Uuid;

use crate::domain::commands::GameCommand;
use crate::domain::field::Field;
use crate::domain::game::{Game, GameContext};
use crate::domain::player::Player;
use crate::domain::resolvers::ConflictResolver;
use crate::domain::settings::GameSettings;
use crate::domain::strategies::PlayerTurnSelector;
use crate::domain::values::{
    Answer, AnswerId, Category, CategoryId, FieldId, GameId, PlayerId, Question,
};

/// Persistence of game aggregates.
#[async_trait]
pub trait GamesRepository: Send + Sync {
    /// Load a game.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` for an unknown id.
    async fn get(&self, game_id: GameId) -> Result<Game, DomainError>;

    /// Store a brand new game, including its pending events in its version.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if the id is taken.
    async fn create(&self, game: &Game) -> Result<(), DomainError>;

    /// Store a loaded game. The stored version must still equal
    /// `game.version()`; the new version accounts for its pending events.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` on a version mismatch and
    /// `DomainError::AggregateNotFound` for an unknown id.
    async fn save(&self, game: &Game) -> Result<(), DomainError>;
}

/// Known players.
#[async_trait]
pub trait PlayersRepository: Send + Sync {
    /// Load a player.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` for an unknown id.
    async fn get(&self, player_id: PlayerId) -> Result<Player, DomainError>;

    /// Load a player, registering them as connected at `connected_at` on
    /// first sight.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is unavailable.
    async fn get_or_create(
        &self,
        player_id: PlayerId,
        connected_at: DateTime<Utc>,
    ) -> Result<Player, DomainError>;
}

/// Read access to single fields of stored games.
#[async_trait]
pub trait FieldsRepository: Send + Sync {
    /// Load one field of a game.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the game or field is
    /// unknown.
    async fn get(&self, game_id: GameId, field_id: FieldId) -> Result<Field, DomainError>;
}

/// Lookup of submitted answers.
#[async_trait]
pub trait AnswersRepository: Send + Sync {
    /// Resolve an answer id to the question it belongs to.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` for an unknown id.
    async fn get(&self, answer_id: AnswerId) -> Result<Answer, DomainError>;
}

/// Source of trivia categories.
#[async_trait]
pub trait CategoriesClient: Send + Sync {
    /// Pick a random category.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the trivia service fails.
    async fn random(&self) -> Result<Category, DomainError>;
}

/// Source of trivia questions.
#[async_trait]
pub trait QuestionsClient: Send + Sync {
    /// Pick a random question of `category_id` with exactly one correct
    /// answer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the trivia service fails.
    async fn random_by_category(&self, category_id: CategoryId) -> Result<Question, DomainError>;
}

/// Delivery of deferred commands.
#[async_trait]
pub trait TimerScheduler: Send + Sync {
    /// Deliver `command` to the bus once `delay` has elapsed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the scheduler stopped.
    async fn schedule(&self, delay: Duration, command: GameCommand) -> Result<(), DomainError>;
}

/// Every collaborator a handler may need.
#[derive(Clone)]
pub struct Services {
    /// Game persistence.
    pub games: Arc<dyn GamesRepository>,
    /// Player registry.
    pub players: Arc<dyn PlayersRepository>,
    /// Answer lookup.
    pub answers: Arc<dyn AnswersRepository>,
    /// Trivia categories.
    pub categories: Arc<dyn CategoriesClient>,
    /// Trivia questions.
    pub questions: Arc<dyn QuestionsClient>,
    /// Round and question timers.
    pub timers: Arc<dyn TimerScheduler>,
    /// Outbound event publication.
    pub producer: Arc<dyn Producer>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Turn-order policy.
    pub turn_selector: Arc<dyn PlayerTurnSelector>,
    /// Marking-conflict policy.
    pub conflict_resolver: Arc<dyn ConflictResolver>,
    /// Settings for newly created games.
    pub settings: GameSettings,
}

impl Services {
    /// Builds the domain context for one handler invocation.
    #[must_use]
    pub fn context(&self, correlation_id: Uuid, causation_id: Uuid) -> GameContext<'_> {
        GameContext {
            correlation_id,
            causation_id,
            clock: self.clock.as_ref(),
            turn_selector: self.turn_selector.as_ref(),
            conflict_resolver: self.conflict_resolver.as_ref(),
        }
    }
}
