//! Unit of work: tracked working copies of games for one handler run.

use conquiz_core::aggregate::AggregateRoot;
use tracing::debug;

use super::error::ServiceError;
use super::messages::Message;
use super::ports::Services;
use crate::domain::events::GameEvent;
use crate::domain::game::Game;
use crate::domain::values::GameId;

#[derive(Debug)]
struct Tracked {
    game: Game,
    is_new: bool,
}

/// Loads games into working copies, saves them on `commit` and publishes
/// their pending events afterwards. Copies that are never committed are
/// discarded.
pub struct UnitOfWork<'a> {
    services: &'a Services,
    tracked: Vec<Tracked>,
}

impl<'a> UnitOfWork<'a> {
    /// Opens an empty unit of work.
    #[must_use]
    pub fn new(services: &'a Services) -> Self {
        Self {
            services,
            tracked: Vec::new(),
        }
    }

    /// Returns the collaborators this unit of work was opened with.
    #[must_use]
    pub fn services(&self) -> &'a Services {
        self.services
    }

    /// Returns the working copy of `game_id`, loading it on first access.
    ///
    /// # Errors
    ///
    /// Propagates `GamesRepository::get` failures.
    pub async fn game(&mut self, game_id: GameId) -> Result<&mut Game, ServiceError> {
        if let Some(index) = self.tracked.iter().position(|t| t.game.id == game_id) {
            return Ok(&mut self.tracked[index].game);
        }

        let game = self.services.games.get(game_id).await?;
        self.tracked.push(Tracked {
            game,
            is_new: false,
        });
        let last = self.tracked.len() - 1;
        Ok(&mut self.tracked[last].game)
    }

    /// Starts tracking a game that does not exist in the store yet.
    pub fn add_new(&mut self, game: Game) -> &mut Game {
        self.tracked.push(Tracked { game, is_new: true });
        let last = self.tracked.len() - 1;
        &mut self.tracked[last].game
    }

    /// Persists every tracked game.
    ///
    /// # Errors
    ///
    /// Propagates repository failures, including version conflicts.
    pub async fn commit(&mut self) -> Result<(), ServiceError> {
        for tracked in &mut self.tracked {
            if tracked.is_new {
                self.services.games.create(&tracked.game).await?;
                tracked.is_new = false;
            } else {
                self.services.games.save(&tracked.game).await?;
            }
        }
        Ok(())
    }

    /// Discards every working copy.
    pub fn rollback(&mut self) {
        if !self.tracked.is_empty() {
            debug!(games = self.tracked.len(), "unit of work rolled back");
        }
        self.tracked.clear();
    }

    /// Drains the pending events of every tracked game, publishes each one on
    /// its game's topic and returns them in recording order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Serialization` if an event cannot be encoded
    /// and propagates producer failures.
    pub async fn publish_events(&mut self) -> Result<Vec<GameEvent>, ServiceError> {
        let mut published = Vec::new();
        for tracked in &mut self.tracked {
            let topic = tracked.game.id.to_string();
            for event in tracked.game.take_uncommitted_events() {
                let payload = Message::Event(event.clone()).encode()?;
                self.services.producer.publish(&topic, payload).await?;
                published.push(event);
            }
        }
        Ok(published)
    }
}
