//! Shared application state.

use std::sync::Arc;

use conquiz_channels::{ChannelLayer, InMemoryBroker};
use conquiz_core::clock::Clock;
use conquiz_game::application::message_bus::MessageBus;
use conquiz_game::application::ports::{
    AnswersRepository, CategoriesClient, FieldsRepository, GamesRepository, QuestionsClient,
    Services,
};
use conquiz_game::domain::resolvers::FastestCorrectAnswerResolver;
use conquiz_game::domain::settings::GameSettings;
use conquiz_game::domain::strategies::ConnectionTimeAndIdentityPlayerTurnSelector;
use conquiz_store::{InMemoryGameStore, InMemoryPlayerStore};

use crate::dispatcher::GameDispatcher;
use crate::seats::SeatRegistry;
use crate::timers::timer_channel;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Serialized entry to the message bus.
    pub dispatcher: GameDispatcher,
    /// Game reads for the query routes.
    pub games: Arc<dyn GamesRepository>,
    /// Field reads for the query routes.
    pub fields: Arc<dyn FieldsRepository>,
    /// Connections grouped by game.
    pub channels: Arc<ChannelLayer>,
    /// Live sockets per seated player.
    pub seats: Arc<SeatRegistry>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        dispatcher: GameDispatcher,
        games: Arc<dyn GamesRepository>,
        fields: Arc<dyn FieldsRepository>,
        channels: Arc<ChannelLayer>,
    ) -> Self {
        Self {
            dispatcher,
            games,
            fields,
            channels,
            seats: Arc::new(SeatRegistry::new()),
        }
    }

    /// Wires the in-memory stores and broker around `trivia`, and starts the
    /// timer driver.
    ///
    /// Must be called inside a tokio runtime.
    pub fn in_memory<T>(settings: GameSettings, trivia: Arc<T>, clock: Arc<dyn Clock>) -> Self
    where
        T: CategoriesClient + QuestionsClient + AnswersRepository + 'static,
    {
        let games = Arc::new(InMemoryGameStore::new());
        let broker = Arc::new(InMemoryBroker::default());
        let (scheduler, timer_queue) = timer_channel();
        let services = Services {
            games: games.clone(),
            players: Arc::new(InMemoryPlayerStore::new()),
            answers: trivia.clone(),
            categories: trivia.clone(),
            questions: trivia,
            timers: Arc::new(scheduler),
            producer: broker.clone(),
            clock,
            turn_selector: Arc::new(ConnectionTimeAndIdentityPlayerTurnSelector),
            conflict_resolver: Arc::new(FastestCorrectAnswerResolver),
            settings,
        };
        let dispatcher = GameDispatcher::new(MessageBus::new(services));
        timer_queue.spawn(dispatcher.clone());

        Self::new(
            dispatcher,
            games.clone(),
            games,
            Arc::new(ChannelLayer::new(broker)),
        )
    }
}
