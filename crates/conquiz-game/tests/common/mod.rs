//! In-memory ports for driving the message bus end to end.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use conquiz_core::broker::Producer;
use conquiz_core::clock::Clock;
use conquiz_core::error::DomainError;
use conquiz_game::application::message_bus::MessageBus;
use conquiz_game::application::ports::{
    AnswersRepository, CategoriesClient, GamesRepository, QuestionsClient, Services,
    TimerScheduler,
};
use conquiz_game::domain::commands::GameCommand;
use conquiz_game::domain::events::{GameEvent, GameEventKind};
use conquiz_game::domain::game::Game;
use conquiz_game::domain::resolvers::FastestCorrectAnswerResolver;
use conquiz_game::domain::settings::GameSettings;
use conquiz_game::domain::strategies::ConnectionTimeAndIdentityPlayerTurnSelector;
use conquiz_game::domain::values::{
    Answer, AnswerId, Category, CategoryId, GameId, Question, QuestionAnswer, QuestionId,
};
use conquiz_store::{InMemoryGameStore, InMemoryPlayerStore};
use conquiz_test_support::{FixedClock, RecordingProducer};

/// Question `n` has answers `10n + 1` (correct) and `10n + 2`.
#[derive(Default)]
pub struct ScriptedTrivia {
    asked: Mutex<i64>,
}

pub fn right(question_id: QuestionId) -> AnswerId {
    AnswerId(question_id.0 * 10 + 1)
}

pub fn wrong(question_id: QuestionId) -> AnswerId {
    AnswerId(question_id.0 * 10 + 2)
}

#[async_trait]
impl CategoriesClient for ScriptedTrivia {
    async fn random(&self) -> Result<Category, DomainError> {
        Ok(Category {
            id: CategoryId(1),
            title: "Science".to_owned(),
        })
    }
}

#[async_trait]
impl QuestionsClient for ScriptedTrivia {
    async fn random_by_category(&self, _category_id: CategoryId) -> Result<Question, DomainError> {
        let mut asked = self.asked.lock().unwrap();
        *asked += 1;
        let id = QuestionId(*asked);
        Ok(Question {
            id,
            body: format!("question {}", id.0),
            answers: vec![
                QuestionAnswer {
                    id: right(id),
                    body: "right".to_owned(),
                    is_correct: true,
                },
                QuestionAnswer {
                    id: wrong(id),
                    body: "wrong".to_owned(),
                    is_correct: false,
                },
            ],
        })
    }
}

#[async_trait]
impl AnswersRepository for ScriptedTrivia {
    async fn get(&self, answer_id: AnswerId) -> Result<Answer, DomainError> {
        Ok(Answer {
            id: answer_id,
            question_id: QuestionId(answer_id.0 / 10),
        })
    }
}

#[derive(Default)]
pub struct RecordingTimers {
    scheduled: Mutex<Vec<(Duration, GameCommand)>>,
}

impl RecordingTimers {
    pub fn scheduled(&self) -> Vec<(Duration, GameCommand)> {
        self.scheduled.lock().unwrap().clone()
    }
}

#[async_trait]
impl TimerScheduler for RecordingTimers {
    async fn schedule(&self, delay: Duration, command: GameCommand) -> Result<(), DomainError> {
        self.scheduled.lock().unwrap().push((delay, command));
        Ok(())
    }
}

pub struct Harness {
    pub bus: MessageBus,
    pub games: Arc<InMemoryGameStore>,
    pub timers: Arc<RecordingTimers>,
    pub producer: Arc<RecordingProducer>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(None, GameSettings::default(), Arc::new(FixedClock::default()))
    }

    pub fn with_settings(settings: GameSettings) -> Self {
        Self::build(None, settings, Arc::new(FixedClock::default()))
    }

    pub fn with_settings_and_clock(settings: GameSettings, clock: Arc<dyn Clock>) -> Self {
        Self::build(None, settings, clock)
    }

    pub fn with_producer(producer: Arc<dyn Producer>) -> Self {
        Self::build(
            Some(producer),
            GameSettings::default(),
            Arc::new(FixedClock::default()),
        )
    }

    fn build(
        producer: Option<Arc<dyn Producer>>,
        settings: GameSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let games = Arc::new(InMemoryGameStore::new());
        let timers = Arc::new(RecordingTimers::default());
        let recording = Arc::new(RecordingProducer::new());
        let trivia = Arc::new(ScriptedTrivia::default());
        let services = Services {
            games: games.clone(),
            players: Arc::new(InMemoryPlayerStore::new()),
            answers: trivia.clone(),
            categories: trivia.clone(),
            questions: trivia,
            timers: timers.clone(),
            producer: producer.unwrap_or_else(|| recording.clone() as Arc<dyn Producer>),
            clock,
            turn_selector: Arc::new(ConnectionTimeAndIdentityPlayerTurnSelector),
            conflict_resolver: Arc::new(FastestCorrectAnswerResolver),
            settings,
        };
        Self {
            bus: MessageBus::new(services),
            games,
            timers,
            producer: recording,
        }
    }

    /// Reads the committed state of a game from the store.
    pub async fn load(&self, game_id: GameId) -> Game {
        self.games.get(game_id).await.unwrap()
    }
}

pub fn kinds(events: &[GameEvent]) -> Vec<GameEventKind> {
    events.iter().map(|event| event.kind.clone()).collect()
}

pub fn types(events: &[GameEvent]) -> Vec<&'static str> {
    events.iter().map(|event| event.kind.event_type()).collect()
}
