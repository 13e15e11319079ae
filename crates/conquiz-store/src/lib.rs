//! Conquiz — storage and trivia adapters.
//!
//! In-memory implementations of the game context's ports, used by the API
//! server for local runs and by tests, plus the HTTP client for the external
//! trivia service.

mod game_store;
mod http_trivia;
mod player_store;
mod scheduler;
mod trivia_catalog;

pub use game_store::InMemoryGameStore;
pub use http_trivia::HttpTriviaClient;
pub use player_store::InMemoryPlayerStore;
pub use scheduler::ManualScheduler;
pub use trivia_catalog::StaticTriviaCatalog;
