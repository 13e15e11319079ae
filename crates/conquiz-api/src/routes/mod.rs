//! Route modules.

use axum::Router;

use crate::state::AppState;

pub mod games;
pub mod health;
pub mod realtime;

/// The full application router, as served by the binary.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(realtime::router())
        .nest("/api/v1/games", games::router())
}
