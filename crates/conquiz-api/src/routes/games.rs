//! Routes for creating and inspecting games.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use conquiz_game::application::query_handlers::{self, GameView};
use conquiz_game::domain::commands::{CreateGame, GameCommand};
use conquiz_game::domain::field::Field;
use conquiz_game::domain::values::{FieldId, GameId};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body returned after a game is created.
#[derive(Debug, Serialize)]
pub struct CreateGameResponse {
    /// The new game; also the WebSocket group to join.
    pub game_id: GameId,
    /// IDs of the domain events produced.
    pub event_ids: Vec<Uuid>,
}

/// POST /
#[instrument(skip(state))]
async fn create_game(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreateGameResponse>), ApiError> {
    let game_id = GameId::generate();
    info!(%game_id, "creating game");

    let events = state
        .dispatcher
        .dispatch(GameCommand::CreateGame(CreateGame { game_id }))
        .await?;

    let event_ids = events.iter().map(|e| e.metadata.event_id).collect();

    Ok((
        StatusCode::CREATED,
        Json(CreateGameResponse { game_id, event_ids }),
    ))
}

/// GET /{game_id}
#[instrument(skip(state))]
async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameView>, ApiError> {
    let view = query_handlers::get_game_view(GameId(game_id), state.games.as_ref()).await?;
    Ok(Json(view))
}

/// GET /{game_id}/fields/{field_id}
#[instrument(skip(state))]
async fn get_field(
    State(state): State<AppState>,
    Path((game_id, field_id)): Path<(Uuid, i64)>,
) -> Result<Json<Field>, ApiError> {
    let field =
        query_handlers::get_field(GameId(game_id), FieldId(field_id), state.fields.as_ref())
            .await?;
    Ok(Json(field))
}

/// Returns the router for game resources.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_game))
        .route("/{game_id}", get(get_game))
        .route("/{game_id}/fields/{field_id}", get(get_field))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use conquiz_game::domain::settings::GameSettings;
    use conquiz_store::StaticTriviaCatalog;
    use conquiz_test_support::{FixedClock, MockRng};
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_app_state() -> AppState {
        let trivia = Arc::new(StaticTriviaCatalog::sample(Box::new(MockRng)).unwrap());
        AppState::in_memory(GameSettings::default(), trivia, Arc::new(FixedClock::default()))
    }

    #[tokio::test]
    async fn test_create_game_returns_201_with_game_id() {
        // Arrange
        let app = router().with_state(test_app_state());
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::empty())
            .unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(json["game_id"].is_string());
        assert_eq!(json["event_ids"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_unknown_game_returns_404() {
        // Arrange
        let app = router().with_state(test_app_state());
        let request = Request::builder()
            .method("GET")
            .uri(format!("/{}", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "aggregate_not_found");
    }

    #[tokio::test]
    async fn test_get_game_with_malformed_id_returns_400() {
        let app = router().with_state(test_app_state());
        let request = Request::builder()
            .method("GET")
            .uri("/not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
