//! Integration tests for the game routes.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use conquiz_api::state::AppState;
use conquiz_game::domain::commands::{AddUser, GameCommand};
use conquiz_game::domain::settings::GameSettings;
use conquiz_game::domain::values::{GameId, PlayerId};
use conquiz_store::StaticTriviaCatalog;
use conquiz_test_support::{FixedClock, MockRng};
use uuid::Uuid;

async fn seat(state: &AppState, game_id: GameId, players: &[i64]) {
    for player in players {
        state
            .dispatcher
            .dispatch(GameCommand::AddUser(AddUser {
                game_id,
                player_id: PlayerId(*player),
            }))
            .await
            .unwrap();
    }
}

fn game_id_of(json: &serde_json::Value) -> GameId {
    GameId(json["game_id"].as_str().unwrap().parse::<Uuid>().unwrap())
}

#[tokio::test]
async fn test_created_game_waits_for_players() {
    // Arrange
    let state = common::build_test_state();
    let (status, created) =
        common::post_empty(common::build_test_app(state.clone()), "/api/v1/games").await;
    assert_eq!(status, StatusCode::CREATED);
    let game_id = game_id_of(&created);

    // Act
    let (status, json) = common::get_json(
        common::build_test_app(state),
        &format!("/api/v1/games/{game_id}"),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "players_waiting");
    assert_eq!(json["capacity"], 2);
    assert_eq!(json["fields"].as_array().unwrap().len(), 9);
    assert_eq!(json["version"], 1);
}

#[tokio::test]
async fn test_full_game_starts_preparatory_stage() {
    // Arrange
    let state = common::build_test_state();
    let (_, created) =
        common::post_empty(common::build_test_app(state.clone()), "/api/v1/games").await;
    let game_id = game_id_of(&created);

    // Act
    seat(&state, game_id, &[7, 3]).await;
    let (status, json) = common::get_json(
        common::build_test_app(state),
        &format!("/api/v1/games/{game_id}"),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "preparatory_stage");
    assert_eq!(json["round_number"], 1);
    assert_eq!(json["order"], serde_json::json!([3, 7]));
}

#[tokio::test]
async fn test_get_field_of_unknown_field_returns_404() {
    let state = common::build_test_state();
    let (_, created) =
        common::post_empty(common::build_test_app(state.clone()), "/api/v1/games").await;
    let game_id = game_id_of(&created);

    let (found, field) = common::get_json(
        common::build_test_app(state.clone()),
        &format!("/api/v1/games/{game_id}/fields/4"),
    )
    .await;
    let (missing, _) = common::get_json(
        common::build_test_app(state),
        &format!("/api/v1/games/{game_id}/fields/40"),
    )
    .await;

    assert_eq!(found, StatusCode::OK);
    assert_eq!(field["id"], 4);
    assert_eq!(missing, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_round_timer_assigns_fallback_base() {
    // Arrange
    let trivia = Arc::new(StaticTriviaCatalog::sample(Box::new(MockRng)).unwrap());
    let settings = GameSettings {
        round_time_seconds: 1,
        ..GameSettings::default()
    };
    let state = AppState::in_memory(settings, trivia, Arc::new(FixedClock::default()));
    let (_, created) =
        common::post_empty(common::build_test_app(state.clone()), "/api/v1/games").await;
    let game_id = game_id_of(&created);
    seat(&state, game_id, &[1, 2]).await;

    // Act
    tokio::time::sleep(Duration::from_millis(1500)).await;

    // Assert
    let (_, field) = common::get_json(
        common::build_test_app(state),
        &format!("/api/v1/games/{game_id}/fields/1"),
    )
    .await;
    assert_eq!(field["captured"]["owner"], 1);
    assert_eq!(field["captured"]["is_base"], true);
}
