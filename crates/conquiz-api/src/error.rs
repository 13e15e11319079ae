//! Conquiz — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use conquiz_core::error::DomainError;
use conquiz_game::application::error::ServiceError;
use conquiz_game::domain::errors::GameError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `ServiceError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(ServiceError::Domain(err))
    }
}

impl ApiError {
    /// Status code and machine-readable code for this error.
    #[must_use]
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            ServiceError::Game(GameError::InvalidStage { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_fault")
            }
            ServiceError::Game(GameError::GameIsFull | GameError::GameAlreadyStarted) => {
                (StatusCode::CONFLICT, "game_unavailable")
            }
            ServiceError::Game(_) => (StatusCode::UNPROCESSABLE_ENTITY, "action_rejected"),
            ServiceError::Domain(DomainError::AggregateNotFound(_)) => {
                (StatusCode::NOT_FOUND, "aggregate_not_found")
            }
            ServiceError::Domain(DomainError::ConcurrencyConflict { .. }) => {
                (StatusCode::CONFLICT, "concurrency_conflict")
            }
            ServiceError::Domain(DomainError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            ServiceError::Domain(DomainError::Infrastructure(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
            }
            ServiceError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conquiz_game::domain::game::GameState;
    use conquiz_game::domain::values::PlayerId;

    fn status_of(err: impl Into<ServiceError>) -> StatusCode {
        let response = ApiError(err.into()).into_response();
        response.status()
    }

    #[test]
    fn test_aggregate_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::AggregateNotFound("game".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_concurrency_conflict_maps_to_409() {
        assert_eq!(
            status_of(DomainError::ConcurrencyConflict {
                aggregate_id: "game".into(),
                expected: 1,
                actual: 2,
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(DomainError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_infrastructure_maps_to_500() {
        assert_eq!(
            status_of(DomainError::Infrastructure("broker down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_full_game_maps_to_409() {
        assert_eq!(status_of(GameError::GameIsFull), StatusCode::CONFLICT);
    }

    #[test]
    fn test_rejected_action_maps_to_422() {
        assert_eq!(
            status_of(GameError::NotYourTurn(PlayerId(2))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_invalid_stage_maps_to_500() {
        assert_eq!(
            status_of(GameError::InvalidStage {
                operation: "start_round",
                state: GameState::Ended,
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
