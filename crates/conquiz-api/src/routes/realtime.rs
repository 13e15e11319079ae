//! WebSocket endpoint.
//!
//! `GET /ws?game=<uuid>&player=<id>` joins the game's channel group and seats
//! the player. Client frames look like
//! `{"action": "mark_field", "data": {"field_id": 3}}`; every published game
//! event is pushed back as a serialized message envelope.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::{Router, routing::get};
use conquiz_channels::{ChannelError, ConnectionId, WebSocketConnection};
use conquiz_game::application::error::ServiceError;
use conquiz_game::domain::commands::{
    AddUser, AttackField, GameCommand, MarkField, RemoveUser, SelectBase, SendAnswer,
    SendMarkingConflictAnswer,
};
use conquiz_game::domain::values::{AnswerId, FieldId, GameId, PlayerId};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::state::AppState;

/// Query string of the WebSocket endpoint.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    /// The game to join.
    pub game: Uuid,
    /// The connecting player.
    pub player: i64,
}

/// An action sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum ClientAction {
    /// Pick a base in the preparatory stage.
    SelectBase {
        /// The chosen field.
        field_id: FieldId,
    },
    /// Mark a free field in the capturing stage.
    MarkField {
        /// The marked field.
        field_id: FieldId,
    },
    /// Answer the question of a marking battle.
    SendMarkingConflictAnswer {
        /// The chosen answer.
        answer_id: AnswerId,
    },
    /// Attack a field in the battling stage.
    AttackField {
        /// The attacked field.
        field_id: FieldId,
    },
    /// Answer the question of a duel round.
    SendAnswer {
        /// The chosen answer.
        answer_id: AnswerId,
    },
}

impl ClientAction {
    /// The command this action stands for.
    #[must_use]
    pub fn into_command(self, game_id: GameId, player_id: PlayerId) -> GameCommand {
        match self {
            Self::SelectBase { field_id } => GameCommand::SelectBase(SelectBase {
                game_id,
                player_id,
                field_id,
            }),
            Self::MarkField { field_id } => GameCommand::MarkField(MarkField {
                game_id,
                player_id,
                field_id,
            }),
            Self::SendMarkingConflictAnswer { answer_id } => {
                GameCommand::SendMarkingConflictAnswer(SendMarkingConflictAnswer {
                    game_id,
                    player_id,
                    answer_id,
                })
            }
            Self::AttackField { field_id } => GameCommand::AttackField(AttackField {
                game_id,
                player_id,
                field_id,
            }),
            Self::SendAnswer { answer_id } => GameCommand::SendAnswer(SendAnswer {
                game_id,
                player_id,
                answer_id,
            }),
        }
    }
}

/// Reply pushed to a single client.
#[derive(Debug, Serialize)]
pub struct StatusFrame {
    /// Always `"error"`.
    pub status: &'static str,
    /// What went wrong.
    pub detail: String,
}

impl StatusFrame {
    fn error(detail: impl Into<String>) -> String {
        let frame = Self {
            status: "error",
            detail: detail.into(),
        };
        serde_json::to_string(&frame)
            .unwrap_or_else(|_| r#"{"status":"error","detail":"internal error"}"#.to_owned())
    }
}

struct SocketConnection {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl WebSocketConnection for SocketConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send(&self, text: String) -> Result<(), ChannelError> {
        self.outbound.send(text).map_err(|_| ChannelError::Closed)
    }
}

/// GET /ws
async fn connect(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    let game_id = GameId(params.game);
    let player_id = PlayerId(params.player);
    ws.on_upgrade(move |socket| session(socket, state, game_id, player_id))
}

#[instrument(skip(socket, state))]
async fn session(socket: WebSocket, state: AppState, game_id: GameId, player_id: PlayerId) {
    let (mut sink, mut stream) = socket.split();
    let (outbound, mut pending) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        while let Some(text) = pending.recv().await {
            if sink.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let connection = Arc::new(SocketConnection {
        id: ConnectionId::generate(),
        outbound: outbound.clone(),
    });
    let connection_id = connection.id;
    let group = game_id.to_string();

    if let Err(e) = state.channels.group_add(&group, connection).await {
        error!(error = %e, "could not join game group");
        writer.abort();
        return;
    }

    if let Err(e) = take_seat(&state, game_id, player_id).await {
        let _ = outbound.send(StatusFrame::error(e.to_string()));
    } else {
        info!("player connected");
        while let Some(Ok(frame)) = stream.next().await {
            match frame {
                WsMessage::Text(text) => {
                    if let Some(reply) = handle_frame(&state, game_id, player_id, text.as_str()).await
                    {
                        let _ = outbound.send(reply);
                    }
                }
                WsMessage::Close(_) => break,
                _ => {}
            }
        }
        info!("player disconnected");
        release_seat(&state, game_id, player_id).await;
    }

    state.channels.group_discard(&group, connection_id);
    drop(outbound);
    let _ = writer.await;
}

/// Seats the player and counts the connection.
async fn take_seat(
    state: &AppState,
    game_id: GameId,
    player_id: PlayerId,
) -> Result<(), ServiceError> {
    state
        .dispatcher
        .dispatch(GameCommand::AddUser(AddUser { game_id, player_id }))
        .await?;
    let connections = state.seats.join(game_id, player_id);
    debug!(connections, "seat taken");
    Ok(())
}

/// Unseats the player once their last connection to the game is gone.
async fn release_seat(state: &AppState, game_id: GameId, player_id: PlayerId) {
    if !state.seats.leave(game_id, player_id) {
        debug!("player still connected elsewhere");
        return;
    }
    if let Err(e) = state
        .dispatcher
        .dispatch(GameCommand::RemoveUser(RemoveUser { game_id, player_id }))
        .await
    {
        debug!(error = %e, "player kept the seat");
    }
}

/// Runs one client frame. Returns the reply to push back, if any.
async fn handle_frame(
    state: &AppState,
    game_id: GameId,
    player_id: PlayerId,
    text: &str,
) -> Option<String> {
    let Ok(action) = serde_json::from_str::<ClientAction>(text) else {
        return Some(StatusFrame::error("action not allowed"));
    };
    match state
        .dispatcher
        .dispatch(action.into_command(game_id, player_id))
        .await
    {
        Ok(_) => None,
        Err(e) => Some(StatusFrame::error(e.to_string())),
    }
}

/// Returns the WebSocket router.
pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(connect))
}

#[cfg(test)]
mod tests {
    use super::*;

    use conquiz_game::application::ports::GamesRepository;
    use conquiz_game::domain::settings::GameSettings;
    use conquiz_store::StaticTriviaCatalog;
    use conquiz_test_support::{FixedClock, MockRng};
    use serde_json::Value;

    fn test_app_state() -> AppState {
        let trivia = Arc::new(StaticTriviaCatalog::sample(Box::new(MockRng)).unwrap());
        AppState::in_memory(GameSettings::default(), trivia, Arc::new(FixedClock::default()))
    }

    #[test]
    fn test_client_action_parses_adjacently_tagged_frame() {
        let action: ClientAction =
            serde_json::from_str(r#"{"action": "mark_field", "data": {"field_id": 3}}"#).unwrap();

        let command = action.into_command(GameId(Uuid::nil()), PlayerId(5));

        assert_eq!(
            command,
            GameCommand::MarkField(MarkField {
                game_id: GameId(Uuid::nil()),
                player_id: PlayerId(5),
                field_id: FieldId(3),
            })
        );
    }

    #[tokio::test]
    async fn test_unknown_action_is_not_allowed() {
        // Arrange
        let state = test_app_state();

        // Act
        let reply = handle_frame(
            &state,
            GameId::generate(),
            PlayerId(1),
            r#"{"action": "surrender", "data": {}}"#,
        )
        .await;

        // Assert
        let json: Value = serde_json::from_str(&reply.unwrap()).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["detail"], "action not allowed");
    }

    #[tokio::test]
    async fn test_rejected_action_replies_with_reason() {
        // Arrange
        let state = test_app_state();
        let game_id = GameId::generate();
        state
            .dispatcher
            .dispatch(GameCommand::CreateGame(
                conquiz_game::domain::commands::CreateGame { game_id },
            ))
            .await
            .unwrap();

        // Act
        let reply = handle_frame(
            &state,
            game_id,
            PlayerId(1),
            r#"{"action": "attack_field", "data": {"field_id": 2}}"#,
        )
        .await;

        // Assert
        let json: Value = serde_json::from_str(&reply.unwrap()).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["detail"], "game is not waiting for an attack");
    }

    #[tokio::test]
    async fn test_second_socket_keeps_the_seat_until_it_closes() {
        // Arrange
        let state = test_app_state();
        let game_id = GameId::generate();
        state
            .dispatcher
            .dispatch(GameCommand::CreateGame(
                conquiz_game::domain::commands::CreateGame { game_id },
            ))
            .await
            .unwrap();
        take_seat(&state, game_id, PlayerId(4)).await.unwrap();
        take_seat(&state, game_id, PlayerId(4)).await.unwrap();

        // Act
        release_seat(&state, game_id, PlayerId(4)).await;
        let after_first = state.games.get(game_id).await.unwrap().players().len();
        release_seat(&state, game_id, PlayerId(4)).await;
        let after_second = state.games.get(game_id).await.unwrap().players().len();

        // Assert
        assert_eq!(after_first, 1);
        assert_eq!(after_second, 0);
    }
}
