//! Envelope for everything that travels over the bus and the broker.

use serde::{Deserialize, Serialize};

use super::error::ServiceError;
use crate::domain::commands::GameCommand;
use crate::domain::events::GameEvent;
use crate::domain::values::GameId;

/// A command or an event.
///
/// Encoded as `{"message_type": "command" | "event", "body": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message_type", content = "body", rename_all = "snake_case")]
pub enum Message {
    /// A request to change a game.
    Command(GameCommand),
    /// A fact a game recorded.
    Event(GameEvent),
}

impl Message {
    /// Returns the game the message belongs to.
    #[must_use]
    pub fn game_id(&self) -> GameId {
        match self {
            Self::Command(command) => command.game_id(),
            Self::Event(event) => GameId(event.metadata.aggregate_id),
        }
    }

    /// Serializes the message to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Serialization` if encoding fails.
    pub fn encode(&self) -> Result<String, ServiceError> {
        serde_json::to_string(self).map_err(|e| ServiceError::Serialization(e.to_string()))
    }

    /// Parses a message from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Serialization` for malformed input or an
    /// unknown message type.
    pub fn decode(raw: &str) -> Result<Self, ServiceError> {
        serde_json::from_str(raw).map_err(|e| ServiceError::Serialization(e.to_string()))
    }
}

impl From<GameCommand> for Message {
    fn from(command: GameCommand) -> Self {
        Self::Command(command)
    }
}

impl From<GameEvent> for Message {
    fn from(event: GameEvent) -> Self {
        Self::Event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::MarkField;
    use crate::domain::events::tests::sample_kinds;
    use crate::domain::values::{FieldId, PlayerId};
    use conquiz_core::event::EventMetadata;
    use conquiz_test_support::fixed_time;
    use uuid::Uuid;

    fn event(kind: crate::domain::events::GameEventKind) -> GameEvent {
        GameEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: Uuid::new_v4(),
                sequence_number: 4,
                correlation_id: Uuid::new_v4(),
                causation_id: Uuid::new_v4(),
                occurred_at: fixed_time(),
            },
            kind,
        }
    }

    #[test]
    fn test_command_envelope_shape() {
        let game_id = GameId(Uuid::nil());
        let message = Message::from(GameCommand::MarkField(MarkField {
            game_id,
            player_id: PlayerId(3),
            field_id: FieldId(7),
        }));

        let json: serde_json::Value = serde_json::from_str(&message.encode().unwrap()).unwrap();

        assert_eq!(json["message_type"], "command");
        assert_eq!(json["body"]["type"], "MarkField");
        assert_eq!(json["body"]["data"]["player_id"], 3);
        assert_eq!(json["body"]["data"]["field_id"], 7);
        assert_eq!(message.game_id(), game_id);
    }

    #[test]
    fn test_every_event_survives_the_envelope() {
        for kind in sample_kinds() {
            let message = Message::Event(event(kind));

            let decoded = Message::decode(&message.encode().unwrap()).unwrap();

            assert_eq!(decoded, message);
        }
    }

    #[test]
    fn test_event_envelope_carries_metadata_and_kind() {
        let message = Message::Event(event(sample_kinds().remove(0)));

        let json: serde_json::Value = serde_json::from_str(&message.encode().unwrap()).unwrap();

        assert_eq!(json["message_type"], "event");
        assert_eq!(json["body"]["metadata"]["sequence_number"], 4);
        assert!(json["body"]["kind"]["type"].is_string());
    }

    #[test]
    fn test_unknown_message_type_is_rejected() {
        let result = Message::decode(r#"{"message_type":"query","body":{}}"#);

        assert!(matches!(result, Err(ServiceError::Serialization(_))));
    }
}
