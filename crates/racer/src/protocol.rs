use serde::{Deserialize, Serialize};

use crate::input::InputState;
use crate::snapshot::{PlayerId, Snapshot};

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("decoding failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Messages the client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Input { input: InputState },
}

impl ClientMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

/// Session acknowledgment metadata. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Messages the server sends to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Connected(ConnectedInfo),
    GameState(Snapshot),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum WireServerMessage {
    Connected(ConnectedInfo),
    GameState(Snapshot),
    #[serde(other)]
    Unrecognized,
}

impl ServerMessage {
    /// Decodes one text frame. Frames with an unknown `type` yield `Ok(None)`.
    pub fn decode(text: &str) -> Result<Option<Self>, ProtocolError> {
        let wire: WireServerMessage = serde_json::from_str(text).map_err(ProtocolError::Decode)?;
        Ok(match wire {
            WireServerMessage::Connected(info) => Some(Self::Connected(info)),
            WireServerMessage::GameState(snapshot) => Some(Self::GameState(snapshot)),
            WireServerMessage::Unrecognized => None,
        })
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InputFlags, PlayerId};

    #[test]
    fn input_message_wire_shape() {
        let message = ClientMessage::Input {
            input: InputState::from(InputFlags::W | InputFlags::RIGHT),
        };
        let value: serde_json::Value = serde_json::from_str(&message.encode().unwrap()).unwrap();

        assert_eq!(value["type"], "input");
        assert_eq!(value["input"]["w"], true);
        assert_eq!(value["input"]["right"], true);
        assert_eq!(value["input"]["up"], false);
    }

    #[test]
    fn decode_connected_with_metadata() {
        let text = r#"{"type":"connected","playerId":"local","roomId":"local","mode":"local"}"#;

        match ServerMessage::decode(text).unwrap() {
            Some(ServerMessage::Connected(info)) => {
                assert_eq!(info.player_id, Some(PlayerId::new("local")));
                assert_eq!(info.room_id.as_deref(), Some("local"));
                assert_eq!(info.mode.as_deref(), Some("local"));
            }
            other => panic!("expected Connected, got {other:?}"),
        }

        let numeric = ServerMessage::decode(r#"{"type":"connected","playerId":2}"#).unwrap();
        let Some(ServerMessage::Connected(info)) = numeric else {
            panic!("expected Connected");
        };
        assert_eq!(info.player_id, Some(PlayerId::new("2")));

        assert!(matches!(
            ServerMessage::decode(r#"{"type":"connected"}"#).unwrap(),
            Some(ServerMessage::Connected(_))
        ));
    }

    #[test]
    fn decode_game_state() {
        let text = r#"{
            "type": "gameState",
            "players": [
                {"id": "1", "x": 100.0, "y": 200.0, "angle": 90.0, "speed": 3.5, "finished": false, "checkpoint": 2}
            ],
            "checkpoints": [{"x": 200, "y": 300, "radius": 50}],
            "winner": "",
            "started": true
        }"#;

        let Some(ServerMessage::GameState(snapshot)) = ServerMessage::decode(text).unwrap() else {
            panic!("expected GameState");
        };

        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[0].id, PlayerId::new("1"));
        assert_eq!(snapshot.players[0].checkpoint, 2);
        assert_eq!(snapshot.checkpoints[0].radius, 50.0);
        assert_eq!(snapshot.winner, None);
        assert!(snapshot.started);
    }

    #[test]
    fn game_state_with_missing_fields_decodes_empty() {
        let Some(ServerMessage::GameState(snapshot)) =
            ServerMessage::decode(r#"{"type":"gameState"}"#).unwrap()
        else {
            panic!("expected GameState");
        };

        assert!(snapshot.players.is_empty());
        assert!(snapshot.checkpoints.is_empty());
    }

    #[test]
    fn unknown_type_is_ignored() {
        assert!(ServerMessage::decode(r#"{"type":"lobby","rooms":[]}"#)
            .unwrap()
            .is_none());
    }

    #[test]
    fn malformed_frame_is_an_error() {
        assert!(matches!(
            ServerMessage::decode("{not json"),
            Err(ProtocolError::Decode(_))
        ));
        assert!(ServerMessage::decode(r#"{"players":[]}"#).is_err());
    }

    #[test]
    fn server_message_encodes_with_tag() {
        let text = ServerMessage::GameState(Snapshot {
            winner: Some(PlayerId::new("2")),
            ..Default::default()
        })
        .encode()
        .unwrap();

        let decoded = ServerMessage::decode(&text).unwrap();
        assert!(matches!(
            decoded,
            Some(ServerMessage::GameState(Snapshot { winner: Some(ref id), .. })) if id.as_str() == "2"
        ));
    }
}
