//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::game::actions::Action;
use crate::game::snapshot::GameStateSnapshot;
use crate::game::SeatId;

/// A serialized outbound message, shared between seats without re-encoding
pub type Frame = Arc<str>;

/// Kind of `input` message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputType {
    /// Set the pending movement direction to `{x, y}`
    Move,
    /// Resolve a discrete action and clear pending movement
    Action,
    /// Clear pending movement
    StopMove,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Open a new room and take seat 1
    #[serde(rename_all = "camelCase")]
    Create {
        #[serde(default)]
        room_code: String,
    },

    /// Take seat 2 of an existing room
    #[serde(rename_all = "camelCase")]
    Join {
        #[serde(default)]
        room_code: String,
    },

    /// Movement or action input for the sender's team
    #[serde(rename_all = "camelCase")]
    Input {
        player_id: String,
        input_type: InputType,
        #[serde(default)]
        x: Option<f32>,
        #[serde(default)]
        y: Option<f32>,
        #[serde(default)]
        action: Option<Action>,
    },
}

impl ClientMsg {
    /// Inputs that end movement or resolve an action. These bypass the inbound rate limit.
    pub fn is_control_input(&self) -> bool {
        matches!(
            self,
            ClientMsg::Input {
                input_type: InputType::StopMove | InputType::Action,
                ..
            }
        )
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMsg::Create { .. } => "create",
            ClientMsg::Join { .. } => "join",
            ClientMsg::Input { input_type, .. } => match input_type {
                InputType::Move => "move",
                InputType::Action => "action",
                InputType::StopMove => "stopMove",
            },
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Room created, sender holds seat 1
    #[serde(rename_all = "camelCase")]
    RoomCreated { room_code: String, player_id: SeatId },

    /// Room joined, sender holds seat 2
    #[serde(rename_all = "camelCase")]
    RoomJoined { player_id: SeatId },

    /// Both seats filled, simulation running
    GameStart,

    /// Request rejected
    Error { message: String },

    /// Action had no effect
    ActionRejected { action: Action, reason: String },

    /// Full match state (sent every tick)
    GameState { state: GameStateSnapshot },
}

impl ServerMsg {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Serialize a message into a text frame
pub fn encode(msg: &ServerMsg) -> Option<Frame> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Arc::from(json)),
        Err(e) => {
            error!(error = %e, "Failed to encode server message");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_create() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"create","roomCode":"happy-cat"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Create { room_code } if room_code == "happy-cat"));
    }

    #[test]
    fn test_missing_room_code_defaults_empty() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"join"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Join { room_code } if room_code.is_empty()));
    }

    #[test]
    fn test_parse_inputs() {
        let mv: ClientMsg = serde_json::from_str(
            r#"{"type":"input","playerId":"player1","inputType":"move","x":1,"y":-0.5}"#,
        )
        .unwrap();
        match mv {
            ClientMsg::Input { player_id, input_type, x, y, action } => {
                assert_eq!(player_id, "player1");
                assert_eq!(input_type, InputType::Move);
                assert_eq!((x, y), (Some(1.0), Some(-0.5)));
                assert!(action.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }

        let act: ClientMsg = serde_json::from_str(
            r#"{"type":"input","playerId":"player2","inputType":"action","action":"speedup"}"#,
        )
        .unwrap();
        assert!(matches!(
            act,
            ClientMsg::Input { input_type: InputType::Action, action: Some(Action::Speedup), .. }
        ));

        let stop: ClientMsg = serde_json::from_str(
            r#"{"type":"input","playerId":"player2","inputType":"stopMove"}"#,
        )
        .unwrap();
        assert!(matches!(stop, ClientMsg::Input { input_type: InputType::StopMove, .. }));
    }

    #[test]
    fn test_control_inputs() {
        let parse = |text: &str| serde_json::from_str::<ClientMsg>(text).unwrap();
        let stop = parse(r#"{"type":"input","playerId":"player1","inputType":"stopMove"}"#);
        let act = parse(r#"{"type":"input","playerId":"player1","inputType":"action","action":"pass"}"#);
        let mv = parse(r#"{"type":"input","playerId":"player1","inputType":"move","x":1,"y":0}"#);
        let join = parse(r#"{"type":"join","roomCode":"a-b"}"#);

        assert!(stop.is_control_input());
        assert!(act.is_control_input());
        assert!(!mv.is_control_input());
        assert!(!join.is_control_input());
        assert_eq!(stop.kind(), "stopMove");
        assert_eq!(mv.kind(), "move");
    }

    #[test]
    fn test_unknown_type_is_error() {
        assert!(serde_json::from_str::<ClientMsg>(r#"{"type":"dance"}"#).is_err());
        assert!(serde_json::from_str::<ClientMsg>("not json").is_err());
    }

    #[test]
    fn test_server_msg_shapes() {
        let created = serde_json::to_value(ServerMsg::RoomCreated {
            room_code: "x-y".into(),
            player_id: SeatId::Player1,
        })
        .unwrap();
        assert_eq!(created, json!({"type": "roomCreated", "roomCode": "x-y", "playerId": "player1"}));

        let joined = serde_json::to_value(ServerMsg::RoomJoined { player_id: SeatId::Player2 }).unwrap();
        assert_eq!(joined, json!({"type": "roomJoined", "playerId": "player2"}));

        let err = serde_json::to_value(ServerMsg::error("Room is full")).unwrap();
        assert_eq!(err, json!({"type": "error", "message": "Room is full"}));

        let rejected = serde_json::to_value(ServerMsg::ActionRejected {
            action: Action::Pass,
            reason: "not_in_possession".into(),
        })
        .unwrap();
        assert_eq!(
            rejected,
            json!({"type": "actionRejected", "action": "pass", "reason": "not_in_possession"})
        );
    }
}
