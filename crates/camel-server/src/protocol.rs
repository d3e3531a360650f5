//! WebSocket protocol messages for camel race multiplayer.

use camel_core::{BotDifficulty, Color};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Create a new game room
    CreateRoom { player_name: String, max_players: u8 },

    /// Join an existing room
    JoinRoom { room_id: Uuid, player_name: String },

    /// Leave current room
    LeaveRoom,

    /// Mark yourself ready (or not) to start
    SetReady { ready: bool },

    /// Seat a bot (host only)
    AddBot { difficulty: BotDifficulty },

    /// Remove a bot seat (host only)
    RemoveBot { bot_id: Uuid },

    /// Start the game (host only)
    StartGame,

    /// Submit a game action
    GameAction { action: serde_json::Value },

    /// Send chat message
    Chat { message: String },

    /// Request room list
    ListRooms,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned player ID
    Welcome { player_id: Uuid },

    /// Room created successfully
    RoomCreated { room_id: Uuid },

    /// Joined room successfully
    JoinedRoom { room: RoomInfo },

    /// Left room successfully
    LeftRoom,

    /// Room state updated (seat added/removed, ready flag, host change)
    RoomUpdated { room: RoomInfo },

    /// Game started
    GameStarted { state: serde_json::Value },

    /// Game state updated
    GameState { state: serde_json::Value },

    /// Result of the sender's own action
    ActionResult {
        success: bool,
        events: Vec<serde_json::Value>,
        error: Option<String>,
    },

    /// Valid actions for the seat to move
    ValidActions {
        player_index: u8,
        actions: Vec<serde_json::Value>,
    },

    /// Seat to move changed
    TurnChanged { player_index: u8, player_name: String },

    /// Chat message received
    ChatMessage { player_name: String, message: String },

    /// List of rooms waiting for players
    RoomList { rooms: Vec<RoomInfo> },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,

    /// Race finished and outcome wagers were paid
    GameOver {
        champion: Color,
        last: Color,
        standings: Vec<StandingInfo>,
    },
}

/// Room information for clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: Uuid,
    pub name: String,
    pub players: Vec<PlayerInfo>,
    pub max_players: u8,
    pub host_id: Uuid,
    pub status: RoomStatus,
}

/// Seat information in a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Uuid,
    pub name: String,
    pub ready: bool,
    pub connected: bool,
    /// Set for bot seats
    pub bot: Option<BotDifficulty>,
}

/// Final balance of one seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingInfo {
    pub player_index: u8,
    pub name: String,
    pub coins: i32,
}

/// Room status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Waiting,
    InGame,
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_shape() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"AddBot","payload":{"difficulty":"Hard"}}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::AddBot {
                difficulty: BotDifficulty::Hard
            }
        ));

        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"GameAction","payload":{"action":{"ClaimRoundCard":"Red"}}}"#,
        )
        .unwrap();
        assert!(matches!(msg, ClientMessage::GameAction { .. }));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"Ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_server_message_shape() {
        let json = serde_json::to_value(ServerMessage::TurnChanged {
            player_index: 2,
            player_name: "Carol".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "TurnChanged");
        assert_eq!(json["payload"]["player_index"], 2);
    }
}
