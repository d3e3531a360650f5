//! WebSocket server and connection handling.

use crate::config::ServerConfig;
use crate::protocol::{ClientMessage, RoomInfo, RoomStatus, ServerMessage};
use crate::room::{GameRoom, RoomError};
use camel_core::GameEvent;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    /// All active rooms
    pub rooms: DashMap<Uuid, GameRoom>,
    /// Mapping from player ID to their room ID
    pub player_rooms: DashMap<Uuid, Uuid>,
    /// Mapping from player ID to their message sender
    pub player_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    pub config: ServerConfig,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            rooms: DashMap::new(),
            player_rooms: DashMap::new(),
            player_senders: DashMap::new(),
            config,
        }
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&self, player_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    fn send_error(&self, player_id: Uuid, err: impl std::fmt::Display) {
        self.send_to_player(
            player_id,
            ServerMessage::Error {
                message: err.to_string(),
            },
        );
    }

    /// Broadcast a message to all players in a room. Bot seats have no sender
    /// and are skipped.
    pub fn broadcast_to_room(&self, room_id: Uuid, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(&room_id) {
            for player_id in room.players.keys() {
                self.send_to_player(*player_id, msg.clone());
            }
        }
    }

    /// Broadcast a message to all players in a room except one.
    pub fn broadcast_to_room_except(&self, room_id: Uuid, except: Uuid, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(&room_id) {
            for player_id in room.players.keys() {
                if *player_id != except {
                    self.send_to_player(*player_id, msg.clone());
                }
            }
        }
    }

    /// Get list of waiting rooms.
    pub fn get_waiting_rooms(&self) -> Vec<RoomInfo> {
        self.rooms
            .iter()
            .filter(|r| r.status == RoomStatus::Waiting)
            .map(|r| r.to_info())
            .collect()
    }

    fn room_of(&self, player_id: Uuid) -> Option<Uuid> {
        self.player_rooms.get(&player_id).map(|r| *r)
    }
}

/// Run the WebSocket server.
pub async fn run_server(state: Arc<ServerState>) -> anyhow::Result<()> {
    let addr = state.config.addr;
    let listener = TcpListener::bind(addr).await?;
    info!("Camel race server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Assign a player ID
    let player_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.player_senders.insert(player_id, tx);

    let welcome = serde_json::to_string(&ServerMessage::Welcome { player_id })?;
    ws_sender.send(Message::Text(welcome)).await?;

    // Forward queued messages to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(player_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", player_id, e);
                    state.send_error(player_id, format!("Invalid message: {}", e));
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", player_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to_player(player_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", player_id, e);
                break;
            }
            _ => {}
        }
    }

    handle_disconnect(player_id, &state);
    state.player_senders.remove(&player_id);
    send_task.abort();

    info!("Connection closed for {}", player_id);
    Ok(())
}

/// Messages describing the room's game after a change, in broadcast order
fn game_update(room: &GameRoom, started: bool) -> Vec<ServerMessage> {
    let mut messages = Vec::new();

    if let Some(state) = room.get_game_state() {
        messages.push(if started {
            ServerMessage::GameStarted { state }
        } else {
            ServerMessage::GameState { state }
        });
    }

    match room.get_result() {
        Some((champion, last, standings)) => messages.push(ServerMessage::GameOver {
            champion,
            last,
            standings,
        }),
        None => {
            if let Some((player_index, actions)) = room.get_valid_actions() {
                messages.push(ServerMessage::ValidActions {
                    player_index,
                    actions,
                });
            }
            if let Some((player_index, player_name)) = room.get_current_player() {
                messages.push(ServerMessage::TurnChanged {
                    player_index,
                    player_name,
                });
            }
        }
    }

    messages
}

fn events_to_json(events: &[GameEvent]) -> Vec<serde_json::Value> {
    events
        .iter()
        .filter_map(|e| serde_json::to_value(e).ok())
        .collect()
}

/// Apply a room change under the room lock, then broadcast the room info.
fn update_room<F>(player_id: Uuid, state: &Arc<ServerState>, change: F)
where
    F: FnOnce(&mut GameRoom) -> Result<(), RoomError>,
{
    let Some(room_id) = state.room_of(player_id) else {
        state.send_error(player_id, "Not in a room");
        return;
    };
    let Some(mut room) = state.rooms.get_mut(&room_id) else {
        return;
    };

    match change(&mut room) {
        Ok(()) => {
            let room_info = room.to_info();
            drop(room);
            state.broadcast_to_room(room_id, ServerMessage::RoomUpdated { room: room_info });
        }
        Err(e) => {
            drop(room);
            state.send_error(player_id, e);
        }
    }
}

/// Queue the next bot turn for a room if a bot is to move.
fn schedule_bot_turn(state: &Arc<ServerState>, room_id: Uuid) {
    let bot_to_move = state
        .rooms
        .get(&room_id)
        .and_then(|room| room.current_bot());
    if bot_to_move.is_none() {
        return;
    }

    let state = Arc::clone(state);
    let delay = state.config.bot_delay;
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let messages = {
            let Some(mut room) = state.rooms.get_mut(&room_id) else {
                return;
            };
            // The room may have changed while we slept
            match room.play_bot_turn() {
                None => return,
                Some(Ok(events)) => {
                    debug!(room = %room_id, events = events.len(), "bot moved");
                    game_update(&room, false)
                }
                Some(Err(e)) => {
                    warn!(room = %room_id, "bot action rejected: {}", e);
                    return;
                }
            }
        };

        for msg in messages {
            state.broadcast_to_room(room_id, msg);
        }
        schedule_bot_turn(&state, room_id);
    });
}

/// Handle a client message.
fn handle_message(player_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::CreateRoom {
            player_name,
            max_players,
        } => {
            let room_id = Uuid::new_v4();
            let room = GameRoom::new(
                room_id,
                player_id,
                player_name,
                max_players,
                state.config.game.clone(),
            );
            let room_info = room.to_info();

            state.rooms.insert(room_id, room);
            state.player_rooms.insert(player_id, room_id);
            info!(room = %room_id, "room created");

            state.send_to_player(player_id, ServerMessage::RoomCreated { room_id });
            state.send_to_player(player_id, ServerMessage::JoinedRoom { room: room_info });
        }

        ClientMessage::JoinRoom {
            room_id,
            player_name,
        } => {
            let Some(mut room) = state.rooms.get_mut(&room_id) else {
                state.send_error(player_id, "Room not found");
                return;
            };
            match room.add_player(player_id, player_name) {
                Ok(()) => {
                    let room_info = room.to_info();
                    drop(room);
                    state.player_rooms.insert(player_id, room_id);

                    state.send_to_player(
                        player_id,
                        ServerMessage::JoinedRoom {
                            room: room_info.clone(),
                        },
                    );
                    state.broadcast_to_room_except(
                        room_id,
                        player_id,
                        ServerMessage::RoomUpdated { room: room_info },
                    );
                }
                Err(e) => {
                    drop(room);
                    state.send_error(player_id, e);
                }
            }
        }

        ClientMessage::LeaveRoom => {
            if let Some((_, room_id)) = state.player_rooms.remove(&player_id) {
                leave_room(player_id, room_id, state);
                state.send_to_player(player_id, ServerMessage::LeftRoom);
            }
        }

        ClientMessage::SetReady { ready } => {
            update_room(player_id, state, |room| room.set_ready(player_id, ready));
        }

        ClientMessage::AddBot { difficulty } => {
            update_room(player_id, state, |room| {
                room.add_bot(player_id, difficulty).map(|_| ())
            });
        }

        ClientMessage::RemoveBot { bot_id } => {
            update_room(player_id, state, |room| room.remove_bot(player_id, bot_id));
        }

        ClientMessage::StartGame => {
            let Some(room_id) = state.room_of(player_id) else {
                return;
            };
            let Some(mut room) = state.rooms.get_mut(&room_id) else {
                return;
            };
            match room.start_game(player_id) {
                Ok(()) => {
                    let messages = game_update(&room, true);
                    drop(room);
                    info!(room = %room_id, "game started");

                    for msg in messages {
                        state.broadcast_to_room(room_id, msg);
                    }
                    schedule_bot_turn(state, room_id);
                }
                Err(e) => {
                    drop(room);
                    state.send_error(player_id, e);
                }
            }
        }

        ClientMessage::GameAction { action } => {
            let Some(room_id) = state.room_of(player_id) else {
                return;
            };
            let Some(mut room) = state.rooms.get_mut(&room_id) else {
                return;
            };
            match room.apply_action(player_id, action) {
                Ok(events) => {
                    let messages = game_update(&room, false);
                    drop(room);

                    // Send action result to the acting player
                    state.send_to_player(
                        player_id,
                        ServerMessage::ActionResult {
                            success: true,
                            events: events_to_json(&events),
                            error: None,
                        },
                    );
                    for msg in messages {
                        state.broadcast_to_room(room_id, msg);
                    }
                    schedule_bot_turn(state, room_id);
                }
                Err(e) => {
                    drop(room);
                    debug!(player = %player_id, "action rejected: {}", e);
                    state.send_to_player(
                        player_id,
                        ServerMessage::ActionResult {
                            success: false,
                            events: vec![],
                            error: Some(e.to_string()),
                        },
                    );
                }
            }
        }

        ClientMessage::Chat { message } => {
            if let Some(room_id) = state.room_of(player_id) {
                let player_name = state
                    .rooms
                    .get(&room_id)
                    .and_then(|r| r.players.get(&player_id).map(|p| p.name.clone()))
                    .unwrap_or_else(|| "Unknown".to_string());

                state.broadcast_to_room(
                    room_id,
                    ServerMessage::ChatMessage {
                        player_name,
                        message,
                    },
                );
            }
        }

        ClientMessage::ListRooms => {
            let rooms = state.get_waiting_rooms();
            state.send_to_player(player_id, ServerMessage::RoomList { rooms });
        }

        ClientMessage::Ping => {
            state.send_to_player(player_id, ServerMessage::Pong);
        }
    }
}

/// Take a player out of a room, dropping the room once no people are left.
fn leave_room(player_id: Uuid, room_id: Uuid, state: &Arc<ServerState>) {
    let Some(mut room) = state.rooms.get_mut(&room_id) else {
        return;
    };

    if room.status == RoomStatus::InGame {
        // Keep the seat so turn order stays intact
        room.set_player_connected(player_id, false);
        if room.is_abandoned() {
            drop(room);
            state.rooms.remove(&room_id);
            info!(room = %room_id, "abandoned game closed");
            return;
        }
        let room_info = room.to_info();
        drop(room);
        state.broadcast_to_room(room_id, ServerMessage::RoomUpdated { room: room_info });
        return;
    }

    let is_empty = room.remove_player(player_id).unwrap_or(false);
    if is_empty {
        drop(room);
        state.rooms.remove(&room_id);
        info!(room = %room_id, "room closed");
    } else {
        let room_info = room.to_info();
        drop(room);
        state.broadcast_to_room(room_id, ServerMessage::RoomUpdated { room: room_info });
    }
}

/// Handle player disconnect.
fn handle_disconnect(player_id: Uuid, state: &Arc<ServerState>) {
    if let Some((_, room_id)) = state.player_rooms.remove(&player_id) {
        leave_room(player_id, room_id, state);
    }
}
