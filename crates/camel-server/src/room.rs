//! Game room management.

use camel_core::game::{MAX_PLAYERS, MIN_PLAYERS};
use camel_core::{
    Bot, BotDifficulty, Color, GameAction, GameConfig, GameError, GameEvent, GameState,
};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::{PlayerInfo, RoomInfo, RoomStatus, StandingInfo};

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room is full")]
    RoomFull,

    #[error("Player not in room")]
    PlayerNotInRoom,

    #[error("Not the host")]
    NotHost,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Not enough players")]
    NotEnoughPlayers,

    #[error("Not every player is ready")]
    PlayersNotReady,

    #[error("That seat is not a bot")]
    NotABot,

    #[error("Game not started")]
    GameNotStarted,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error(transparent)]
    Game(#[from] GameError),
}

/// A seat in a game room.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: Uuid,
    pub name: String,
    pub ready: bool,
    pub connected: bool,
    /// Difficulty for bot seats; `None` for people
    pub bot: Option<BotDifficulty>,
    /// Index in the game, assigned when the game starts
    pub game_index: Option<u8>,
}

impl RoomPlayer {
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            ready: false,
            connected: true,
            bot: None,
            game_index: None,
        }
    }

    pub fn new_bot(id: Uuid, name: String, difficulty: BotDifficulty) -> Self {
        Self {
            ready: true,
            bot: Some(difficulty),
            ..Self::new(id, name)
        }
    }

    pub fn is_bot(&self) -> bool {
        self.bot.is_some()
    }

    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            ready: self.ready,
            connected: self.connected,
            bot: self.bot,
        }
    }
}

/// A game room that can hold multiple players.
pub struct GameRoom {
    pub id: Uuid,
    pub name: String,
    pub max_players: u8,
    pub host_id: Uuid,
    pub status: RoomStatus,
    pub players: HashMap<Uuid, RoomPlayer>,
    /// Seating order, which becomes turn order
    pub player_order: Vec<Uuid>,
    /// Rules for the game once it starts
    pub game_config: GameConfig,
    /// The game state (once started)
    pub game: Option<GameState>,
}

impl GameRoom {
    pub fn new(
        id: Uuid,
        host_id: Uuid,
        host_name: String,
        max_players: u8,
        game_config: GameConfig,
    ) -> Self {
        let mut players = HashMap::new();
        players.insert(host_id, RoomPlayer::new(host_id, host_name.clone()));

        Self {
            id,
            name: format!("{}'s Race", host_name),
            max_players: max_players.clamp(MIN_PLAYERS as u8, MAX_PLAYERS as u8),
            host_id,
            status: RoomStatus::Waiting,
            players,
            player_order: vec![host_id],
            game_config,
            game: None,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players as usize
    }

    fn has_humans(&self) -> bool {
        self.players.values().any(|p| !p.is_bot())
    }

    fn seat(&mut self, player: RoomPlayer) -> Result<(), RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }

        self.player_order.push(player.id);
        self.players.insert(player.id, player);
        Ok(())
    }

    pub fn add_player(&mut self, player_id: Uuid, name: String) -> Result<(), RoomError> {
        self.seat(RoomPlayer::new(player_id, name))
    }

    /// Seat a bot and return its ID
    pub fn add_bot(&mut self, requester_id: Uuid, difficulty: BotDifficulty) -> Result<Uuid, RoomError> {
        if requester_id != self.host_id {
            return Err(RoomError::NotHost);
        }

        let bot_id = Uuid::new_v4();
        let number = self.players.values().filter(|p| p.is_bot()).count() + 1;
        let name = format!("Bot {} ({:?})", number, difficulty);
        self.seat(RoomPlayer::new_bot(bot_id, name, difficulty))?;
        Ok(bot_id)
    }

    pub fn remove_bot(&mut self, requester_id: Uuid, bot_id: Uuid) -> Result<(), RoomError> {
        if requester_id != self.host_id {
            return Err(RoomError::NotHost);
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        match self.players.get(&bot_id) {
            Some(p) if p.is_bot() => {}
            Some(_) => return Err(RoomError::NotABot),
            None => return Err(RoomError::PlayerNotInRoom),
        }

        self.players.remove(&bot_id);
        self.player_order.retain(|&id| id != bot_id);
        Ok(())
    }

    /// Remove a seat. Returns true when no people are left in the room.
    pub fn remove_player(&mut self, player_id: Uuid) -> Result<bool, RoomError> {
        if !self.players.contains_key(&player_id) {
            return Err(RoomError::PlayerNotInRoom);
        }

        self.players.remove(&player_id);
        self.player_order.retain(|&id| id != player_id);

        // If host left, hand the room to the next person in seating order
        if player_id == self.host_id {
            if let Some(next) = self
                .player_order
                .iter()
                .find(|id| self.players.get(*id).is_some_and(|p| !p.is_bot()))
            {
                self.host_id = *next;
            }
        }

        Ok(!self.has_humans())
    }

    pub fn set_ready(&mut self, player_id: Uuid, ready: bool) -> Result<(), RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(RoomError::PlayerNotInRoom)?;
        player.ready = ready;
        Ok(())
    }

    pub fn set_player_connected(&mut self, player_id: Uuid, connected: bool) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.connected = connected;
        }
    }

    /// True once every person has disconnected and only bots could move
    pub fn is_abandoned(&self) -> bool {
        !self.players.values().any(|p| !p.is_bot() && p.connected)
    }

    pub fn start_game(&mut self, requester_id: Uuid) -> Result<(), RoomError> {
        if requester_id != self.host_id {
            return Err(RoomError::NotHost);
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(RoomError::NotEnoughPlayers);
        }
        if self
            .players
            .values()
            .any(|p| p.id != self.host_id && !p.ready)
        {
            return Err(RoomError::PlayersNotReady);
        }

        let player_names: Vec<String> = self
            .player_order
            .iter()
            .filter_map(|id| self.players.get(id).map(|p| p.name.clone()))
            .collect();
        let game = GameState::with_config(player_names, self.game_config.clone())?;

        // Assign game indices to players
        for (idx, &player_id) in self.player_order.iter().enumerate() {
            if let Some(player) = self.players.get_mut(&player_id) {
                player.game_index = Some(idx as u8);
            }
        }

        self.game = Some(game);
        self.status = RoomStatus::InGame;

        Ok(())
    }

    pub fn apply_action(
        &mut self,
        player_id: Uuid,
        action: serde_json::Value,
    ) -> Result<Vec<GameEvent>, RoomError> {
        let game_index = self
            .players
            .get(&player_id)
            .ok_or(RoomError::PlayerNotInRoom)?
            .game_index
            .ok_or(RoomError::GameNotStarted)?;

        let game = self.game.as_ref().ok_or(RoomError::GameNotStarted)?;
        if game.current_player != game_index {
            return Err(RoomError::NotYourTurn);
        }

        let action: GameAction = serde_json::from_value(action)
            .map_err(|e| RoomError::InvalidAction(e.to_string()))?;

        self.apply_for_seat(game_index, action)
    }

    fn apply_for_seat(
        &mut self,
        game_index: u8,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, RoomError> {
        let game = self.game.as_mut().ok_or(RoomError::GameNotStarted)?;
        let events = game.apply_action(game_index, action)?;

        if game.is_finished() {
            self.status = RoomStatus::Finished;
        }

        Ok(events)
    }

    /// Seat to move, if it belongs to a bot
    pub fn current_bot(&self) -> Option<(u8, BotDifficulty)> {
        if self.status != RoomStatus::InGame {
            return None;
        }
        let index = self.game.as_ref()?.current_player;
        let difficulty = self.player_at(index)?.bot?;
        Some((index, difficulty))
    }

    /// Let the bot to move take its turn. Returns `None` if a person is to move.
    pub fn play_bot_turn(&mut self) -> Option<Result<Vec<GameEvent>, RoomError>> {
        let (index, difficulty) = self.current_bot()?;
        let action = Bot::new(index, difficulty).choose_action(self.game.as_ref()?)?;
        Some(self.apply_for_seat(index, action))
    }

    pub fn player_at(&self, game_index: u8) -> Option<&RoomPlayer> {
        let id = self.player_order.get(game_index as usize)?;
        self.players.get(id)
    }

    pub fn get_game_state(&self) -> Option<serde_json::Value> {
        self.game.as_ref().and_then(|g| serde_json::to_value(g).ok())
    }

    pub fn get_valid_actions(&self) -> Option<(u8, Vec<serde_json::Value>)> {
        self.game.as_ref().map(|g| {
            let actions = g
                .valid_actions(g.current_player)
                .into_iter()
                .filter_map(|a| serde_json::to_value(a).ok())
                .collect();
            (g.current_player, actions)
        })
    }

    pub fn get_current_player(&self) -> Option<(u8, String)> {
        let index = self.game.as_ref()?.current_player;
        Some((index, self.player_at(index)?.name.clone()))
    }

    /// Champion, last piece and final balances once the race is over
    pub fn get_result(&self) -> Option<(Color, Color, Vec<StandingInfo>)> {
        let game = self.game.as_ref().filter(|g| g.is_finished())?;
        let ranking = game.ranking();
        let champion = *ranking.first()?;
        let last = *ranking.last()?;
        let standings = game
            .standings()
            .into_iter()
            .map(|(index, coins)| StandingInfo {
                player_index: index,
                name: game
                    .get_player(index)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                coins,
            })
            .collect();
        Some((champion, last, standings))
    }

    pub fn to_info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            name: self.name.clone(),
            players: self
                .player_order
                .iter()
                .filter_map(|id| self.players.get(id).map(|p| p.to_info()))
                .collect(),
            max_players: self.max_players,
            host_id: self.host_id,
            status: self.status,
        }
    }
}
