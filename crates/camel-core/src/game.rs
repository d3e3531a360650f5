//! Core game state machine.
//!
//! This module contains the main `GameState` struct: turn order, the roll /
//! bet / modifier actions, and the round and game transitions that trigger
//! settlement.

use crate::actions::{GameAction, GameEvent};
use crate::board::{Board, Color, ModifierKind, MoveOutcome, Placement, PlacementError, PlayerId};
use crate::dice::{roll_steps, DicePool, Die, MAX_STEPS};
use crate::log::{ActionKind, ActionLog, Actor};
use crate::player::{CoinSource, Player};
use crate::settlement::{
    self, describe_payouts, Payout, SettlementKind, SettlementRecord,
};
use crate::wager::{OutcomeKind, WagerLedger};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Fewest players at the table
pub const MIN_PLAYERS: usize = 3;

/// Most players at the table
pub const MAX_PLAYERS: usize = 8;

/// Coins for rolling a die
const ROLL_REWARD: i32 = 1;

/// Coins for a modifier owner when a stack lands on it
const TILE_REWARD: i32 = 1;

/// Game status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    /// A piece reached the finish; no further actions are accepted
    Ended,
}

/// Table rules that vary between deployments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Balance every player starts with
    pub starting_coins: i32,
    /// Accept rolls that name their die and face (testing and debugging)
    pub allow_forced_rolls: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_coins: 0,
            allow_forced_rolls: false,
        }
    }
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Unknown player")]
    UnknownPlayer,

    #[error("Game is over")]
    GameOver,

    #[error("No {} round cards left", .0.name())]
    NoCardsLeft(Color),

    #[error("Illegal modifier placement: {0}")]
    IllegalPlacement(#[from] PlacementError),

    #[error("Already holding an outcome wager on {}", .0.name())]
    DuplicateWager(Color),

    #[error("Invalid target for this action")]
    InvalidTarget,

    #[error("Forced rolls are disabled")]
    ForcedRollDisabled,

    #[error("A game needs 3 to 8 players, got {0}")]
    InvalidPlayerCount(usize),
}

/// The most recent roll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    pub player: PlayerId,
    pub die: Die,
    pub steps: u8,
    pub movement: MoveOutcome,
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// The race track
    pub board: Board,
    /// Dice left this round
    pub dice: DicePool,
    /// Round cards and outcome wagers
    pub wagers: WagerLedger,
    /// All players in seating order
    pub players: Vec<Player>,
    /// Seat to act
    pub current_player: PlayerId,
    pub status: GameStatus,
    /// Round number (starts at 1)
    pub round: u32,
    /// Last roll, for display
    pub last_roll: Option<RollOutcome>,
    /// History of every action and settlement
    pub log: ActionLog,
    /// Round and final settlement records, oldest first
    pub settlements: Vec<SettlementRecord>,
    pub config: GameConfig,
}

impl GameState {
    /// Create a new game with default rules and a random starting layout
    pub fn new(player_names: Vec<String>) -> Result<Self, GameError> {
        Self::with_config(player_names, GameConfig::default())
    }

    /// Create a new game with the given rules and a random starting layout
    pub fn with_config(player_names: Vec<String>, config: GameConfig) -> Result<Self, GameError> {
        Self::with_rng(player_names, config, &mut rand::thread_rng())
    }

    /// Create a new game, drawing the starting layout from `rng`
    pub fn with_rng<R: Rng>(
        player_names: Vec<String>,
        config: GameConfig,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        let board = Board::random(rng);
        Self::with_board(player_names, config, board)
    }

    /// Create a new game on a prepared board
    pub fn with_board(
        player_names: Vec<String>,
        config: GameConfig,
        board: Board,
    ) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_names.len()) {
            return Err(GameError::InvalidPlayerCount(player_names.len()));
        }

        let players: Vec<Player> = player_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Player::new(i as PlayerId, name, config.starting_coins))
            .collect();

        Ok(Self {
            board,
            dice: DicePool::new(),
            wagers: WagerLedger::new(),
            players,
            current_player: 0,
            status: GameStatus::Playing,
            round: 1,
            last_roll: None,
            log: ActionLog::new(),
            settlements: Vec::new(),
            config,
        })
    }

    /// Get the number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Get a player by ID
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    fn get_player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id as usize)
    }

    fn player_name(&self, id: PlayerId) -> String {
        self.get_player(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("Player {}", id + 1))
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Ended
    }

    /// Racing colors from leader to last
    pub fn ranking(&self) -> Vec<Color> {
        self.board.ranking()
    }

    /// Players ordered by balance, richest first (seating order breaks ties)
    pub fn standings(&self) -> Vec<(PlayerId, i32)> {
        let mut standings: Vec<(PlayerId, i32)> =
            self.players.iter().map(|p| (p.id, p.coins)).collect();
        standings.sort_by(|a, b| b.1.cmp(&a.1));
        standings
    }

    /// Get all currently valid actions for a player
    pub fn valid_actions(&self, player: PlayerId) -> Vec<GameAction> {
        let mut actions = Vec::new();

        if self.is_finished() || player != self.current_player {
            return actions;
        }

        actions.push(GameAction::roll());

        for color in Color::RACERS {
            if self.wagers.cards_left(color) > 0 {
                actions.push(GameAction::ClaimRoundCard(color));
            }
        }

        for color in Color::RACERS {
            if !self.wagers.has_outcome_wager(player, color) {
                for kind in OutcomeKind::ALL {
                    actions.push(GameAction::ClaimOutcome { color, kind });
                }
            }
        }

        for position in 2..crate::board::FINISH_POSITION {
            if self.board.check_modifier_placement(player, position).is_ok() {
                for kind in ModifierKind::ALL {
                    actions.push(GameAction::PlaceModifier { position, kind });
                }
            }
        }

        actions
    }

    /// Apply an action to the game state
    pub fn apply_action(
        &mut self,
        player: PlayerId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.apply_action_with_rng(player, action, &mut rand::thread_rng())
    }

    /// Apply an action, drawing dice from `rng`
    pub fn apply_action_with_rng<R: Rng>(
        &mut self,
        player: PlayerId,
        action: GameAction,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        match action {
            GameAction::RollDice { die, steps } => self.roll_next(player, die, steps, rng),
            GameAction::ClaimRoundCard(color) => self.claim_round_card(player, color),
            GameAction::ClaimOutcome { color, kind } => {
                self.claim_outcome_wager(player, color, kind)
            }
            GameAction::PlaceModifier { position, kind } => {
                self.place_modifier(player, position, kind)
            }
        }
    }

    // ==================== Turn Actions ====================

    /// Roll the next die.
    ///
    /// If the round's dice are already spent the round is settled instead and
    /// no die is rolled (`last_roll` is cleared).
    pub fn roll_next<R: Rng>(
        &mut self,
        player: PlayerId,
        forced_die: Option<Die>,
        forced_steps: Option<u8>,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.check_turn(player)?;

        if (forced_die.is_some() || forced_steps.is_some()) && !self.config.allow_forced_rolls {
            return Err(GameError::ForcedRollDisabled);
        }
        if let Some(steps) = forced_steps {
            if !(1..=MAX_STEPS).contains(&steps) {
                return Err(GameError::InvalidTarget);
            }
        }

        let mut events = Vec::new();

        // A spent or empty pool closes the round instead of rolling
        let Some(die) = self.dice.draw(forced_die, rng) else {
            self.last_roll = None;
            self.settle_round(&mut events);
            self.start_next_round(&mut events);
            return Ok(events);
        };
        let steps = forced_steps.unwrap_or_else(|| roll_steps(rng));
        let color = die.resolve(rng);
        let round = self.round;

        if let Some(p) = self.get_player_mut(player) {
            p.credit(
                CoinSource::DiceRoll,
                ROLL_REWARD,
                format!("rolled the {} die", die.name()),
                round,
            );
        }

        let movement = self.board.resolve_move(color, steps);
        debug!(
            round,
            player,
            color = color.name(),
            steps,
            from = movement.from,
            to = movement.to,
            "piece moved"
        );

        events.push(GameEvent::DiceRolled {
            player,
            die,
            color,
            steps,
        });
        events.push(GameEvent::PieceMoved {
            color,
            from: movement.from,
            to: movement.to,
            carried: movement.carried.clone(),
        });

        let mut description = format!(
            "{} rolled the {} die: {} moves {} from {} to {}",
            self.player_name(player),
            die.name(),
            color.name(),
            steps,
            movement.from,
            movement.to
        );

        if let Some(tile) = movement.tile {
            let owner_name = self.player_name(tile.owner);
            if let Some(owner) = self.get_player_mut(tile.owner) {
                owner.credit(
                    CoinSource::TileReward,
                    TILE_REWARD,
                    format!("{} modifier on square {} triggered", tile.kind.name(), tile.position),
                    round,
                );
            }
            events.push(GameEvent::ModifierTriggered {
                owner: tile.owner,
                position: tile.position,
                kind: tile.kind,
            });
            description.push_str(&format!(
                ", triggering {}'s {} modifier on square {} (+{} coin)",
                owner_name,
                tile.kind.name(),
                tile.position,
                TILE_REWARD
            ));
        }

        self.log
            .append(round, Actor::Player(player), ActionKind::RollDice, description);

        let finished = movement.finished;
        self.last_roll = Some(RollOutcome {
            player,
            die,
            steps,
            movement,
        });

        if finished {
            if self.dice.is_round_over() {
                self.settle_round(&mut events);
            }
            self.settle_final(&mut events);
        } else if self.dice.is_round_over() {
            self.settle_round(&mut events);
            self.start_next_round(&mut events);
        } else {
            self.advance_turn(player, &mut events);
        }

        Ok(events)
    }

    /// Take the best remaining round card for a racing color
    pub fn claim_round_card(
        &mut self,
        player: PlayerId,
        color: Color,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.check_turn(player)?;
        if color.is_reverse() {
            return Err(GameError::InvalidTarget);
        }

        let card = self
            .wagers
            .claim_round_card(player, color)
            .ok_or(GameError::NoCardsLeft(color))?;

        let name = self.player_name(player);
        if let Some(p) = self.get_player_mut(player) {
            p.round_cards.push(card);
        }

        self.log.append(
            self.round,
            Actor::Player(player),
            ActionKind::PlaceBet,
            format!(
                "{} took the {} round card worth {}",
                name,
                color.name(),
                card.value
            ),
        );

        let mut events = vec![GameEvent::RoundCardClaimed {
            player,
            color,
            value: card.value,
        }];
        self.advance_turn(player, &mut events);
        Ok(events)
    }

    /// Back a racing color to win or to finish last
    pub fn claim_outcome_wager(
        &mut self,
        player: PlayerId,
        color: Color,
        kind: OutcomeKind,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.check_turn(player)?;
        if color.is_reverse() {
            return Err(GameError::InvalidTarget);
        }

        let already_held = self
            .get_player(player)
            .is_some_and(|p| p.has_outcome_wager(color));
        if already_held {
            return Err(GameError::DuplicateWager(color));
        }

        let wager = self
            .wagers
            .place_outcome_wager(player, color, kind)
            .ok_or(GameError::DuplicateWager(color))?;

        let name = self.player_name(player);
        if let Some(p) = self.get_player_mut(player) {
            match kind {
                OutcomeKind::Champion => p.champion_colors.push(color),
                OutcomeKind::Loser => p.loser_colors.push(color),
            }
        }

        // The log is shown to everyone, so it leaves the color out.
        self.log.append(
            self.round,
            Actor::Player(player),
            ActionKind::PlaceBet,
            format!("{} placed a {} wager", name, kind.name()),
        );

        let mut events = vec![GameEvent::OutcomeWagerPlaced {
            player,
            color,
            kind,
            order: wager.order,
        }];
        self.advance_turn(player, &mut events);
        Ok(events)
    }

    /// Place, move, or re-type the player's modifier
    pub fn place_modifier(
        &mut self,
        player: PlayerId,
        position: u8,
        kind: ModifierKind,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.check_turn(player)?;

        let placement = self.board.place_modifier(player, position, kind)?;
        let name = self.player_name(player);

        let (event, description) = match placement {
            Placement::Retype => (
                GameEvent::ModifierRetyped {
                    player,
                    position,
                    kind,
                },
                format!(
                    "{} turned the modifier on square {} to {}",
                    name,
                    position,
                    kind.name()
                ),
            ),
            Placement::Create { replaces } => (
                GameEvent::ModifierPlaced {
                    player,
                    position,
                    kind,
                    replaced: replaces,
                },
                format!(
                    "{} placed a {} modifier on square {}",
                    name,
                    kind.name(),
                    position
                ),
            ),
        };

        self.log.append(
            self.round,
            Actor::Player(player),
            ActionKind::PlaceModifier,
            description,
        );

        let mut events = vec![event];
        self.advance_turn(player, &mut events);
        Ok(events)
    }

    // ==================== Helper Methods ====================

    fn check_turn(&self, player: PlayerId) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }
        if self.get_player(player).is_none() {
            return Err(GameError::UnknownPlayer);
        }
        if player != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        Ok(())
    }

    fn advance_turn(&mut self, player: PlayerId, events: &mut Vec<GameEvent>) {
        let next_player = (self.current_player + 1) % self.player_count() as PlayerId;
        self.current_player = next_player;
        events.push(GameEvent::TurnEnded {
            player,
            next_player,
        });
    }

    fn apply_payouts(&mut self, payouts: &[Payout]) {
        let round = self.round;
        for payout in payouts {
            if let Some(p) = self.get_player_mut(payout.player) {
                p.credit(payout.source, payout.amount, payout.description.clone(), round);
            }
        }
    }

    /// Pay out round cards and put them back on the table
    fn settle_round(&mut self, events: &mut Vec<GameEvent>) {
        let result = settlement::settle_round(&self.ranking(), &self.wagers, self.round);
        self.apply_payouts(&result.payouts);

        let details = describe_payouts(&result.payouts, &self.players);
        self.log.append(
            self.round,
            Actor::System,
            ActionKind::RoundEnd,
            format!(
                "round {} ended: {} first, {} second",
                self.round,
                result.first.name(),
                result.second.name()
            ),
        );
        for line in &details {
            self.log
                .append(self.round, Actor::System, ActionKind::RoundEnd, line.clone());
        }

        self.settlements.push(SettlementRecord {
            kind: SettlementKind::Round,
            round: self.round,
            details,
            timestamp: self.log.last_seq(),
        });

        self.wagers.reset_round_cards();
        for player in &mut self.players {
            player.round_cards.clear();
        }

        info!(
            round = self.round,
            first = result.first.name(),
            second = result.second.name(),
            payouts = result.payouts.len(),
            "round settled"
        );

        events.push(GameEvent::RoundSettled {
            round: self.round,
            first: result.first,
            second: result.second,
            payouts: result.payouts.iter().map(|p| (p.player, p.amount)).collect(),
        });
    }

    fn start_next_round(&mut self, events: &mut Vec<GameEvent>) {
        self.dice.reset();
        self.round += 1;
        self.current_player = 0;
        events.push(GameEvent::RoundStarted {
            round: self.round,
            first_player: 0,
        });
    }

    /// Pay out outcome wagers and end the game
    fn settle_final(&mut self, events: &mut Vec<GameEvent>) {
        let result = settlement::settle_final(&self.ranking(), &self.wagers);
        self.apply_payouts(&result.payouts);

        let headline = format!(
            "game over: {} wins, {} finishes last",
            result.champion.name(),
            result.last.name()
        );
        let mut details = vec![headline.clone()];
        details.extend(describe_payouts(&result.payouts, &self.players));

        for line in &details {
            self.log
                .append(self.round, Actor::System, ActionKind::GameEnd, line.clone());
        }

        self.settlements.push(SettlementRecord {
            kind: SettlementKind::Final,
            round: self.round,
            details,
            timestamp: self.log.last_seq(),
        });
        self.status = GameStatus::Ended;

        info!(
            round = self.round,
            champion = result.champion.name(),
            last = result.last.name(),
            "game finished"
        );

        events.push(GameEvent::GameFinished {
            champion: result.champion,
            last: result.last,
            payouts: result.payouts.iter().map(|p| (p.player, p.amount)).collect(),
        });
    }
}
