//! Camel race betting game engine
//!
//! This crate provides the core game logic for a stacking camel race,
//! including:
//! - The race track with stacked pieces and player-owned track modifiers
//! - The per-round dice pool
//! - Round cards and game-long champion/loser wagers
//! - Round and final settlement with a per-player coin ledger
//! - Game state machine with full rule enforcement
//!
//! # Architecture
//!
//! The game engine is designed to be platform-agnostic. It can be compiled to:
//! - Native Rust for server-side game hosting
//! - WebAssembly for client-side single-player or local multiplayer
//!
//! # Modules
//!
//! - [`board`]: Track, pieces, stacking, modifiers and movement
//! - [`dice`]: Dice pool for a round
//! - [`wager`]: Round cards and outcome wagers
//! - [`settlement`]: Payout calculation
//! - [`player`]: Player state and coin ledger
//! - [`log`]: Action history
//! - [`game`]: Game state machine
//! - [`bot`]: Computer players

pub mod actions;
pub mod board;
pub mod bot;
pub mod dice;
pub mod game;
pub mod log;
pub mod player;
pub mod settlement;
pub mod wager;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent};
pub use board::{Board, Color, ModifierKind, Piece, PlacementError, PlayerId, TrackModifier};
pub use bot::{Bot, BotDifficulty};
pub use dice::{DicePool, Die};
pub use game::{GameConfig, GameError, GameState, GameStatus, RollOutcome};
pub use log::{ActionKind, ActionLog, ActionRecord, Actor};
pub use player::{CoinEntry, CoinSource, Player};
pub use settlement::{SettlementKind, SettlementRecord};
pub use wager::{OutcomeKind, OutcomeWager, RoundCard, WagerLedger};
