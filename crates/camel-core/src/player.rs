//! Player state and coin bookkeeping.
//!
//! This module contains:
//! - Player struct with coins, held round cards, and outcome wagers
//! - The append-only coin ledger that explains every balance change

use crate::board::{Color, PlayerId};
use crate::wager::RoundCard;
use serde::{Deserialize, Serialize};

/// Why a player's balance changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinSource {
    /// Starting balance
    Initial,
    /// Reward for rolling a die
    DiceRoll,
    /// Round card payout or penalty
    RoundBet,
    /// Champion wager payout or penalty
    ChampionBet,
    /// Loser wager payout or penalty
    LoserBet,
    /// A piece landed on the player's modifier
    TileReward,
}

/// One line of a player's coin ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinEntry {
    pub source: CoinSource,
    pub amount: i32,
    pub description: String,
    /// Round in which the change happened (0 for the starting balance)
    pub round: u32,
}

/// A seated player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Running sum of the coin ledger
    pub coins: i32,
    /// Round cards claimed this round
    pub round_cards: Vec<RoundCard>,
    /// Colors this player backed to win, in submission order
    pub champion_colors: Vec<Color>,
    /// Colors this player backed to finish last, in submission order
    pub loser_colors: Vec<Color>,
    pub coin_ledger: Vec<CoinEntry>,
}

impl Player {
    /// Create a new player with a starting balance
    pub fn new(id: PlayerId, name: String, starting_coins: i32) -> Self {
        let mut player = Self {
            id,
            name,
            coins: 0,
            round_cards: Vec::new(),
            champion_colors: Vec::new(),
            loser_colors: Vec::new(),
            coin_ledger: Vec::new(),
        };
        player.credit(
            CoinSource::Initial,
            starting_coins,
            "starting coins".to_string(),
            0,
        );
        player
    }

    /// Apply a balance change and record it
    pub fn credit(&mut self, source: CoinSource, amount: i32, description: String, round: u32) {
        self.coins += amount;
        self.coin_ledger.push(CoinEntry {
            source,
            amount,
            description,
            round,
        });
    }

    /// Whether the player already holds an outcome wager on a color
    pub fn has_outcome_wager(&self, color: Color) -> bool {
        self.champion_colors.contains(&color) || self.loser_colors.contains(&color)
    }

    /// Sum of ledger entries from one source
    pub fn earned_from(&self, source: CoinSource) -> i32 {
        self.coin_ledger
            .iter()
            .filter(|e| e.source == source)
            .map(|e| e.amount)
            .sum()
    }

    /// Whether the balance equals the ledger total
    pub fn ledger_balances(&self) -> bool {
        self.coin_ledger.iter().map(|e| e.amount).sum::<i32>() == self.coins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_records_starting_coins() {
        let player = Player::new(0, "Alice".into(), 3);
        assert_eq!(player.coins, 3);
        assert_eq!(player.coin_ledger.len(), 1);
        assert_eq!(player.coin_ledger[0].source, CoinSource::Initial);
        assert!(player.ledger_balances());
    }

    #[test]
    fn test_credit_appends() {
        let mut player = Player::new(1, "Bob".into(), 0);
        player.credit(CoinSource::DiceRoll, 1, "rolled".into(), 1);
        player.credit(CoinSource::RoundBet, -1, "lost".into(), 1);
        player.credit(CoinSource::DiceRoll, 1, "rolled".into(), 2);

        assert_eq!(player.coins, 1);
        assert_eq!(player.coin_ledger.len(), 4);
        assert_eq!(player.earned_from(CoinSource::DiceRoll), 2);
        assert!(player.ledger_balances());
    }

    #[test]
    fn test_outcome_wager_lookup() {
        let mut player = Player::new(0, "Alice".into(), 0);
        player.champion_colors.push(Color::Green);
        assert!(player.has_outcome_wager(Color::Green));
        assert!(!player.has_outcome_wager(Color::Red));
    }
}
