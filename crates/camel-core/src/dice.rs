//! Dice pool for a betting round.
//!
//! Each round starts with one die per racing color plus a gray die for the
//! reverse runners. A roll draws one die from the pool. The round ends once
//! [`ROUND_DICE_LIMIT`] dice have been drawn; the last die is never rolled.

use crate::board::Color;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of dice drawn before a round is settled
pub const ROUND_DICE_LIMIT: usize = 5;

/// Highest face on a die
pub const MAX_STEPS: u8 = 3;

/// Dice in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Die {
    Red,
    Yellow,
    Blue,
    Purple,
    Green,
    /// Moves one of the reverse runners, chosen when rolled
    Gray,
}

impl Die {
    /// The full pool, in seating order
    pub const ALL: [Die; 6] = [
        Die::Red,
        Die::Yellow,
        Die::Blue,
        Die::Purple,
        Die::Green,
        Die::Gray,
    ];

    /// The piece this die moves, or `None` for the gray die
    pub fn piece(&self) -> Option<Color> {
        match self {
            Die::Red => Some(Color::Red),
            Die::Yellow => Some(Color::Yellow),
            Die::Blue => Some(Color::Blue),
            Die::Purple => Some(Color::Purple),
            Die::Green => Some(Color::Green),
            Die::Gray => None,
        }
    }

    /// Resolve the die to a piece, picking a reverse runner for the gray die
    pub fn resolve<R: Rng>(&self, rng: &mut R) -> Color {
        match self.piece() {
            Some(color) => color,
            None if rng.gen_bool(0.5) => Color::Black,
            None => Color::White,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Die::Red => "red",
            Die::Yellow => "yellow",
            Die::Blue => "blue",
            Die::Purple => "purple",
            Die::Green => "green",
            Die::Gray => "gray",
        }
    }
}

/// Dice still to be rolled this round, and dice already rolled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DicePool {
    pub available: Vec<Die>,
    pub used: Vec<Die>,
}

impl DicePool {
    /// A full pool
    pub fn new() -> Self {
        Self {
            available: Die::ALL.to_vec(),
            used: Vec::new(),
        }
    }

    /// Whether the round's dice are spent
    pub fn is_round_over(&self) -> bool {
        self.used.len() >= ROUND_DICE_LIMIT
    }

    /// Draw a die.
    ///
    /// A forced die is honored only while it is still available; otherwise a
    /// die is picked uniformly from the pool. Returns `None` once the round's
    /// dice are spent.
    pub fn draw<R: Rng>(&mut self, forced: Option<Die>, rng: &mut R) -> Option<Die> {
        if self.is_round_over() {
            return None;
        }

        let die = match forced.filter(|d| self.available.contains(d)) {
            Some(die) => die,
            None => *self.available.choose(rng)?,
        };

        self.available.retain(|&d| d != die);
        self.used.push(die);
        Some(die)
    }

    /// Return every die to the pool
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for DicePool {
    fn default() -> Self {
        Self::new()
    }
}

/// Roll a die face
pub fn roll_steps<R: Rng>(rng: &mut R) -> u8 {
    rng.gen_range(1..=MAX_STEPS)
}
