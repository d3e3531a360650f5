//! Game actions that players can take.
//!
//! This module defines all possible actions in the game and the events
//! that result from those actions.

use crate::board::{Color, ModifierKind, PlayerId};
use crate::dice::Die;
use crate::wager::OutcomeKind;
use serde::{Deserialize, Serialize};

/// All possible actions a player can take on their turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    /// Draw a die from the pool and move its piece.
    ///
    /// `die` and `steps` force the outcome and are only accepted when the
    /// game is configured to allow forced rolls.
    RollDice {
        #[serde(default)]
        die: Option<Die>,
        #[serde(default)]
        steps: Option<u8>,
    },

    /// Take the best remaining round card for a racing color
    ClaimRoundCard(Color),

    /// Back a racing color to win or finish last
    ClaimOutcome { color: Color, kind: OutcomeKind },

    /// Place, move, or re-type the player's track modifier
    PlaceModifier { position: u8, kind: ModifierKind },
}

impl GameAction {
    /// A normal random roll
    pub fn roll() -> Self {
        GameAction::RollDice {
            die: None,
            steps: None,
        }
    }

    /// A roll with a chosen die and face
    pub fn forced_roll(die: Die, steps: u8) -> Self {
        GameAction::RollDice {
            die: Some(die),
            steps: Some(steps),
        }
    }
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A die was drawn and rolled
    DiceRolled {
        player: PlayerId,
        die: Die,
        color: Color,
        steps: u8,
    },

    /// A piece moved, carrying the pieces above it
    PieceMoved {
        color: Color,
        from: u8,
        to: u8,
        carried: Vec<Color>,
    },

    /// A moving stack landed on a modifier and its owner was paid
    ModifierTriggered {
        owner: PlayerId,
        position: u8,
        kind: ModifierKind,
    },

    /// A round card was claimed
    RoundCardClaimed {
        player: PlayerId,
        color: Color,
        value: u8,
    },

    /// An outcome wager was placed
    OutcomeWagerPlaced {
        player: PlayerId,
        color: Color,
        kind: OutcomeKind,
        order: u32,
    },

    /// A modifier was put on the track
    ModifierPlaced {
        player: PlayerId,
        position: u8,
        kind: ModifierKind,
        /// Square the player's previous modifier was removed from
        replaced: Option<u8>,
    },

    /// A modifier changed kind in place
    ModifierRetyped {
        player: PlayerId,
        position: u8,
        kind: ModifierKind,
    },

    /// Round cards were paid out
    RoundSettled {
        round: u32,
        first: Color,
        second: Color,
        payouts: Vec<(PlayerId, i32)>,
    },

    /// A new round began with a full dice pool
    RoundStarted { round: u32, first_player: PlayerId },

    /// A piece crossed the finish and outcome wagers were paid out
    GameFinished {
        champion: Color,
        last: Color,
        payouts: Vec<(PlayerId, i32)>,
    },

    /// Turn passed to the next player
    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_without_forced_fields_parses() {
        let action: GameAction = serde_json::from_str(r#"{"RollDice":{}}"#).unwrap();
        assert_eq!(action, GameAction::roll());
    }

    #[test]
    fn test_action_json_shape() {
        let action = GameAction::PlaceModifier {
            position: 7,
            kind: ModifierKind::Decelerate,
        };
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"PlaceModifier":{"position":7,"kind":"Decelerate"}}"#);

        let back: GameAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
