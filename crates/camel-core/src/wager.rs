//! Wager ledger: round cards and outcome wagers.
//!
//! Round cards are claimed greedily per color, highest face value first, and
//! are returned to the pool after each round. Outcome wagers (champion or
//! loser) last for the whole game and are paid by submission order.

use crate::board::{Color, PlayerId};
use serde::{Deserialize, Serialize};

/// Face values of the round cards for each racing color, in claim order
pub const ROUND_CARD_VALUES: [u8; 4] = [5, 3, 2, 2];

/// Champion/loser payouts by submission order; later wagers get the last value
pub const OUTCOME_PAYOUTS: [i32; 4] = [8, 5, 3, 2];

/// Payout for an outcome wager placed `order`-th (1-based) on its color
pub fn outcome_payout(order: u32) -> i32 {
    let index = (order.max(1) as usize - 1).min(OUTCOME_PAYOUTS.len() - 1);
    OUTCOME_PAYOUTS[index]
}

/// A round card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundCard {
    pub color: Color,
    pub value: u8,
    /// Player who claimed the card this round
    pub holder: Option<PlayerId>,
}

/// Which end of the race an outcome wager backs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeKind {
    Champion,
    Loser,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 2] = [OutcomeKind::Champion, OutcomeKind::Loser];

    pub fn name(&self) -> &'static str {
        match self {
            OutcomeKind::Champion => "champion",
            OutcomeKind::Loser => "loser",
        }
    }
}

/// An outcome wager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeWager {
    pub player: PlayerId,
    pub color: Color,
    pub kind: OutcomeKind,
    /// 1-based position among wagers of this kind on this color
    pub order: u32,
}

/// Every wager in the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerLedger {
    pub round_cards: Vec<RoundCard>,
    /// Outcome wagers in submission order
    pub outcome_wagers: Vec<OutcomeWager>,
}

impl WagerLedger {
    pub fn new() -> Self {
        Self {
            round_cards: Self::fresh_round_cards(),
            outcome_wagers: Vec::new(),
        }
    }

    fn fresh_round_cards() -> Vec<RoundCard> {
        Color::RACERS
            .iter()
            .flat_map(|&color| {
                ROUND_CARD_VALUES.iter().map(move |&value| RoundCard {
                    color,
                    value,
                    holder: None,
                })
            })
            .collect()
    }

    /// Highest unclaimed card value for a color
    pub fn top_card(&self, color: Color) -> Option<u8> {
        self.round_cards
            .iter()
            .filter(|c| c.color == color && c.holder.is_none())
            .map(|c| c.value)
            .max()
    }

    /// Number of unclaimed cards for a color
    pub fn cards_left(&self, color: Color) -> usize {
        self.round_cards
            .iter()
            .filter(|c| c.color == color && c.holder.is_none())
            .count()
    }

    /// Claim the highest unclaimed card for a color.
    ///
    /// Returns `None` without changing anything when the color is sold out.
    pub fn claim_round_card(&mut self, player: PlayerId, color: Color) -> Option<RoundCard> {
        let card = self
            .round_cards
            .iter_mut()
            .filter(|c| c.color == color && c.holder.is_none())
            .reduce(|best, c| if c.value > best.value { c } else { best })?;
        card.holder = Some(player);
        Some(*card)
    }

    /// Cards claimed this round, in table order
    pub fn claimed_cards(&self) -> impl Iterator<Item = &RoundCard> {
        self.round_cards.iter().filter(|c| c.holder.is_some())
    }

    /// Put every round card back on the table
    pub fn reset_round_cards(&mut self) {
        self.round_cards = Self::fresh_round_cards();
    }

    /// Whether a player holds any outcome wager on a color
    pub fn has_outcome_wager(&self, player: PlayerId, color: Color) -> bool {
        self.outcome_wagers
            .iter()
            .any(|w| w.player == player && w.color == color)
    }

    /// Record an outcome wager.
    ///
    /// Returns `None` if the player already backs this color either way.
    pub fn place_outcome_wager(
        &mut self,
        player: PlayerId,
        color: Color,
        kind: OutcomeKind,
    ) -> Option<OutcomeWager> {
        if self.has_outcome_wager(player, color) {
            return None;
        }

        let order = self
            .outcome_wagers
            .iter()
            .filter(|w| w.color == color && w.kind == kind)
            .count() as u32
            + 1;
        let wager = OutcomeWager {
            player,
            color,
            kind,
            order,
        };
        self.outcome_wagers.push(wager);
        Some(wager)
    }

    /// Outcome wagers of one kind
    pub fn outcome_wagers_of(&self, kind: OutcomeKind) -> impl Iterator<Item = &OutcomeWager> {
        self.outcome_wagers.iter().filter(move |w| w.kind == kind)
    }
}

impl Default for WagerLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fresh_ledger_has_four_cards_per_racer() {
        let ledger = WagerLedger::new();
        assert_eq!(ledger.round_cards.len(), 20);
        for color in Color::RACERS {
            assert_eq!(ledger.cards_left(color), 4);
            assert_eq!(ledger.top_card(color), Some(5));
        }
        assert_eq!(ledger.cards_left(Color::Black), 0);
    }

    #[test]
    fn test_round_cards_claimed_greedily() {
        let mut ledger = WagerLedger::new();
        let values: Vec<u8> = (0..4)
            .map(|p| ledger.claim_round_card(p, Color::Red).map(|c| c.value))
            .collect::<Option<_>>()
            .unwrap();

        assert_eq!(values, vec![5, 3, 2, 2]);
        assert_eq!(ledger.claim_round_card(4, Color::Red), None);
        assert_eq!(ledger.cards_left(Color::Yellow), 4);
    }

    #[test]
    fn test_reset_returns_cards() {
        let mut ledger = WagerLedger::new();
        ledger.claim_round_card(0, Color::Blue);
        ledger.claim_round_card(1, Color::Blue);
        assert_eq!(ledger.claimed_cards().count(), 2);

        ledger.reset_round_cards();

        assert_eq!(ledger.claimed_cards().count(), 0);
        assert_eq!(ledger.top_card(Color::Blue), Some(5));
    }

    #[test]
    fn test_outcome_order_counts_per_color_and_kind() {
        let mut ledger = WagerLedger::new();

        let a = ledger.place_outcome_wager(0, Color::Blue, OutcomeKind::Champion).unwrap();
        let b = ledger.place_outcome_wager(1, Color::Blue, OutcomeKind::Champion).unwrap();
        let c = ledger.place_outcome_wager(2, Color::Blue, OutcomeKind::Loser).unwrap();
        let d = ledger.place_outcome_wager(2, Color::Red, OutcomeKind::Champion).unwrap();

        assert_eq!((a.order, b.order, c.order, d.order), (1, 2, 1, 1));
    }

    #[test]
    fn test_one_outcome_wager_per_color() {
        let mut ledger = WagerLedger::new();
        ledger.place_outcome_wager(0, Color::Green, OutcomeKind::Champion).unwrap();

        assert_eq!(ledger.place_outcome_wager(0, Color::Green, OutcomeKind::Loser), None);
        assert_eq!(ledger.place_outcome_wager(0, Color::Green, OutcomeKind::Champion), None);
        assert_eq!(ledger.outcome_wagers.len(), 1);
    }

    #[test]
    fn test_outcome_payout_table() {
        assert_eq!(outcome_payout(1), 8);
        assert_eq!(outcome_payout(2), 5);
        assert_eq!(outcome_payout(3), 3);
        assert_eq!(outcome_payout(4), 2);
        assert_eq!(outcome_payout(9), 2);
    }
}
