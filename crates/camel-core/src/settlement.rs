//! Settlement calculator for round and game end.
//!
//! Settlement reads the race ranking and the wager ledger and produces coin
//! changes. It never touches players directly; the game applies each
//! [`Payout`] to the matching player's coin ledger.

use crate::board::{Color, PlayerId};
use crate::player::{CoinSource, Player};
use crate::wager::{outcome_payout, OutcomeKind, WagerLedger};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coins won by a round card on the second-placed piece
pub const SECOND_PLACE_PAYOUT: i32 = 1;

/// Coins lost per losing round card or mistaken outcome wager
pub const WRONG_BET_PENALTY: i32 = 1;

/// A coin change owed to a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub player: PlayerId,
    pub amount: i32,
    pub source: CoinSource,
    pub description: String,
}

/// Which settlement produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementKind {
    Round,
    Final,
}

/// Immutable summary of a settlement, one line per coin change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub kind: SettlementKind,
    pub round: u32,
    pub details: Vec<String>,
    /// Action log sequence number at the time of settlement
    pub timestamp: u64,
}

/// Round card results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSettlement {
    pub round: u32,
    pub first: Color,
    pub second: Color,
    pub payouts: Vec<Payout>,
}

/// Outcome wager results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalSettlement {
    pub champion: Color,
    pub last: Color,
    pub payouts: Vec<Payout>,
}

/// Score every claimed round card against the current ranking.
///
/// A card on the leader pays its face value, a card on the runner-up pays 1,
/// any other card costs 1.
pub fn settle_round(ranking: &[Color], ledger: &WagerLedger, round: u32) -> RoundSettlement {
    let first = ranking.first().copied().unwrap_or(Color::Red);
    let second = ranking.get(1).copied().unwrap_or(first);

    let payouts = ledger
        .claimed_cards()
        .filter_map(|card| {
            let player = card.holder?;
            let amount = if card.color == first {
                card.value as i32
            } else if card.color == second {
                SECOND_PLACE_PAYOUT
            } else {
                -WRONG_BET_PENALTY
            };
            Some(Payout {
                player,
                amount,
                source: CoinSource::RoundBet,
                description: format!(
                    "round {} {} card ({}) {} {}",
                    round,
                    card.color.name(),
                    card.value,
                    if amount > 0 { "won" } else { "lost" },
                    amount.abs()
                ),
            })
        })
        .collect();

    RoundSettlement {
        round,
        first,
        second,
        payouts,
    }
}

/// Score outcome wagers against the final ranking.
///
/// Correct wagers pay 8/5/3/2 by submission order. Each player loses 1 coin
/// per mistaken wager, booked as one entry per wager kind.
pub fn settle_final(ranking: &[Color], ledger: &WagerLedger) -> FinalSettlement {
    let champion = ranking.first().copied().unwrap_or(Color::Red);
    let last = ranking.last().copied().unwrap_or(champion);

    let mut payouts = Vec::new();
    for (kind, target, source) in [
        (OutcomeKind::Champion, champion, CoinSource::ChampionBet),
        (OutcomeKind::Loser, last, CoinSource::LoserBet),
    ] {
        for wager in ledger.outcome_wagers_of(kind).filter(|w| w.color == target) {
            let amount = outcome_payout(wager.order);
            payouts.push(Payout {
                player: wager.player,
                amount,
                source,
                description: format!(
                    "{} wager on {} won {} (wager #{})",
                    kind.name(),
                    target.name(),
                    amount,
                    wager.order
                ),
            });
        }
    }

    for (kind, target, source) in [
        (OutcomeKind::Champion, champion, CoinSource::ChampionBet),
        (OutcomeKind::Loser, last, CoinSource::LoserBet),
    ] {
        let mut misses: BTreeMap<PlayerId, i32> = BTreeMap::new();
        for wager in ledger.outcome_wagers_of(kind).filter(|w| w.color != target) {
            *misses.entry(wager.player).or_default() += 1;
        }
        for (player, count) in misses {
            let amount = -WRONG_BET_PENALTY * count;
            payouts.push(Payout {
                player,
                amount,
                source,
                description: format!(
                    "{} mistaken {} wager(s) lost {}",
                    count,
                    kind.name(),
                    amount.abs()
                ),
            });
        }
    }

    FinalSettlement {
        champion,
        last,
        payouts,
    }
}

/// Render payouts as record lines, prefixed with the player's name
pub fn describe_payouts(payouts: &[Payout], players: &[Player]) -> Vec<String> {
    payouts
        .iter()
        .map(|payout| {
            let name = players
                .get(payout.player as usize)
                .map(|p| p.name.as_str())
                .unwrap_or("unknown");
            format!("{}: {}", name, payout.description)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use pretty_assertions::assert_eq;

    fn amounts(payouts: &[Payout]) -> Vec<(PlayerId, i32)> {
        payouts.iter().map(|p| (p.player, p.amount)).collect()
    }

    #[test]
    fn test_round_leader_runner_up_and_rest() {
        let board = Board::from_layout(&[
            (Color::Red, 10),
            (Color::Yellow, 9),
            (Color::Blue, 5),
            (Color::Purple, 4),
            (Color::Green, 3),
        ]);
        let mut ledger = WagerLedger::new();
        ledger.claim_round_card(0, Color::Red);
        ledger.claim_round_card(1, Color::Yellow);
        ledger.claim_round_card(2, Color::Blue);
        ledger.claim_round_card(2, Color::Red);

        let result = settle_round(&board.ranking(), &ledger, 1);

        assert_eq!(result.first, Color::Red);
        assert_eq!(result.second, Color::Yellow);
        assert_eq!(amounts(&result.payouts), vec![(0, 5), (2, 3), (1, 1), (2, -1)]);
        assert!(result.payouts.iter().all(|p| p.source == CoinSource::RoundBet));
    }

    #[test]
    fn test_round_with_no_cards_pays_nothing() {
        let board = Board::from_layout(&[]);
        let result = settle_round(&board.ranking(), &WagerLedger::new(), 3);
        assert!(result.payouts.is_empty());
    }

    #[test]
    fn test_final_pays_by_submission_order() {
        let mut ledger = WagerLedger::new();
        ledger.place_outcome_wager(0, Color::Blue, OutcomeKind::Champion);
        ledger.place_outcome_wager(1, Color::Blue, OutcomeKind::Champion);
        ledger.place_outcome_wager(2, Color::Blue, OutcomeKind::Champion);
        ledger.place_outcome_wager(3, Color::Blue, OutcomeKind::Champion);
        ledger.place_outcome_wager(4, Color::Blue, OutcomeKind::Champion);

        let ranking = [Color::Blue, Color::Red, Color::Yellow, Color::Purple, Color::Green];
        let result = settle_final(&ranking, &ledger);

        assert_eq!(result.champion, Color::Blue);
        assert_eq!(result.last, Color::Green);
        assert_eq!(
            amounts(&result.payouts),
            vec![(0, 8), (1, 5), (2, 3), (3, 2), (4, 2)]
        );
    }

    #[test]
    fn test_final_penalties_are_summed_per_kind() {
        let mut ledger = WagerLedger::new();
        ledger.place_outcome_wager(0, Color::Red, OutcomeKind::Champion);
        ledger.place_outcome_wager(0, Color::Yellow, OutcomeKind::Champion);
        ledger.place_outcome_wager(0, Color::Purple, OutcomeKind::Champion);
        ledger.place_outcome_wager(0, Color::Green, OutcomeKind::Loser);
        ledger.place_outcome_wager(0, Color::Blue, OutcomeKind::Loser);
        ledger.place_outcome_wager(1, Color::Green, OutcomeKind::Loser);

        let ranking = [Color::Red, Color::Blue, Color::Yellow, Color::Purple, Color::Green];
        let result = settle_final(&ranking, &ledger);

        assert_eq!(
            amounts(&result.payouts),
            vec![(0, 8), (0, 8), (1, 5), (0, -2), (0, -1)]
        );
        let sources: Vec<CoinSource> = result.payouts.iter().map(|p| p.source).collect();
        assert_eq!(
            sources,
            vec![
                CoinSource::ChampionBet,
                CoinSource::LoserBet,
                CoinSource::LoserBet,
                CoinSource::ChampionBet,
                CoinSource::LoserBet
            ]
        );
    }

    #[test]
    fn test_describe_uses_player_names() {
        let players = vec![Player::new(0, "Alice".into(), 0)];
        let payouts = vec![Payout {
            player: 0,
            amount: 5,
            source: CoinSource::RoundBet,
            description: "round 1 red card (5) won 5".into(),
        }];
        assert_eq!(
            describe_payouts(&payouts, &players),
            vec!["Alice: round 1 red card (5) won 5".to_string()]
        );
    }
}
