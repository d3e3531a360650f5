//! Property tests: rule invariants hold over arbitrary action sequences.

use camel_core::board::{FINISH_POSITION, TRACK_START};
use camel_core::wager::ROUND_CARD_VALUES;
use camel_core::*;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Turn three raw bytes into an action, including some that must be rejected
fn decode(op: u8, a: u8, b: u8) -> GameAction {
    let color = Color::ALL[a as usize % Color::ALL.len()];
    match op % 4 {
        0 => GameAction::roll(),
        1 => GameAction::ClaimRoundCard(color),
        2 => GameAction::ClaimOutcome {
            color,
            kind: OutcomeKind::ALL[b as usize % 2],
        },
        _ => GameAction::PlaceModifier {
            position: b % (FINISH_POSITION + 2),
            kind: ModifierKind::ALL[a as usize % 2],
        },
    }
}

fn check_invariants(game: &GameState) -> Result<(), TestCaseError> {
    prop_assert!(game.board.stacks_are_dense());

    for piece in &game.board.pieces {
        prop_assert!((TRACK_START..=FINISH_POSITION).contains(&piece.position));
    }

    for player in &game.players {
        prop_assert!(player.ledger_balances());
        for color in &player.champion_colors {
            prop_assert!(!player.loser_colors.contains(color));
            prop_assert_eq!(player.champion_colors.iter().filter(|c| *c == color).count(), 1);
        }
        for color in &player.loser_colors {
            prop_assert_eq!(player.loser_colors.iter().filter(|c| *c == color).count(), 1);
        }
    }

    // Claimed cards are always the most valuable ones of their color
    for color in Color::RACERS {
        let cards = game.wagers.round_cards.iter().filter(|c| c.color == color);
        let lowest_claimed = cards.clone().filter(|c| c.holder.is_some()).map(|c| c.value).min();
        let highest_open = cards.filter(|c| c.holder.is_none()).map(|c| c.value).max();
        if let (Some(claimed), Some(open)) = (lowest_claimed, highest_open) {
            prop_assert!(claimed >= open);
        }
    }

    let mut positions: Vec<u8> = game.board.modifiers.iter().map(|m| m.position).collect();
    positions.sort_unstable();
    prop_assert!(positions.windows(2).all(|w| w[1] - w[0] > 1));

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_play_keeps_invariants(
        seed in any::<u64>(),
        players in 3usize..=8,
        ops in prop::collection::vec((any::<u8>(), any::<u8>(), any::<u8>()), 1..300),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let names = (0..players).map(|i| format!("P{}", i)).collect();
        let mut game = GameState::with_rng(names, GameConfig::default(), &mut rng).unwrap();
        check_invariants(&game)?;

        for (op, a, b) in ops {
            if game.is_finished() {
                break;
            }
            let player = game.current_player;
            let before = game.clone();
            match game.apply_action_with_rng(player, decode(op, a, b), &mut rng) {
                Ok(_) => check_invariants(&game)?,
                Err(_) => prop_assert_eq!(&game, &before),
            }
        }
    }

    #[test]
    fn moves_keep_stacks_dense(
        layout in prop::collection::vec((0usize..7, 1u8..=15), 0..7),
        moves in prop::collection::vec((0usize..7, 1u8..=3), 1..40),
    ) {
        let layout: Vec<(Color, u8)> = layout
            .into_iter()
            .map(|(c, p)| (Color::ALL[c], p))
            .collect();
        let mut board = Board::from_layout(&layout);
        prop_assert!(board.stacks_are_dense());

        for (c, steps) in moves {
            let color = Color::ALL[c];
            let outcome = board.resolve_move(color, steps);
            prop_assert!(board.stacks_are_dense());
            prop_assert!(outcome.carried.first() == Some(&color));
            for carried in &outcome.carried {
                prop_assert_eq!(board.piece(*carried).position, outcome.to);
            }
            prop_assert!((TRACK_START..=FINISH_POSITION).contains(&outcome.to));
        }
    }

    #[test]
    fn round_cards_never_increase(claims in prop::collection::vec((0u8..8, 0usize..5), 1..40)) {
        let mut ledger = WagerLedger::new();
        let mut last_value = [u8::MAX; 5];

        for (player, c) in claims {
            match ledger.claim_round_card(player, Color::RACERS[c]) {
                Some(card) => {
                    prop_assert!(card.value <= last_value[c]);
                    prop_assert!(ROUND_CARD_VALUES.contains(&card.value));
                    last_value[c] = card.value;
                }
                None => prop_assert_eq!(ledger.cards_left(Color::RACERS[c]), 0),
            }
        }
    }
}
