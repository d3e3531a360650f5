//! AI Bot players for the camel race.
//!
//! This module provides different difficulty levels of AI players:
//! - Easy: Random valid moves
//! - Medium: Bets on the leader now and then, occasionally boosts it
//! - Hard: Reads the race to time round cards and outcome wagers

use crate::actions::GameAction;
use crate::board::{ModifierKind, PlayerId, FINISH_POSITION};
use crate::game::GameState;
use crate::wager::OutcomeKind;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Squares from the finish at which the hard bot commits outcome wagers
const ENDGAME_DISTANCE: u8 = 4;

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotDifficulty {
    Easy,
    Medium,
    Hard,
}

/// A bot player that can decide on actions
pub struct Bot {
    pub player_id: PlayerId,
    pub difficulty: BotDifficulty,
    rng: StdRng,
}

impl Bot {
    pub fn new(player_id: PlayerId, difficulty: BotDifficulty) -> Self {
        Self {
            player_id,
            difficulty,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(player_id: PlayerId, difficulty: BotDifficulty, seed: u64) -> Self {
        Self {
            player_id,
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose an action from the valid actions
    pub fn choose_action(&mut self, game: &GameState) -> Option<GameAction> {
        let valid_actions = game.valid_actions(self.player_id);
        if valid_actions.is_empty() {
            return None;
        }

        match self.difficulty {
            BotDifficulty::Easy => self.choose_easy(&valid_actions),
            BotDifficulty::Medium => self.choose_medium(game, &valid_actions),
            BotDifficulty::Hard => self.choose_hard(game, &valid_actions),
        }
    }

    /// Easy: Just pick a random valid action
    fn choose_easy(&mut self, actions: &[GameAction]) -> Option<GameAction> {
        actions.choose(&mut self.rng).cloned()
    }

    /// Medium: back the leader with round cards, sometimes push it along
    fn choose_medium(&mut self, game: &GameState, actions: &[GameAction]) -> Option<GameAction> {
        let Some(leader) = game.ranking().first().copied() else {
            return Some(GameAction::roll());
        };

        let claim = GameAction::ClaimRoundCard(leader);
        if actions.contains(&claim) && self.rng.gen_bool(0.6) {
            return Some(claim);
        }

        let boost = GameAction::PlaceModifier {
            position: game.board.piece(leader).position.saturating_add(2),
            kind: ModifierKind::Accelerate,
        };
        if actions.contains(&boost) && self.rng.gen_bool(0.4) {
            return Some(boost);
        }

        Some(GameAction::roll())
    }

    /// Hard: strong round cards first, outcome wagers near the end
    fn choose_hard(&mut self, game: &GameState, actions: &[GameAction]) -> Option<GameAction> {
        let ranking = game.ranking();
        let (Some(&leader), Some(&last)) = (ranking.first(), ranking.last()) else {
            return Some(GameAction::roll());
        };
        let leader_position = game.board.piece(leader).position;

        let claim = GameAction::ClaimRoundCard(leader);
        if actions.contains(&claim) && game.wagers.top_card(leader).is_some_and(|v| v >= 3) {
            return Some(claim);
        }

        if FINISH_POSITION - leader_position <= ENDGAME_DISTANCE {
            for (color, kind) in [(leader, OutcomeKind::Champion), (last, OutcomeKind::Loser)] {
                let wager = GameAction::ClaimOutcome { color, kind };
                if actions.contains(&wager) {
                    return Some(wager);
                }
            }
        }

        if game.board.modifier_of(self.player_id).is_none() {
            let boost = GameAction::PlaceModifier {
                position: leader_position.saturating_add(3).min(FINISH_POSITION - 1),
                kind: ModifierKind::Accelerate,
            };
            if actions.contains(&boost) {
                return Some(boost);
            }
        }

        Some(GameAction::roll())
    }
}
