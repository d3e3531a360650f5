//! Append-only history of what happened in a game, grouped by round.

use crate::board::PlayerId;
use serde::{Deserialize, Serialize};

/// Who caused a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    Player(PlayerId),
    /// Settlements and round transitions
    System,
}

/// Category of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    RollDice,
    PlaceBet,
    PlaceModifier,
    RoundEnd,
    GameEnd,
}

/// A single history line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Sequence number, starting at 1
    pub seq: u64,
    pub round: u32,
    pub actor: Actor,
    pub kind: ActionKind,
    pub description: String,
}

/// The game's action history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLog {
    entries: Vec<ActionRecord>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its sequence number
    pub fn append(
        &mut self,
        round: u32,
        actor: Actor,
        kind: ActionKind,
        description: impl Into<String>,
    ) -> u64 {
        let seq = self.last_seq() + 1;
        self.entries.push(ActionRecord {
            seq,
            round,
            actor,
            kind,
            description: description.into(),
        });
        seq
    }

    /// Sequence number of the newest entry (0 when empty)
    pub fn last_seq(&self) -> u64 {
        self.entries.last().map_or(0, |e| e.seq)
    }

    pub fn entries(&self) -> &[ActionRecord] {
        &self.entries
    }

    /// Entries from one round
    pub fn for_round(&self, round: u32) -> impl Iterator<Item = &ActionRecord> {
        self.entries.iter().filter(move |e| e.round == round)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_numbers_entries() {
        let mut log = ActionLog::new();
        assert!(log.is_empty());

        let a = log.append(1, Actor::Player(0), ActionKind::RollDice, "rolled");
        let b = log.append(1, Actor::Player(1), ActionKind::PlaceBet, "bet");
        let c = log.append(2, Actor::System, ActionKind::RoundEnd, "settled");

        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(log.last_seq(), 3);
        assert_eq!(log.for_round(1).count(), 2);
        assert_eq!(log.for_round(2).next().map(|e| e.actor), Some(Actor::System));
    }
}
