//! Race track representation including pieces, stacks, and track modifiers.
//!
//! This module contains:
//! - Piece colors (five racers, two reverse runners)
//! - Pieces and their stacking order
//! - Player-owned track modifiers
//! - The movement resolver that carries stacks along the track
//! - Ranking queries used by settlement

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Player identifier (seat index, 0-7)
pub type PlayerId = u8;

/// First square of the track
pub const TRACK_START: u8 = 1;

/// Last square of the track; reaching it ends the game
pub const FINISH_POSITION: u8 = 16;

/// Piece colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    Red,
    Yellow,
    Blue,
    Purple,
    Green,
    /// Runs backwards
    Black,
    /// Runs backwards
    White,
}

impl Color {
    /// All piece colors, racers first
    pub const ALL: [Color; 7] = [
        Color::Red,
        Color::Yellow,
        Color::Blue,
        Color::Purple,
        Color::Green,
        Color::Black,
        Color::White,
    ];

    /// Colors whose finishing order is wagered on
    pub const RACERS: [Color; 5] = [
        Color::Red,
        Color::Yellow,
        Color::Blue,
        Color::Purple,
        Color::Green,
    ];

    /// Colors moved by the gray die
    pub const REVERSE: [Color; 2] = [Color::Black, Color::White];

    /// Whether this piece moves towards the start
    pub fn is_reverse(&self) -> bool {
        matches!(self, Color::Black | Color::White)
    }

    /// Lowercase display name
    pub fn name(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Yellow => "yellow",
            Color::Blue => "blue",
            Color::Purple => "purple",
            Color::Green => "green",
            Color::Black => "black",
            Color::White => "white",
        }
    }
}

/// A racing piece on the track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    /// Square the piece stands on (1-16)
    pub position: u8,
    /// Height in the stack on its square, 0 = bottom
    pub stack_order: u8,
    pub is_reverse: bool,
}

impl Piece {
    pub fn new(color: Color, position: u8, stack_order: u8) -> Self {
        Self {
            color,
            position,
            stack_order,
            is_reverse: color.is_reverse(),
        }
    }
}

/// Effect of a track modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    /// Pushes a landing stack one more square in its direction of travel
    Accelerate,
    /// Pulls a landing stack one square back against its direction of travel
    Decelerate,
}

impl ModifierKind {
    pub const ALL: [ModifierKind; 2] = [ModifierKind::Accelerate, ModifierKind::Decelerate];

    pub fn name(&self) -> &'static str {
        match self {
            ModifierKind::Accelerate => "accelerate",
            ModifierKind::Decelerate => "decelerate",
        }
    }

    /// Extra displacement applied to a piece landing on this modifier.
    ///
    /// Reverse runners travel towards the start, so the sign flips for them.
    pub fn nudge(&self, reverse: bool) -> i16 {
        let forward = match self {
            ModifierKind::Accelerate => 1,
            ModifierKind::Decelerate => -1,
        };
        if reverse {
            -forward
        } else {
            forward
        }
    }
}

/// A player-owned modifier on an interior square
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackModifier {
    pub id: u32,
    /// Square (2-15)
    pub position: u8,
    pub kind: ModifierKind,
    pub owner: PlayerId,
}

/// Why a modifier cannot go on a square
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PlacementError {
    #[error("modifiers only go on squares 2 to 15")]
    OffTrack,

    #[error("a piece is standing on that square")]
    PieceOnSquare,

    #[error("another player's modifier is on that square")]
    ModifierOnSquare,

    #[error("a modifier is on an adjacent square")]
    AdjacentModifier,
}

/// What placing a modifier would do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The owner's modifier already sits there and only changes kind
    Retype,
    /// A new modifier is created, replacing the owner's previous one if any
    Create { replaces: Option<u8> },
}

/// A modifier that fired during a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileTrigger {
    pub owner: PlayerId,
    pub position: u8,
    pub kind: ModifierKind,
}

/// Result of moving a piece
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub color: Color,
    pub from: u8,
    /// Final square after modifier and clamping
    pub to: u8,
    /// The moving block, bottom to top (starts with `color`)
    pub carried: Vec<Color>,
    /// Modifier that fired, if the stack landed on one
    pub tile: Option<TileTrigger>,
    /// Whether any piece now stands on the finish square
    pub finished: bool,
}

/// The race track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// One entry per color, in `Color::ALL` order
    pub pieces: Vec<Piece>,
    /// Placed modifiers, at most one per player
    pub modifiers: Vec<TrackModifier>,
    next_modifier_id: u32,
}

impl Board {
    /// Create a board with every piece on a random square near its starting edge.
    ///
    /// Racers start on squares 1-3, reverse runners on squares 13-15.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let layout: Vec<(Color, u8)> = Color::ALL
            .iter()
            .map(|&color| {
                let position = if color.is_reverse() {
                    rng.gen_range(13..=15)
                } else {
                    rng.gen_range(1..=3)
                };
                (color, position)
            })
            .collect();
        Self::from_layout(&layout)
    }

    /// Create a board from explicit positions.
    ///
    /// Pieces sharing a square are stacked in the order they are listed,
    /// first entry at the bottom. Colors left out start on square 1 (racers)
    /// or square 15 (reverse runners), on top of anything listed.
    pub fn from_layout(layout: &[(Color, u8)]) -> Self {
        let mut placed: Vec<(Color, u8)> = Vec::with_capacity(Color::ALL.len());
        for &(color, position) in layout {
            if !placed.iter().any(|(c, _)| *c == color) {
                placed.push((color, position.clamp(TRACK_START, FINISH_POSITION)));
            }
        }
        for color in Color::ALL {
            if !placed.iter().any(|(c, _)| *c == color) {
                let position = if color.is_reverse() { 15 } else { TRACK_START };
                placed.push((color, position));
            }
        }

        let mut pieces: Vec<Piece> = Vec::with_capacity(Color::ALL.len());
        for color in Color::ALL {
            let (index, position) = placed
                .iter()
                .enumerate()
                .find(|(_, (c, _))| *c == color)
                .map(|(i, (_, p))| (i, *p))
                .unwrap_or((0, TRACK_START));
            let below = placed[..index].iter().filter(|(_, p)| *p == position).count();
            pieces.push(Piece::new(color, position, below as u8));
        }

        Self {
            pieces,
            modifiers: Vec::new(),
            next_modifier_id: 1,
        }
    }

    /// Get a piece by color
    pub fn piece(&self, color: Color) -> &Piece {
        &self.pieces[Self::index_of(color)]
    }

    fn index_of(color: Color) -> usize {
        Color::ALL
            .iter()
            .position(|&c| c == color)
            .unwrap_or_default()
    }

    /// Colors standing on a square, bottom to top
    pub fn stack_at(&self, position: u8) -> Vec<Color> {
        let mut stack: Vec<&Piece> = self
            .pieces
            .iter()
            .filter(|p| p.position == position)
            .collect();
        stack.sort_by_key(|p| p.stack_order);
        stack.into_iter().map(|p| p.color).collect()
    }

    /// Whether any piece stands on a square
    pub fn is_occupied(&self, position: u8) -> bool {
        self.pieces.iter().any(|p| p.position == position)
    }

    /// Modifier on a square, if any
    pub fn modifier_at(&self, position: u8) -> Option<&TrackModifier> {
        self.modifiers.iter().find(|m| m.position == position)
    }

    /// A player's modifier, if placed
    pub fn modifier_of(&self, owner: PlayerId) -> Option<&TrackModifier> {
        self.modifiers.iter().find(|m| m.owner == owner)
    }

    /// Whether any piece has reached the finish square
    pub fn has_finisher(&self) -> bool {
        self.pieces.iter().any(|p| p.position >= FINISH_POSITION)
    }

    /// Racing colors from leader to last.
    ///
    /// Further along the track ranks higher; on a shared square the piece
    /// higher in the stack ranks higher. Reverse runners are excluded.
    pub fn ranking(&self) -> Vec<Color> {
        let mut racers: Vec<&Piece> = self.pieces.iter().filter(|p| !p.is_reverse).collect();
        racers.sort_by(|a, b| {
            b.position
                .cmp(&a.position)
                .then(b.stack_order.cmp(&a.stack_order))
        });
        racers.into_iter().map(|p| p.color).collect()
    }

    /// Check whether every occupied square holds a dense 0-based stack
    pub fn stacks_are_dense(&self) -> bool {
        (TRACK_START..=FINISH_POSITION).all(|position| {
            let mut orders: Vec<u8> = self
                .pieces
                .iter()
                .filter(|p| p.position == position)
                .map(|p| p.stack_order)
                .collect();
            orders.sort_unstable();
            orders.iter().enumerate().all(|(i, &o)| i == o as usize)
        })
    }

    // ==================== Modifiers ====================

    /// Decide what placing a modifier for `owner` at `position` would do
    pub fn check_modifier_placement(
        &self,
        owner: PlayerId,
        position: u8,
    ) -> Result<Placement, PlacementError> {
        if position <= TRACK_START || position >= FINISH_POSITION {
            return Err(PlacementError::OffTrack);
        }

        if let Some(existing) = self.modifier_at(position) {
            if existing.owner == owner {
                return Ok(Placement::Retype);
            }
            return Err(PlacementError::ModifierOnSquare);
        }

        if self.is_occupied(position) {
            return Err(PlacementError::PieceOnSquare);
        }

        if self
            .modifiers
            .iter()
            .any(|m| m.position.abs_diff(position) == 1)
        {
            return Err(PlacementError::AdjacentModifier);
        }

        Ok(Placement::Create {
            replaces: self.modifier_of(owner).map(|m| m.position),
        })
    }

    /// Place or re-type a player's modifier
    pub fn place_modifier(
        &mut self,
        owner: PlayerId,
        position: u8,
        kind: ModifierKind,
    ) -> Result<Placement, PlacementError> {
        let placement = self.check_modifier_placement(owner, position)?;

        match placement {
            Placement::Retype => {
                if let Some(existing) = self.modifiers.iter_mut().find(|m| m.position == position) {
                    existing.kind = kind;
                }
            }
            Placement::Create { .. } => {
                self.modifiers.retain(|m| m.owner != owner);
                self.modifiers.push(TrackModifier {
                    id: self.next_modifier_id,
                    position,
                    kind,
                    owner,
                });
                self.next_modifier_id += 1;
            }
        }

        Ok(placement)
    }

    // ==================== Movement ====================

    /// Move a piece and everything stacked on it.
    ///
    /// Racers advance `steps`, reverse runners retreat `steps`. A modifier on
    /// the raw destination nudges the block one more square, then the result
    /// is clamped to the track. The block lands on top of whatever already
    /// stands on the destination.
    pub fn resolve_move(&mut self, color: Color, steps: u8) -> MoveOutcome {
        let piece = self.piece(color).clone();
        let direction: i16 = if piece.is_reverse { -1 } else { 1 };
        let raw = piece.position as i16 + direction * steps as i16;

        let tile = u8::try_from(raw)
            .ok()
            .and_then(|square| self.modifier_at(square))
            .map(|m| TileTrigger {
                owner: m.owner,
                position: m.position,
                kind: m.kind,
            });

        let nudged = raw + tile.map_or(0, |t| t.kind.nudge(piece.is_reverse));
        let to = nudged.clamp(TRACK_START as i16, FINISH_POSITION as i16) as u8;

        let origin = self.stack_at(piece.position);
        let split = piece.stack_order as usize;
        let (left, carried) = origin.split_at(split.min(origin.len()));
        let carried = carried.to_vec();

        for (order, &c) in left.iter().enumerate() {
            self.pieces[Self::index_of(c)].stack_order = order as u8;
        }

        let base: Vec<Color> = self
            .stack_at(to)
            .into_iter()
            .filter(|c| !carried.contains(c))
            .collect();
        for (offset, &c) in carried.iter().enumerate() {
            let moved = &mut self.pieces[Self::index_of(c)];
            moved.position = to;
            moved.stack_order = (base.len() + offset) as u8;
        }

        MoveOutcome {
            color,
            from: piece.position,
            to,
            carried,
            tile,
            finished: self.has_finisher(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_random_board_is_valid() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let board = Board::random(&mut rng);
            assert_eq!(board.pieces.len(), 7);
            assert!(board.stacks_are_dense());
            for piece in &board.pieces {
                if piece.is_reverse {
                    assert!((13..=15).contains(&piece.position));
                } else {
                    assert!((1..=3).contains(&piece.position));
                }
            }
        }
    }

    #[test]
    fn test_from_layout_stacks_in_listed_order() {
        let board = Board::from_layout(&[(Color::Red, 4), (Color::Blue, 4), (Color::Green, 4)]);
        assert_eq!(board.stack_at(4), vec![Color::Red, Color::Blue, Color::Green]);
        assert!(board.stacks_are_dense());
    }

    #[test]
    fn test_move_carries_pieces_above() {
        let mut board = Board::from_layout(&[
            (Color::Red, 3),
            (Color::Yellow, 3),
            (Color::Blue, 3),
            (Color::Green, 5),
        ]);

        let outcome = board.resolve_move(Color::Yellow, 2);

        assert_eq!(outcome.to, 5);
        assert_eq!(outcome.carried, vec![Color::Yellow, Color::Blue]);
        assert_eq!(board.stack_at(3), vec![Color::Red]);
        assert_eq!(board.stack_at(5), vec![Color::Green, Color::Yellow, Color::Blue]);
        assert!(board.stacks_are_dense());
    }

    #[test]
    fn test_reverse_piece_carries_racers() {
        let mut board = Board::from_layout(&[(Color::Black, 10), (Color::Red, 10)]);

        let outcome = board.resolve_move(Color::Black, 3);

        assert_eq!(outcome.to, 7);
        assert_eq!(board.stack_at(7), vec![Color::Black, Color::Red]);
        assert!(board.stack_at(10).is_empty());
    }

    #[test]
    fn test_accelerate_forward() {
        let mut board = Board::from_layout(&[(Color::Red, 2)]);
        board.place_modifier(1, 3, ModifierKind::Accelerate).unwrap();

        let outcome = board.resolve_move(Color::Red, 1);

        assert_eq!(outcome.to, 4);
        assert_eq!(
            outcome.tile,
            Some(TileTrigger {
                owner: 1,
                position: 3,
                kind: ModifierKind::Accelerate
            })
        );
    }

    #[test]
    fn test_decelerate_back_onto_origin() {
        // Red carries Blue onto the tile at 6 and is pushed back to 5,
        // landing on top of Green which stayed behind.
        let mut board = Board::from_layout(&[(Color::Green, 5), (Color::Red, 5), (Color::Blue, 5)]);
        board.place_modifier(0, 6, ModifierKind::Decelerate).unwrap();

        let outcome = board.resolve_move(Color::Red, 1);

        assert_eq!(outcome.to, 5);
        assert_eq!(board.stack_at(5), vec![Color::Green, Color::Red, Color::Blue]);
        assert!(board.stacks_are_dense());
    }

    #[test]
    fn test_reverse_tile_effect_is_flipped() {
        let mut board = Board::from_layout(&[(Color::White, 12)]);
        board.place_modifier(0, 10, ModifierKind::Accelerate).unwrap();
        let outcome = board.resolve_move(Color::White, 2);
        assert_eq!(outcome.to, 9);

        let mut board = Board::from_layout(&[(Color::White, 12)]);
        board.place_modifier(0, 10, ModifierKind::Decelerate).unwrap();
        let outcome = board.resolve_move(Color::White, 2);
        assert_eq!(outcome.to, 11);
    }

    #[test]
    fn test_move_clamps_to_track() {
        let mut board = Board::from_layout(&[(Color::Red, 15)]);
        let outcome = board.resolve_move(Color::Red, 3);
        assert_eq!(outcome.to, FINISH_POSITION);
        assert!(outcome.finished);

        let mut board = Board::from_layout(&[(Color::Black, 2)]);
        let outcome = board.resolve_move(Color::Black, 3);
        assert_eq!(outcome.to, TRACK_START);
        assert!(!outcome.finished);
    }

    #[test]
    fn test_ranking_uses_stack_height() {
        let board = Board::from_layout(&[
            (Color::Red, 10),
            (Color::Yellow, 10),
            (Color::Blue, 9),
            (Color::Purple, 2),
            (Color::Green, 1),
            (Color::Black, 14),
        ]);
        assert_eq!(
            board.ranking(),
            vec![Color::Yellow, Color::Red, Color::Blue, Color::Purple, Color::Green]
        );
    }

    #[test]
    fn test_modifier_placement_rules() {
        let mut board = Board::from_layout(&[(Color::Red, 4)]);

        assert_eq!(board.check_modifier_placement(0, 1), Err(PlacementError::OffTrack));
        assert_eq!(board.check_modifier_placement(0, 16), Err(PlacementError::OffTrack));
        assert_eq!(board.check_modifier_placement(0, 4), Err(PlacementError::PieceOnSquare));

        board.place_modifier(0, 8, ModifierKind::Accelerate).unwrap();
        assert_eq!(board.check_modifier_placement(1, 8), Err(PlacementError::ModifierOnSquare));
        assert_eq!(board.check_modifier_placement(1, 9), Err(PlacementError::AdjacentModifier));
        assert_eq!(board.check_modifier_placement(1, 7), Err(PlacementError::AdjacentModifier));
        assert_eq!(
            board.check_modifier_placement(1, 10),
            Ok(Placement::Create { replaces: None })
        );
    }

    #[test]
    fn test_relocating_replaces_previous_modifier() {
        let mut board = Board::from_layout(&[]);
        board.place_modifier(2, 8, ModifierKind::Accelerate).unwrap();

        let placement = board.place_modifier(2, 12, ModifierKind::Decelerate).unwrap();

        assert_eq!(placement, Placement::Create { replaces: Some(8) });
        assert_eq!(board.modifiers.len(), 1);
        assert_eq!(board.modifier_of(2).map(|m| m.position), Some(12));
        assert!(board.modifier_at(8).is_none());
    }

    #[test]
    fn test_retype_in_place() {
        let mut board = Board::from_layout(&[]);
        board.place_modifier(2, 8, ModifierKind::Accelerate).unwrap();
        let id = board.modifier_at(8).map(|m| m.id);

        let placement = board.place_modifier(2, 8, ModifierKind::Decelerate).unwrap();

        assert_eq!(placement, Placement::Retype);
        assert_eq!(board.modifier_at(8).map(|m| m.kind), Some(ModifierKind::Decelerate));
        assert_eq!(board.modifier_at(8).map(|m| m.id), id);
    }
}
