//! Moves packed into 16 bits, plus a fixed-capacity move list.

use std::fmt;

use crate::piece::PieceKind;
use crate::square::Square;

const FROM_MASK: u16 = 0x003F;
const TO_SHIFT: u32 = 6;
const CLASS_SHIFT: u32 = 12;
const PROMO_SHIFT: u32 = 14;

/// Category of a move, stored in bits 12-13.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveClass {
    Normal = 0,
    Castle = 1,
    EnPassant = 2,
    Promotion = 3,
}

/// A move encoded in 16 bits.
///
/// ```text
/// bits  0-5:  from square
/// bits  6-11: to square
/// bits 12-13: class      (normal, castle, en passant, promotion)
/// bits 14-15: promotion  (knight, bishop, rook, queen)
/// ```
///
/// Castling is encoded as the king's own move, e.g. `e1g1`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Move(u16);

impl Move {
    /// Absence of a move.
    pub const NONE: Move = Move(0);

    /// Passing the turn during null-move pruning. Encodes d2-a1, which no piece can play.
    pub const NULL: Move = Move(11);

    #[inline]
    const fn pack(from: Square, to: Square, class: MoveClass, promo: u16) -> Move {
        Move(
            from.index() as u16
                | (to.index() as u16) << TO_SHIFT
                | (class as u16) << CLASS_SHIFT
                | promo << PROMO_SHIFT,
        )
    }

    /// A normal move or capture.
    #[inline]
    pub const fn new(from: Square, to: Square) -> Move {
        Move::pack(from, to, MoveClass::Normal, 0)
    }

    #[inline]
    pub const fn castle(king_from: Square, king_to: Square) -> Move {
        Move::pack(king_from, king_to, MoveClass::Castle, 0)
    }

    #[inline]
    pub const fn en_passant(from: Square, to: Square) -> Move {
        Move::pack(from, to, MoveClass::EnPassant, 0)
    }

    /// A promotion to `piece`, which must be a knight, bishop, rook or queen.
    #[inline]
    pub const fn promotion(from: Square, to: Square, piece: PieceKind) -> Move {
        debug_assert!(matches!(
            piece,
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen
        ));
        Move::pack(from, to, MoveClass::Promotion, piece as u16 - 1)
    }

    #[inline]
    pub const fn from_raw(raw: u16) -> Move {
        Move(raw)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn from(self) -> Square {
        Square::from_index_unchecked((self.0 & FROM_MASK) as u8)
    }

    #[inline]
    pub const fn to(self) -> Square {
        Square::from_index_unchecked(((self.0 >> TO_SHIFT) & FROM_MASK) as u8)
    }

    #[inline]
    pub const fn class(self) -> MoveClass {
        match (self.0 >> CLASS_SHIFT) & 3 {
            0 => MoveClass::Normal,
            1 => MoveClass::Castle,
            2 => MoveClass::EnPassant,
            _ => MoveClass::Promotion,
        }
    }

    /// The promoted-to piece, for promotion moves only.
    #[inline]
    pub const fn promotion_piece(self) -> Option<PieceKind> {
        if !self.is_promotion() {
            return None;
        }
        Some(match self.0 >> PROMO_SHIFT {
            0 => PieceKind::Knight,
            1 => PieceKind::Bishop,
            2 => PieceKind::Rook,
            _ => PieceKind::Queen,
        })
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        (self.0 >> CLASS_SHIFT) & 3 == MoveClass::Promotion as u16
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        (self.0 >> CLASS_SHIFT) & 3 == MoveClass::EnPassant as u16
    }

    #[inline]
    pub const fn is_castle(self) -> bool {
        (self.0 >> CLASS_SHIFT) & 3 == MoveClass::Castle as u16
    }

    /// True for `NONE` and `NULL`, neither of which moves a piece.
    #[inline]
    pub const fn is_none_or_null(self) -> bool {
        self.0 == Move::NONE.0 || self.0 == Move::NULL.0
    }

    /// Index of the from/to pair, ignoring class and promotion bits.
    #[inline]
    pub const fn from_to(self) -> usize {
        (self.0 & 0x0FFF) as usize
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none_or_null() {
            return f.write_str("0000");
        }
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(piece) = self.promotion_piece() {
            write!(f, "{}", piece.fen_char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({self} {:?})", self.class())
    }
}

/// Upper bound on pseudo-legal moves in any reachable position.
pub const MAX_MOVES: usize = 256;

/// A stack-allocated list of moves.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    pub const fn new() -> MoveList {
        MoveList { moves: [Move::NONE; MAX_MOVES], len: 0 }
    }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES, "move list overflow");
        self.moves[self.len] = mv;
        self.len += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Move] {
        &mut self.moves[..self.len]
    }

    /// Remove the move at `index`, filling the hole with the last move.
    #[inline]
    pub fn swap_remove(&mut self, index: usize) -> Move {
        let mv = self.moves[index];
        self.len -= 1;
        self.moves[index] = self.moves[self.len];
        mv
    }

    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.as_slice().iter().copied()
    }
}

impl Default for MoveList {
    fn default() -> Self {
        MoveList::new()
    }
}

impl fmt::Debug for MoveList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn size_of_move() {
        assert_eq!(std::mem::size_of::<Move>(), 2);
    }

    #[test]
    fn field_layout() {
        let mv = Move::promotion(sq("b7"), sq("a8"), PieceKind::Rook);
        assert_eq!(mv.raw() & 0x3F, sq("b7").index() as u16);
        assert_eq!((mv.raw() >> 6) & 0x3F, sq("a8").index() as u16);
        assert_eq!((mv.raw() >> 12) & 3, 3);
        assert_eq!(mv.raw() >> 14, 2);
        assert_eq!(mv.promotion_piece(), Some(PieceKind::Rook));
        assert_eq!(mv.to_string(), "b7a8r");
    }

    #[test]
    fn classes() {
        assert_eq!(Move::new(sq("e2"), sq("e4")).class(), MoveClass::Normal);
        assert_eq!(Move::castle(Square::E1, Square::G1).class(), MoveClass::Castle);
        let ep = Move::en_passant(sq("e5"), sq("d6"));
        assert!(ep.is_en_passant());
        assert_eq!(ep.promotion_piece(), None);
    }

    #[test]
    fn sentinels_differ_from_real_moves() {
        assert_ne!(Move::NONE, Move::NULL);
        assert_eq!(Move::NULL.from(), sq("d2"));
        assert_eq!(Move::NULL.to(), Square::A1);
        assert!(Move::NULL.is_none_or_null());
        assert_eq!(Move::NONE.to_string(), "0000");
    }

    #[test]
    fn list_swap_remove() {
        let mut list = MoveList::new();
        let a = Move::new(sq("a2"), sq("a3"));
        let b = Move::new(sq("b2"), sq("b3"));
        let c = Move::new(sq("c2"), sq("c3"));
        list.push(a);
        list.push(b);
        list.push(c);
        assert_eq!(list.swap_remove(0), a);
        assert_eq!(list.as_slice(), &[c, b]);
        assert!(!list.contains(a));
    }
}
