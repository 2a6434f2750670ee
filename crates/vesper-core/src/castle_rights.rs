//! Castling rights as a 4-bit set.

use std::fmt;

use crate::color::Color;
use crate::square::Square;

/// Which wing a castle goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastleSide {
    KingSide,
    QueenSide,
}

impl CastleSide {
    pub const BOTH: [CastleSide; 2] = [CastleSide::KingSide, CastleSide::QueenSide];
}

/// Bit 0 = White king side, 1 = White queen side, 2 = Black king side, 3 = Black queen side.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastleRights(u8);

/// Rights that survive a move touching each square. Moving from or capturing
/// on a king or rook home square clears the matching rights.
static KEEP_MASK: [u8; 64] = {
    let mut mask = [0b1111u8; 64];
    mask[Square::A1.index()] = 0b1101;
    mask[Square::E1.index()] = 0b1100;
    mask[Square::H1.index()] = 0b1110;
    mask[Square::A8.index()] = 0b0111;
    mask[Square::E8.index()] = 0b0011;
    mask[Square::H8.index()] = 0b1011;
    mask
};

impl CastleRights {
    pub const NONE: CastleRights = CastleRights(0);
    pub const ALL: CastleRights = CastleRights(0b1111);

    #[inline]
    pub const fn from_bits(bits: u8) -> CastleRights {
        CastleRights(bits & 0b1111)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    const fn flag(color: Color, side: CastleSide) -> u8 {
        let shift = color.index() * 2
            + match side {
                CastleSide::KingSide => 0,
                CastleSide::QueenSide => 1,
            };
        1 << shift
    }

    #[inline]
    pub const fn has(self, color: Color, side: CastleSide) -> bool {
        self.0 & Self::flag(color, side) != 0
    }

    #[inline]
    pub const fn with(self, color: Color, side: CastleSide) -> CastleRights {
        CastleRights(self.0 | Self::flag(color, side))
    }

    #[inline]
    pub const fn without(self, color: Color, side: CastleSide) -> CastleRights {
        CastleRights(self.0 & !Self::flag(color, side))
    }

    /// Rights left after a move from `from` to `to`.
    #[inline]
    pub fn after_move(self, from: Square, to: Square) -> CastleRights {
        CastleRights(self.0 & KEEP_MASK[from.index()] & KEEP_MASK[to.index()])
    }
}

/// Geometry of one castling move for standard chess.
#[derive(Debug, Clone, Copy)]
pub struct CastlePath {
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
    /// Squares that must be empty.
    pub empty: u64,
    /// Squares the king crosses, which must not be attacked (excluding its start).
    pub transit: [Square; 2],
}

impl CastlePath {
    pub const fn of(color: Color, side: CastleSide) -> CastlePath {
        let base: u8 = match color {
            Color::White => 0,
            Color::Black => 56,
        };
        match side {
            CastleSide::KingSide => CastlePath {
                king_from: Square::from_index_unchecked(base + 4),
                king_to: Square::from_index_unchecked(base + 6),
                rook_from: Square::from_index_unchecked(base + 7),
                rook_to: Square::from_index_unchecked(base + 5),
                empty: 0b0110_0000u64 << base as u32,
                transit: [Square::from_index_unchecked(base + 5), Square::from_index_unchecked(base + 6)],
            },
            CastleSide::QueenSide => CastlePath {
                king_from: Square::from_index_unchecked(base + 4),
                king_to: Square::from_index_unchecked(base + 2),
                rook_from: Square::from_index_unchecked(base),
                rook_to: Square::from_index_unchecked(base + 3),
                empty: 0b0000_1110u64 << base as u32,
                transit: [Square::from_index_unchecked(base + 3), Square::from_index_unchecked(base + 2)],
            },
        }
    }

    /// Find the castle whose king move is `from -> to`, if any.
    pub fn from_king_move(color: Color, from: Square, to: Square) -> Option<CastlePath> {
        CastleSide::BOTH
            .into_iter()
            .map(|side| CastlePath::of(color, side))
            .find(|p| p.king_from == from && p.king_to == to)
    }
}

impl fmt::Display for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for (c, color, side) in [
            ('K', Color::White, CastleSide::KingSide),
            ('Q', Color::White, CastleSide::QueenSide),
            ('k', Color::Black, CastleSide::KingSide),
            ('q', Color::Black, CastleSide::QueenSide),
        ] {
            if self.has(color, side) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CastleRights({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn king_move_clears_both_rights() {
        let rights = CastleRights::ALL.after_move(Square::E1, Square::F1);
        assert!(!rights.has(Color::White, CastleSide::KingSide));
        assert!(!rights.has(Color::White, CastleSide::QueenSide));
        assert!(rights.has(Color::Black, CastleSide::KingSide));
    }

    #[test]
    fn rook_capture_clears_victim_right() {
        let rights = CastleRights::ALL.after_move(Square::B1, Square::H8);
        assert!(!rights.has(Color::Black, CastleSide::KingSide));
        assert!(rights.has(Color::Black, CastleSide::QueenSide));
        assert_eq!(rights.to_string(), "KQq");
    }

    #[test]
    fn castle_paths_for_black() {
        let path = CastlePath::of(Color::Black, CastleSide::QueenSide);
        assert_eq!(path.king_to, Square::C8);
        assert_eq!(path.rook_from, Square::A8);
        assert_eq!(path.rook_to, Square::D8);
        assert_eq!(path.empty.count_ones(), 3);
        assert!(CastlePath::from_king_move(Color::Black, Square::E8, Square::G8).is_some());
        assert!(CastlePath::from_king_move(Color::White, Square::E8, Square::G8).is_none());
    }
}
