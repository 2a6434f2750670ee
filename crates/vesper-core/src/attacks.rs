//! Attack sets for every piece kind.
//!
//! Leaper tables and slider rays are built at compile time. Slider attacks
//! use the classical ray method: walk each ray up to the first blocker by
//! masking out everything behind it.

use crate::bitboard::Bitboard;
use crate::color::Color;
use crate::square::Square;

const KNIGHT_STEPS: [(i8, i8); 8] = [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
const KING_STEPS: [(i8, i8); 8] = [(0, 1), (1, 1), (1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0), (-1, 1)];

/// Ray directions as (file, rank) steps. The first four increase the square
/// index, the last four decrease it.
const DIRECTIONS: [(i8, i8); 8] = [(0, 1), (1, 1), (1, 0), (-1, 1), (0, -1), (-1, -1), (-1, 0), (1, -1)];

const NORTH: usize = 0;
const NORTH_EAST: usize = 1;
const EAST: usize = 2;
const NORTH_WEST: usize = 3;
const SOUTH: usize = 4;
const SOUTH_WEST: usize = 5;
const WEST: usize = 6;
const SOUTH_EAST: usize = 7;

const fn leaper_table(steps: &[(i8, i8); 8]) -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut sq = 0;
    while sq < 64 {
        let file = (sq % 8) as i8;
        let rank = (sq / 8) as i8;
        let mut i = 0;
        while i < 8 {
            let f = file + steps[i].0;
            let r = rank + steps[i].1;
            if f >= 0 && f < 8 && r >= 0 && r < 8 {
                table[sq] |= 1u64 << (r * 8 + f) as u32;
            }
            i += 1;
        }
        sq += 1;
    }
    table
}

const fn pawn_table() -> [[u64; 64]; 2] {
    let mut table = [[0u64; 64]; 2];
    let mut sq = 0;
    while sq < 64 {
        let file = (sq % 8) as i8;
        let rank = (sq / 8) as i8;
        let mut side = 0;
        while side < 2 {
            let r = if side == 0 { rank + 1 } else { rank - 1 };
            if r >= 0 && r < 8 {
                if file > 0 {
                    table[side][sq] |= 1u64 << (r * 8 + file - 1) as u32;
                }
                if file < 7 {
                    table[side][sq] |= 1u64 << (r * 8 + file + 1) as u32;
                }
            }
            side += 1;
        }
        sq += 1;
    }
    table
}

const fn ray_table() -> [[u64; 64]; 8] {
    let mut table = [[0u64; 64]; 8];
    let mut dir = 0;
    while dir < 8 {
        let mut sq = 0;
        while sq < 64 {
            let mut f = (sq % 8) as i8 + DIRECTIONS[dir].0;
            let mut r = (sq / 8) as i8 + DIRECTIONS[dir].1;
            while f >= 0 && f < 8 && r >= 0 && r < 8 {
                table[dir][sq] |= 1u64 << (r * 8 + f) as u32;
                f += DIRECTIONS[dir].0;
                r += DIRECTIONS[dir].1;
            }
            sq += 1;
        }
        dir += 1;
    }
    table
}

static KNIGHT: [u64; 64] = leaper_table(&KNIGHT_STEPS);
static KING: [u64; 64] = leaper_table(&KING_STEPS);
static PAWN: [[u64; 64]; 2] = pawn_table();
static RAYS: [[u64; 64]; 8] = ray_table();

#[inline]
fn ray_attacks(dir: usize, sq: Square, occupied: Bitboard) -> Bitboard {
    let ray = RAYS[dir][sq.index()];
    let blockers = Bitboard::new(ray) & occupied;
    let first = if dir < SOUTH { blockers.lsb() } else { blockers.msb() };
    match first {
        Some(b) => Bitboard::new(ray ^ RAYS[dir][b.index()]),
        None => Bitboard::new(ray),
    }
}

/// Squares a pawn of `color` on `sq` attacks.
#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    Bitboard::new(PAWN[color.index()][sq.index()])
}

#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    Bitboard::new(KNIGHT[sq.index()])
}

#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    Bitboard::new(KING[sq.index()])
}

/// Diagonal slider attacks given the board occupancy.
#[inline]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(NORTH_EAST, sq, occupied)
        | ray_attacks(NORTH_WEST, sq, occupied)
        | ray_attacks(SOUTH_EAST, sq, occupied)
        | ray_attacks(SOUTH_WEST, sq, occupied)
}

/// Orthogonal slider attacks given the board occupancy.
#[inline]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(NORTH, sq, occupied)
        | ray_attacks(EAST, sq, occupied)
        | ray_attacks(SOUTH, sq, occupied)
        | ray_attacks(WEST, sq, occupied)
}

#[inline]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn knight_in_corner_has_two_targets() {
        assert_eq!(knight_attacks(Square::A1).count(), 2);
        assert_eq!(knight_attacks(sq("d4")).count(), 8);
    }

    #[test]
    fn king_on_edge() {
        assert_eq!(king_attacks(Square::E1).count(), 5);
        assert_eq!(king_attacks(Square::H8).count(), 3);
    }

    #[test]
    fn pawn_attacks_follow_color() {
        let white = pawn_attacks(Color::White, sq("e4"));
        assert!(white.contains(sq("d5")) && white.contains(sq("f5")));
        let black = pawn_attacks(Color::Black, sq("a5"));
        assert_eq!(black, sq("b4").bitboard());
    }

    #[test]
    fn rook_stops_at_blockers() {
        let occ = sq("d6").bitboard() | sq("f4").bitboard();
        let att = rook_attacks(sq("d4"), occ);
        assert!(att.contains(sq("d6")));
        assert!(!att.contains(sq("d7")));
        assert!(att.contains(sq("f4")));
        assert!(!att.contains(sq("g4")));
        assert!(att.contains(sq("d1")));
        assert!(att.contains(sq("a4")));
        assert_eq!(rook_attacks(sq("d4"), Bitboard::EMPTY).count(), 14);
    }

    #[test]
    fn bishop_stops_at_blockers() {
        let occ = sq("b2").bitboard() | sq("f6").bitboard();
        let att = bishop_attacks(sq("d4"), occ);
        assert!(att.contains(sq("b2")));
        assert!(!att.contains(sq("a1")));
        assert!(att.contains(sq("f6")));
        assert!(!att.contains(sq("g7")));
        assert!(att.contains(sq("a7")));
        assert!(att.contains(sq("g1")));
    }

    #[test]
    fn queen_is_union() {
        let occ = sq("e5").bitboard();
        assert_eq!(
            queen_attacks(sq("c3"), occ),
            rook_attacks(sq("c3"), occ) | bishop_attacks(sq("c3"), occ)
        );
    }
}
