//! Zobrist keys, generated at compile time from a fixed seed.

use crate::board::Board;
use crate::castle_rights::CastleRights;
use crate::color::Color;
use crate::piece::Piece;
use crate::square::Square;

const SEED: u64 = 0x7665_7370_6572_2121;

const fn splitmix64(state: u64) -> (u64, u64) {
    let next = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = next;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    (z ^ (z >> 31), next)
}

struct Keys {
    pieces: [[u64; 64]; Piece::COUNT],
    castling: [u64; 16],
    en_passant: [u64; 8],
    side: u64,
}

static KEYS: Keys = {
    let mut keys = Keys {
        pieces: [[0; 64]; Piece::COUNT],
        castling: [0; 16],
        en_passant: [0; 8],
        side: 0,
    };
    let mut state = SEED;
    let mut p = 0;
    while p < Piece::COUNT {
        let mut sq = 0;
        while sq < 64 {
            let (key, next) = splitmix64(state);
            keys.pieces[p][sq] = key;
            state = next;
            sq += 1;
        }
        p += 1;
    }
    // Rights are hashed per bit so any combination is an XOR of singles.
    let mut bit = 0;
    let mut singles = [0u64; 4];
    while bit < 4 {
        let (key, next) = splitmix64(state);
        singles[bit] = key;
        state = next;
        bit += 1;
    }
    let mut rights = 0;
    while rights < 16 {
        let mut b = 0;
        while b < 4 {
            if rights & (1 << b) != 0 {
                keys.castling[rights] ^= singles[b];
            }
            b += 1;
        }
        rights += 1;
    }
    let mut file = 0;
    while file < 8 {
        let (key, next) = splitmix64(state);
        keys.en_passant[file] = key;
        state = next;
        file += 1;
    }
    keys.side = splitmix64(state).0;
    keys
};

#[inline]
pub(crate) fn piece_square(piece: Piece, sq: Square) -> u64 {
    KEYS.pieces[piece.index()][sq.index()]
}

#[inline]
pub(crate) fn castling(rights: CastleRights) -> u64 {
    KEYS.castling[rights.bits() as usize]
}

#[inline]
pub(crate) fn en_passant(sq: Square) -> u64 {
    KEYS.en_passant[sq.file() as usize]
}

#[inline]
pub(crate) fn side() -> u64 {
    KEYS.side
}

/// Full recomputation, used after FEN parsing and to check incremental updates.
pub(crate) fn hash_from_scratch(board: &Board) -> u64 {
    let mut hash = 0;
    for sq in Square::all() {
        if let Some(piece) = board.piece_on(sq) {
            hash ^= piece_square(piece, sq);
        }
    }
    if board.side_to_move() == Color::Black {
        hash ^= side();
    }
    hash ^= castling(board.castling());
    if let Some(ep) = board.en_passant() {
        hash ^= en_passant(ep);
    }
    hash
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::KEYS;

    #[test]
    fn piece_keys_are_distinct() {
        let keys: HashSet<u64> = KEYS.pieces.iter().flatten().copied().collect();
        assert_eq!(keys.len(), 12 * 64);
    }

    #[test]
    fn empty_rights_hash_to_zero() {
        assert_eq!(KEYS.castling[0], 0);
        assert_eq!(KEYS.castling[0b0011], KEYS.castling[0b0001] ^ KEYS.castling[0b0010]);
    }
}
