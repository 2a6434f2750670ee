//! Piece-square tables, built at compile time from a few shape rules.
//!
//! Tables are laid out from White's side in LERF order (A1 = 0). Black
//! pieces read the vertically mirrored square.

use vesper_core::{Color, PieceKind, Square};

use crate::eval::score::{S, Score};

const PAWN_ADVANCE_MG: [i16; 8] = [0, 0, 3, 8, 16, 30, 55, 0];
const PAWN_ADVANCE_EG: [i16; 8] = [0, -5, 0, 10, 25, 50, 90, 0];
const KING_SHELTER_MG: [i16; 8] = [20, 30, 10, -5, -5, 10, 30, 20];

/// Chebyshev distance to the four centre squares, 0..=3.
const fn centre_distance(file: i16, rank: i16) -> i16 {
    let df = if file < 4 { 3 - file } else { file - 4 };
    let dr = if rank < 4 { 3 - rank } else { rank - 4 };
    if df > dr { df } else { dr }
}

const fn square_value(kind: usize, file: i16, rank: i16) -> Score {
    let cd = centre_distance(file, rank);
    let central_file = file == 3 || file == 4;
    match kind {
        0 => {
            if rank == 0 || rank == 7 {
                return S(0, 0);
            }
            let centre_push = if central_file && (rank == 3 || rank == 4) { 12 } else { 0 };
            S(PAWN_ADVANCE_MG[rank as usize] + centre_push, PAWN_ADVANCE_EG[rank as usize])
        }
        1 => S(18 - 14 * cd, 12 - 12 * cd),
        2 => S(10 - 7 * cd, 6 - 6 * cd),
        3 => {
            let seventh = rank == 6;
            S(if seventh { 16 } else if central_file { 4 } else { 0 }, if seventh { 10 } else { 0 })
        }
        4 => S(4 - 4 * cd, 10 - 8 * cd),
        _ => {
            let advance = if rank > 4 { 4 } else { rank };
            S(KING_SHELTER_MG[file as usize] - 18 * advance, 24 - 16 * cd)
        }
    }
}

const fn build() -> [[Score; 64]; PieceKind::COUNT] {
    let mut table = [[Score::ZERO; 64]; PieceKind::COUNT];
    let mut kind = 0;
    while kind < PieceKind::COUNT {
        let mut sq = 0;
        while sq < 64 {
            table[kind][sq] = square_value(kind, (sq % 8) as i16, (sq / 8) as i16);
            sq += 1;
        }
        kind += 1;
    }
    table
}

static PST: [[Score; 64]; PieceKind::COUNT] = build();

/// Positional bonus for a piece of `kind` and `color` standing on `sq`.
#[inline]
pub fn pst_value(kind: PieceKind, color: Color, sq: Square) -> Score {
    let sq = match color {
        Color::White => sq,
        Color::Black => sq.flip_rank(),
    };
    PST[kind.index()][sq.index()]
}
