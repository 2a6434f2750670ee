//! Knight, slider, king and castling move generation.

use crate::attacks::{bishop_attacks, king_attacks, knight_attacks, queen_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::castle_rights::{CastlePath, CastleSide};
use crate::chess_move::{Move, MoveList};
use crate::piece::PieceKind;
use crate::square::Square;

/// Attack set of a non-pawn piece standing on `sq`.
pub(super) fn piece_attacks(kind: PieceKind, sq: Square, occupied: Bitboard) -> Bitboard {
    match kind {
        PieceKind::Knight => knight_attacks(sq),
        PieceKind::Bishop => bishop_attacks(sq, occupied),
        PieceKind::Rook => rook_attacks(sq, occupied),
        PieceKind::Queen => queen_attacks(sq, occupied),
        PieceKind::King => king_attacks(sq),
        PieceKind::Pawn => Bitboard::EMPTY,
    }
}

/// Moves of every non-pawn piece of the side to move onto `targets`.
pub(super) fn gen_pieces(board: &Board, targets: Bitboard, list: &mut MoveList) {
    let us = board.side_to_move();
    let occupied = board.occupied();
    for kind in [PieceKind::Knight, PieceKind::Bishop, PieceKind::Rook, PieceKind::Queen, PieceKind::King] {
        for from in board.colored(kind, us) {
            for to in piece_attacks(kind, from, occupied) & targets {
                list.push(Move::new(from, to));
            }
        }
    }
}

/// True if castling along `path` is currently allowed, ignoring whether the
/// king's final square is attacked (apply rejects that).
pub(super) fn can_castle(board: &Board, side: CastleSide) -> bool {
    let us = board.side_to_move();
    if !board.castling().has(us, side) || board.in_check() {
        return false;
    }
    let path = CastlePath::of(us, side);
    if (board.occupied() & Bitboard::new(path.empty)).is_nonempty() {
        return false;
    }
    path.transit.iter().all(|&sq| !board.is_square_attacked(sq, !us))
}

pub(super) fn gen_castles(board: &Board, list: &mut MoveList) {
    let us = board.side_to_move();
    for side in CastleSide::BOTH {
        if can_castle(board, side) {
            let path = CastlePath::of(us, side);
            list.push(Move::castle(path.king_from, path.king_to));
        }
    }
}
