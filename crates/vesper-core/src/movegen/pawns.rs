//! Pawn move generation.

use crate::attacks::pawn_attacks;
use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::chess_move::{Move, MoveList};
use crate::color::Color;
use crate::piece::PieceKind;
use crate::square::Square;

/// Queen first so the strongest promotion is tried before the others.
const PROMOTIONS: [PieceKind; 4] = [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight];

fn push_promotions(from: Square, to: Square, list: &mut MoveList) {
    for piece in PROMOTIONS {
        list.push(Move::promotion(from, to, piece));
    }
}

fn advance(pawns: Bitboard, us: Color) -> Bitboard {
    match us {
        Color::White => pawns.north(),
        Color::Black => pawns.south(),
    }
}

/// Captures, en passant and every promotion.
pub(super) fn gen_pawn_noisy(board: &Board, list: &mut MoveList) {
    let us = board.side_to_move();
    let them = !us;
    let pawns = board.colored(PieceKind::Pawn, us);
    let enemy = board.side(them);
    let promo_rank = match us {
        Color::White => Bitboard::RANK_8,
        Color::Black => Bitboard::RANK_1,
    };

    for from in pawns {
        for to in pawn_attacks(us, from) & enemy {
            if promo_rank.contains(to) {
                push_promotions(from, to, list);
            } else {
                list.push(Move::new(from, to));
            }
        }
    }

    let pushes = advance(pawns, us) & !board.occupied() & promo_rank;
    for to in pushes {
        push_promotions(to.offset(-us.forward()), to, list);
    }

    if let Some(ep) = board.en_passant() {
        for from in pawn_attacks(them, ep) & pawns {
            list.push(Move::en_passant(from, ep));
        }
    }
}

/// Single and double pushes that do not promote.
pub(super) fn gen_pawn_quiet(board: &Board, list: &mut MoveList) {
    let us = board.side_to_move();
    let pawns = board.colored(PieceKind::Pawn, us);
    let empty = !board.occupied();
    let (promo_rank, third_rank) = match us {
        Color::White => (Bitboard::RANK_8, Bitboard::RANK_3),
        Color::Black => (Bitboard::RANK_1, Bitboard::RANK_6),
    };

    let singles = advance(pawns, us) & empty & !promo_rank;
    let doubles = advance(singles & third_rank, us) & empty;

    for to in singles {
        list.push(Move::new(to.offset(-us.forward()), to));
    }
    for to in doubles {
        list.push(Move::new(to.offset(-2 * us.forward()), to));
    }
}
