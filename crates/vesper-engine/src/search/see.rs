//! Static Exchange Evaluation (SEE).
//!
//! Answers whether a capture sequence on one square, each side always
//! recapturing with its least valuable attacker, nets at least a threshold
//! for the side to move. Also provides the move value estimates used by
//! quiescence pruning.

use vesper_core::{Bitboard, Board, Color, Move, MoveClass, PieceKind, bishop_attacks, rook_attacks};

/// Material values for SEE, indexed by `PieceKind::index()`. The king is
/// worth nothing so that capturing it never looks profitable.
pub const SEE_VALUE: [i32; 6] = [100, 450, 450, 675, 1300, 0];

#[inline]
fn value_of(kind: PieceKind) -> i32 {
    SEE_VALUE[kind.index()]
}

/// Material a move wins on its own, ignoring recaptures.
pub fn estimated_value(board: &Board, mv: Move) -> i32 {
    match mv.class() {
        MoveClass::Castle => 0,
        MoveClass::EnPassant => value_of(PieceKind::Pawn),
        MoveClass::Normal | MoveClass::Promotion => {
            let captured = board.piece_on(mv.to()).map_or(0, |p| value_of(p.kind()));
            let promoted = mv.promotion_piece().map_or(0, |promo| value_of(promo) - value_of(PieceKind::Pawn));
            captured + promoted
        }
    }
}

/// Most material any single move could win here: the best enemy piece,
/// plus a promotion if one of our pawns stands on the seventh rank.
pub fn best_case_value(board: &Board) -> i32 {
    let us = board.side_to_move();
    let theirs = board.side(!us);
    let target = [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight]
        .into_iter()
        .find(|&kind| (board.pieces(kind) & theirs).is_nonempty())
        .map_or(value_of(PieceKind::Pawn), value_of);

    let seventh = match us {
        Color::White => Bitboard::RANK_7,
        Color::Black => Bitboard::RANK_2,
    };
    if (board.colored(PieceKind::Pawn, us) & seventh).is_nonempty() {
        target + value_of(PieceKind::Queen) - value_of(PieceKind::Pawn)
    } else {
        target
    }
}

/// True if playing `mv` wins at least `threshold` once all exchanges on
/// the destination square are resolved.
pub fn see(board: &Board, mv: Move, threshold: i32) -> bool {
    let from = mv.from();
    let to = mv.to();
    let us = board.side_to_move();

    let mut next_victim = mv
        .promotion_piece()
        .unwrap_or_else(|| board.piece_on(from).map_or(PieceKind::Pawn, |p| p.kind()));

    let mut balance = estimated_value(board, mv) - threshold;
    if balance < 0 {
        return false;
    }

    balance -= value_of(next_victim);
    if balance >= 0 {
        return true;
    }

    let mut occupied = (board.occupied() ^ from.bitboard()) | to.bitboard();
    if mv.is_en_passant() {
        occupied ^= to.offset(-us.forward()).bitboard();
    }

    let queens = board.pieces(PieceKind::Queen);
    let diagonal = board.pieces(PieceKind::Bishop) | queens;
    let straight = board.pieces(PieceKind::Rook) | queens;

    let mut attackers = board.attackers_to(to, occupied) & occupied;
    let mut color = !us;

    loop {
        let ours = attackers & board.side(color);
        if ours.is_empty() {
            break;
        }

        next_victim = PieceKind::ALL
            .into_iter()
            .find(|&kind| (ours & board.pieces(kind)).is_nonempty())
            .unwrap_or(PieceKind::King);
        if let Some(sq) = (ours & board.pieces(next_victim)).lsb() {
            occupied ^= sq.bitboard();
        }

        if matches!(next_victim, PieceKind::Pawn | PieceKind::Bishop | PieceKind::Queen) {
            attackers |= bishop_attacks(to, occupied) & diagonal;
        }
        if matches!(next_victim, PieceKind::Rook | PieceKind::Queen) {
            attackers |= rook_attacks(to, occupied) & straight;
        }
        attackers &= occupied;

        color = !color;
        balance = -balance - 1 - value_of(next_victim);

        if balance >= 0 {
            // A king cannot recapture into a defended square.
            if next_victim == PieceKind::King && (attackers & board.side(color)).is_nonempty() {
                color = !color;
            }
            break;
        }
    }

    // The side left to move after the exchanges is the one that lost it.
    color != us
}
