//! Game phase from remaining non-pawn material.

use vesper_core::{Board, PieceKind};

/// Phase of the starting position: knights and bishops weigh 1, rooks 2, queens 4.
pub const MAX_PHASE: i32 = 24;

/// Returns `0..=MAX_PHASE`; promotions cannot push it past the maximum.
pub fn game_phase(board: &Board) -> i32 {
    let minors = (board.pieces(PieceKind::Knight) | board.pieces(PieceKind::Bishop)).count() as i32;
    let rooks = board.pieces(PieceKind::Rook).count() as i32;
    let queens = board.pieces(PieceKind::Queen).count() as i32;
    (minors + 2 * rooks + 4 * queens).min(MAX_PHASE)
}

#[cfg(test)]
mod tests {
    use vesper_core::Board;

    use super::{MAX_PHASE, game_phase};

    #[test]
    fn starting_position_is_max_phase() {
        assert_eq!(game_phase(&Board::starting_position()), MAX_PHASE);
    }

    #[test]
    fn pawn_ending_is_zero() {
        let board: Board = "8/4p3/4k3/8/8/4K3/4P3/8 w - - 0 1".parse().unwrap();
        assert_eq!(game_phase(&board), 0);
    }

    #[test]
    fn queenless_middlegame() {
        let board: Board = "rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNB1KBNR w KQkq - 0 1".parse().unwrap();
        assert_eq!(game_phase(&board), 16);
    }
}
