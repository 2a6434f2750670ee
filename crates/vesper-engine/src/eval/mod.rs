//! Static evaluation: tapered material plus piece-square tables.

pub mod material;
pub mod phase;
pub mod pst;
pub mod score;

use vesper_core::{Board, Color};

use self::material::material;
use self::phase::{MAX_PHASE, game_phase};
use self::pst::pst_value;

/// Static evaluation seam consumed by the search.
///
/// Implementations must be side-to-move relative and colour-symmetric.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, board: &Board) -> i32;
}

/// The built-in hand-crafted evaluator.
#[derive(Debug, Default, Clone, Copy)]
pub struct Classical;

impl Evaluator for Classical {
    #[inline]
    fn evaluate(&self, board: &Board) -> i32 {
        evaluate(board)
    }
}

/// Evaluate `board` in centipawns for the side to move.
pub fn evaluate(board: &Board) -> i32 {
    let mut score = material(board);
    for sq in board.occupied() {
        if let Some(piece) = board.piece_on(sq) {
            let bonus = pst_value(piece.kind(), piece.color(), sq);
            match piece.color() {
                Color::White => score += bonus,
                Color::Black => score -= bonus,
            }
        }
    }
    let white = score.taper(game_phase(board), MAX_PHASE);
    match board.side_to_move() {
        Color::White => white,
        Color::Black => -white,
    }
}

#[cfg(test)]
mod tests {
    use vesper_core::Board;

    use super::evaluate;

    #[test]
    fn starting_position_is_zero() {
        assert_eq!(evaluate(&Board::starting_position()), 0);
    }

    #[test]
    fn mirrored_positions_evaluate_equally() {
        let white: Board = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3".parse().unwrap();
        let black: Board = "rnbqkb1r/pppp1ppp/5n2/4p3/4P3/2N5/PPPP1PPP/R1BQKBNR b KQkq - 2 3".parse().unwrap();
        assert_eq!(evaluate(&white), evaluate(&black));
    }

    #[test]
    fn side_to_move_flips_sign() {
        let white: Board = "4k3/8/8/8/8/8/8/3QK3 w - - 0 1".parse().unwrap();
        let black: Board = "4k3/8/8/8/8/8/8/3QK3 b - - 0 1".parse().unwrap();
        assert!(evaluate(&white) > 900);
        assert_eq!(evaluate(&white), -evaluate(&black));
    }
}
