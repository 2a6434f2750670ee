//! Material balance from White's point of view.

use vesper_core::{Board, Color, PieceKind};

use crate::eval::score::{S, Score};

/// Indexed by [`PieceKind::index`].
pub const MATERIAL_VALUE: [Score; PieceKind::COUNT] = [
    S(90, 120),
    S(330, 340),
    S(350, 360),
    S(480, 560),
    S(1000, 1080),
    S(0, 0),
];

pub const BISHOP_PAIR: Score = S(30, 60);

pub fn material(board: &Board) -> Score {
    let mut score = Score::ZERO;
    for kind in PieceKind::ALL {
        let white = board.colored(kind, Color::White).count() as i16;
        let black = board.colored(kind, Color::Black).count() as i16;
        score += MATERIAL_VALUE[kind.index()] * (white - black);
    }
    if board.colored(PieceKind::Bishop, Color::White).has_several() {
        score += BISHOP_PAIR;
    }
    if board.colored(PieceKind::Bishop, Color::Black).has_several() {
        score -= BISHOP_PAIR;
    }
    score
}

#[cfg(test)]
mod tests {
    use vesper_core::{Board, PieceKind};

    use super::{BISHOP_PAIR, MATERIAL_VALUE, material};
    use crate::eval::score::Score;

    #[test]
    fn starting_position_is_balanced() {
        assert_eq!(material(&Board::starting_position()), Score::ZERO);
    }

    #[test]
    fn missing_queen_counts_against_its_owner() {
        let board: Board = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNB1KBNR w KQkq - 0 1".parse().unwrap();
        assert_eq!(material(&board), -MATERIAL_VALUE[PieceKind::Queen.index()]);
    }

    #[test]
    fn lone_bishop_pair_gets_bonus() {
        let board: Board = "rn1qk1nr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".parse().unwrap();
        assert_eq!(material(&board), MATERIAL_VALUE[PieceKind::Bishop.index()] * 2 + BISHOP_PAIR);
    }
}
