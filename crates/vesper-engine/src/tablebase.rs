//! Endgame tablebase seam.
//!
//! The search asks a [`Tablebase`] for win/draw/loss results inside the tree
//! and for the set of result-preserving moves at the root. No probing code
//! ships with the engine; [`NoTablebase`] answers every probe with `None`.

use vesper_core::{Board, Move};

use crate::search::TBWIN;
use crate::search::tt::Bound;

/// Game-theoretic result for the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wdl {
    Loss,
    /// Lost, but drawn under the fifty-move rule.
    BlessedLoss,
    Draw,
    /// Won, but drawn under the fifty-move rule.
    CursedWin,
    Win,
}

impl Wdl {
    /// Search value and bound of a probed node `height` plies from the root.
    ///
    /// Wins and losses are bounds because the tablebase does not know the
    /// fastest way to convert them.
    pub fn to_score(self, height: usize) -> (i32, Bound) {
        let height = height as i32;
        match self {
            Wdl::Loss => (-TBWIN + height, Bound::Upper),
            Wdl::Win => (TBWIN - height, Bound::Lower),
            Wdl::BlessedLoss | Wdl::Draw | Wdl::CursedWin => (0, Bound::Exact),
        }
    }
}

/// Source of endgame tablebase results.
pub trait Tablebase: Send + Sync {
    /// Result of the position, if it is covered. `depth` and `height`
    /// locate the probing node in the search.
    fn probe_wdl(&self, board: &Board, depth: i32, height: usize) -> Option<Wdl>;

    /// Root moves that keep the tablebase result, if the root is covered.
    fn probe_dtz(&self, board: &Board) -> Option<Vec<Move>>;

    /// Largest number of pieces, kings included, the tables cover.
    fn max_pieces(&self) -> u32;

    /// Smallest remaining depth at which positions with exactly
    /// [`max_pieces`](Tablebase::max_pieces) pieces are looked up. Smaller
    /// material is looked up at any depth.
    fn probe_depth(&self) -> i32 {
        0
    }
}

/// No tablebases available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTablebase;

impl Tablebase for NoTablebase {
    fn probe_wdl(&self, _board: &Board, _depth: i32, _height: usize) -> Option<Wdl> {
        None
    }

    fn probe_dtz(&self, _board: &Board) -> Option<Vec<Move>> {
        None
    }

    fn max_pieces(&self) -> u32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use vesper_core::Board;

    use super::{NoTablebase, Tablebase, Wdl};
    use crate::search::TBWIN;
    use crate::search::tt::Bound;

    #[test]
    fn wdl_scores_are_height_adjusted() {
        assert_eq!(Wdl::Win.to_score(3), (TBWIN - 3, Bound::Lower));
        assert_eq!(Wdl::Loss.to_score(5), (-TBWIN + 5, Bound::Upper));
        assert_eq!(Wdl::CursedWin.to_score(2), (0, Bound::Exact));
        assert_eq!(Wdl::BlessedLoss.to_score(2), (0, Bound::Exact));
    }

    #[test]
    fn no_tablebase_never_answers() {
        let board = Board::starting_position();
        assert_eq!(NoTablebase.probe_wdl(&board, 5, 1), None);
        assert_eq!(NoTablebase.probe_dtz(&board), None);
        assert_eq!(NoTablebase.max_pieces(), 0);
        assert_eq!(NoTablebase.probe_depth(), 0);
    }
}
