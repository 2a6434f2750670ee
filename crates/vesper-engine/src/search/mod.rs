//! Parallel alpha-beta search: negamax, quiescence, move ordering and the
//! lazy SMP driver around them.

pub mod control;
pub mod driver;
pub mod history;
pub mod limits;
pub mod negamax;
pub mod params;
pub mod picker;
pub mod pool;
pub mod see;
pub mod stack;
pub mod time;
pub mod tt;
pub mod worker;

use std::time::Duration;

use vesper_core::Move;

/// Score of delivering mate at the root.
pub const MATE: i32 = 32_000;
/// Deepest ply the search can reach.
pub const MAX_PLY: usize = 128;
/// Any score at or above this is a forced mate.
pub const MATE_IN_MAX: i32 = MATE - MAX_PLY as i32;
/// Score of a tablebase win at the root.
pub const TBWIN: i32 = 31_000;
pub const TBWIN_IN_MAX: i32 = TBWIN - MAX_PLY as i32;
/// Marks a missing static evaluation.
pub const VALUE_NONE: i32 = MATE + 1;

/// The search was cancelled by the stop flag or the clock.
///
/// Returned through every recursive frame with `?`; whatever the aborted
/// iteration computed is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aborted;

/// True for scores that encode a forced mate for either side.
#[inline]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_IN_MAX
}

/// A principal variation with the score it was searched to.
#[derive(Clone)]
pub struct PrincipalVariation {
    line: [Move; MAX_PLY],
    len: usize,
    pub score: i32,
}

impl PrincipalVariation {
    pub const fn new() -> PrincipalVariation {
        PrincipalVariation { line: [Move::NONE; MAX_PLY], len: 0, score: 0 }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[inline]
    pub fn moves(&self) -> &[Move] {
        &self.line[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First move of the line, or [`Move::NONE`].
    #[inline]
    pub fn first(&self) -> Move {
        self.moves().first().copied().unwrap_or(Move::NONE)
    }

    /// Reset the line to a single move.
    pub fn set_single(&mut self, mv: Move) {
        self.line[0] = mv;
        self.len = 1;
    }

    /// Make this line `mv` followed by `child`.
    pub fn update(&mut self, mv: Move, child: &PrincipalVariation) {
        let tail = child.len.min(MAX_PLY - 1);
        debug_assert!(child.len < MAX_PLY, "principal variation overflow");
        self.line[0] = mv;
        self.line[1..=tail].copy_from_slice(&child.line[..tail]);
        self.len = tail + 1;
    }
}

impl Default for PrincipalVariation {
    fn default() -> Self {
        PrincipalVariation::new()
    }
}

impl std::fmt::Debug for PrincipalVariation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrincipalVariation")
            .field("score", &self.score)
            .field("line", &self.moves())
            .finish()
    }
}

/// How a reported score relates to the true value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBound {
    Exact,
    /// The search failed high; the true score is at least this.
    Lower,
    /// The search failed low; the true score is at most this.
    Upper,
}

impl ScoreBound {
    /// Classify `score` against the aspiration window it came from.
    pub fn classify(score: i32, alpha: i32, beta: i32) -> ScoreBound {
        if score >= beta {
            ScoreBound::Lower
        } else if score <= alpha {
            ScoreBound::Upper
        } else {
            ScoreBound::Exact
        }
    }
}

/// One line of progress, produced by the main worker for the protocol layer.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub depth: i32,
    pub seldepth: usize,
    /// 1-based index of the line among the requested best lines.
    pub multipv: usize,
    pub score: i32,
    pub bound: ScoreBound,
    pub elapsed: Duration,
    /// Summed over all workers.
    pub nodes: u64,
    pub tbhits: u64,
    /// Per-mille occupancy of the transposition table.
    pub hashfull: usize,
    pub pv: Vec<Move>,
}

/// Result of a completed search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best move found at the highest completed depth, [`Move::NONE`] if the
    /// root has no legal move.
    pub best_move: Move,
    /// Second move of the chosen line, the expected reply.
    pub ponder_move: Option<Move>,
    /// Full principal variation of the chosen worker.
    pub pv: Vec<Move>,
    /// Score in centipawns from the side to move's point of view.
    pub score: i32,
    /// Total nodes visited by all workers.
    pub nodes: u64,
    /// Depth reached by the chosen worker.
    pub depth: i32,
}
