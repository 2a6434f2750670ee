//! Per-search limits, built by the protocol layer from a `go` command.

use std::time::Duration;

use vesper_core::Move;

/// What one search may spend and which root moves it may consider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: Option<i32>,
    /// Fixed time for this move.
    pub movetime: Option<Duration>,
    /// Remaining clock time of the side to move.
    pub time: Option<Duration>,
    pub increment: Duration,
    pub moves_to_go: Option<u32>,
    pub nodes: Option<u64>,
    /// Restrict the root to these moves; empty means all moves.
    pub search_moves: Vec<Move>,
    /// Never play these moves at the root.
    pub excluded_moves: Vec<Move>,
    /// Number of best lines to search and report.
    pub multi_pv: usize,
    pub infinite: bool,
    pub ponder: bool,
}

impl SearchLimits {
    /// Search exactly `depth` plies.
    pub fn depth(depth: i32) -> Self {
        Self { depth: Some(depth), ..Self::default() }
    }

    /// Search for a fixed amount of time.
    pub fn movetime(movetime: Duration) -> Self {
        Self { movetime: Some(movetime), ..Self::default() }
    }

    /// The engine manages its own clock: time was given and nothing else
    /// bounds the search.
    pub fn limited_by_self(&self) -> bool {
        self.time.is_some() && !self.limited_by_depth() && !self.limited_by_time() && !self.limited_by_nodes() && !self.infinite
    }

    pub fn limited_by_depth(&self) -> bool {
        self.depth.is_some()
    }

    /// A fixed `movetime` was given.
    pub fn limited_by_time(&self) -> bool {
        self.movetime.is_some()
    }

    pub fn limited_by_nodes(&self) -> bool {
        self.nodes.is_some()
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            depth: None,
            movetime: None,
            time: None,
            increment: Duration::ZERO,
            moves_to_go: None,
            nodes: None,
            search_moves: Vec::new(),
            excluded_moves: Vec::new(),
            multi_pv: 1,
            infinite: false,
            ponder: false,
        }
    }
}
