//! One lazy SMP search thread.
//!
//! A [`Worker`] owns everything a thread mutates during search: its copy of
//! the root position, the undo records, the node stack, move ordering
//! history and the results of each completed iteration. Everything shared
//! between threads lives in [`SearchShared`] and is only read, apart from
//! the lock-free transposition table and the published counters.

use std::sync::atomic::{AtomicU64, Ordering};

use vesper_core::{Board, Move, PieceKind, Undo};

use crate::eval::Evaluator;
use crate::search::control::SearchControl;
use crate::search::history::{ContKey, History};
use crate::search::limits::SearchLimits;
use crate::search::stack::{NodeState, STACK_OFFSET, STACK_SIZE, new_stack, reset_stack};
use crate::search::time::TimeManager;
use crate::search::tt::TranspositionTable;
use crate::search::{Aborted, MAX_PLY, PrincipalVariation};
use crate::tablebase::{Tablebase, Wdl};

/// Nodes are published and the clock consulted every this many nodes.
const POLL_INTERVAL: u64 = 1024;

/// Counters a worker publishes for progress reports.
#[derive(Debug, Default)]
pub struct WorkerCounters {
    nodes: AtomicU64,
    tbhits: AtomicU64,
}

impl WorkerCounters {
    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    pub fn tbhits(&self) -> u64 {
        self.tbhits.load(Ordering::Relaxed)
    }
}

/// State of one search that every worker reads.
pub struct SearchShared<'a> {
    pub tt: &'a TranspositionTable,
    pub limits: &'a SearchLimits,
    pub control: &'a SearchControl,
    pub tm: &'a TimeManager,
    pub evaluator: &'a dyn Evaluator,
    pub tablebase: &'a dyn Tablebase,
    /// Root moves the search may play.
    pub root_moves: &'a [Move],
    /// Number of lines to search, already capped by the root move count.
    pub multi_pv: usize,
    /// One entry per worker, indexed by worker index.
    pub counters: &'a [WorkerCounters],
}

impl SearchShared<'_> {
    #[inline]
    pub fn is_root_move(&self, mv: Move) -> bool {
        self.root_moves.contains(&mv)
    }

    pub fn total_nodes(&self) -> u64 {
        self.counters.iter().map(WorkerCounters::nodes).sum()
    }

    pub fn total_tbhits(&self) -> u64 {
        self.counters.iter().map(WorkerCounters::tbhits).sum()
    }
}

/// A search thread and the state it keeps between searches.
///
/// Move ordering history survives from one search to the next and is only
/// reset by [`Worker::clear`]. Everything else is reset by
/// [`Worker::prepare`].
pub struct Worker {
    pub(super) index: usize,
    pub(super) board: Board,
    undos: Vec<Undo>,
    pub(super) history: History,
    pub(super) stack: Vec<NodeState>,
    /// Distance from the root of the node being searched.
    pub(super) height: usize,
    pub(super) nodes: u64,
    pub(super) tbhits: u64,
    pub(super) seldepth: usize,
    /// Iteration currently being searched.
    pub(super) depth: i32,
    /// Deepest iteration with a trusted result in `pvs`.
    pub(super) completed: usize,
    /// Best line of each iteration, indexed by depth.
    pub(super) pvs: Vec<PrincipalVariation>,
    /// Latest result of each line of a multi-PV search.
    pub(super) mpvs: Vec<PrincipalVariation>,
    /// First move of each finished line; later lines skip them at the root.
    pub(super) best_moves: Vec<Move>,
    /// Index of the line being searched.
    pub(super) multi_pv: usize,
    /// Nodes spent below each root move, keyed by from/to squares.
    pub(super) root_nodes: Vec<u64>,
}

impl Worker {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            board: Board::starting_position(),
            undos: Vec::with_capacity(STACK_SIZE),
            history: History::new(),
            stack: new_stack(),
            height: 0,
            nodes: 0,
            tbhits: 0,
            seldepth: 0,
            depth: 0,
            completed: 0,
            pvs: vec![PrincipalVariation::new(); MAX_PLY + 1],
            mpvs: Vec::new(),
            best_moves: Vec::new(),
            multi_pv: 0,
            root_nodes: vec![0; 64 * 64],
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn is_main(&self) -> bool {
        self.index == 0
    }

    /// Forget all move ordering history, for a new game.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Reset per-search state and take a copy of the root position.
    pub fn prepare(&mut self, board: &Board, lines: usize) {
        self.board = board.clone();
        self.undos.clear();
        self.height = 0;
        reset_stack(&mut self.stack);
        self.nodes = 0;
        self.tbhits = 0;
        self.seldepth = 0;
        self.depth = 0;
        self.completed = 0;
        self.pvs.iter_mut().for_each(|pv| *pv = PrincipalVariation::new());
        self.mpvs = vec![PrincipalVariation::new(); lines];
        self.best_moves = vec![Move::NONE; lines];
        self.multi_pv = 0;
        self.root_nodes.fill(0);
    }

    /// Deepest completed iteration.
    pub fn completed_depth(&self) -> usize {
        self.completed
    }

    /// Best line of the deepest completed iteration.
    pub fn best_line(&self) -> &PrincipalVariation {
        &self.pvs[self.completed]
    }

    /// Play `mv` on the worker's board, recording it in the node stack.
    /// Returns `false`, with the board untouched, if `mv` is illegal.
    pub(super) fn apply(&mut self, mv: Move) -> bool {
        let piece = self.board.piece_on(mv.from()).map_or(PieceKind::Pawn, |p| p.kind());
        let tactical = self.board.is_tactical(mv);
        let Some(undo) = self.board.apply(mv) else {
            return false;
        };

        let ns = &mut self.stack[self.height + STACK_OFFSET];
        ns.mv = mv;
        ns.tactical = tactical;
        ns.continuation = Some(ContKey { tactical, piece, to: mv.to() });

        self.undos.push(undo);
        self.height += 1;
        true
    }

    pub(super) fn revert(&mut self, mv: Move) {
        self.height -= 1;
        debug_assert!(!self.undos.is_empty(), "revert without apply");
        if let Some(undo) = self.undos.pop() {
            self.board.revert(mv, &undo);
        }
    }

    pub(super) fn apply_null(&mut self) {
        let undo = self.board.apply_null();

        let ns = &mut self.stack[self.height + STACK_OFFSET];
        ns.mv = Move::NULL;
        ns.tactical = false;
        ns.continuation = None;

        self.undos.push(undo);
        self.height += 1;
    }

    pub(super) fn revert_null(&mut self) {
        self.height -= 1;
        if let Some(undo) = self.undos.pop() {
            self.board.revert_null(&undo);
        }
    }

    /// Count a node and check whether the search has to stop.
    ///
    /// The abort flag is ignored during the first iteration so that every
    /// search produces a move.
    #[inline]
    pub(super) fn poll(&mut self, shared: &SearchShared<'_>) -> Result<(), Aborted> {
        self.nodes += 1;

        if self.depth > 1 && shared.control.should_abort() {
            return Err(Aborted);
        }

        if self.nodes % POLL_INTERVAL == 0 {
            self.publish(shared);
            if !shared.control.is_pondering()
                && shared.tm.should_stop_early(self.nodes, self.depth, shared.control.elapsed())
            {
                return Err(Aborted);
            }
        }
        Ok(())
    }

    /// Make the node and tablebase counters visible to other threads.
    pub(super) fn publish(&self, shared: &SearchShared<'_>) {
        let counters = &shared.counters[self.index];
        counters.nodes.store(self.nodes, Ordering::Relaxed);
        counters.tbhits.store(self.tbhits, Ordering::Relaxed);
    }

    /// Score of a drawn position: +1 or -1, varied by the node count.
    #[inline]
    pub(super) fn draw_score(&self) -> i32 {
        1 - (self.nodes & 2) as i32
    }

    #[inline]
    pub(super) fn evaluate(&self, shared: &SearchShared<'_>) -> i32 {
        shared.evaluator.evaluate(&self.board)
    }

    /// Probe the tablebases inside the tree. Only positions without
    /// castling rights, right after a capture or pawn move, and small enough
    /// for the tables are probed. Positions at the largest covered size also
    /// need at least the tablebase's probe depth left.
    pub(super) fn probe_wdl(&mut self, shared: &SearchShared<'_>, depth: i32) -> Option<Wdl> {
        let board = &self.board;
        let pieces = board.occupied().count();
        let max_pieces = shared.tablebase.max_pieces();
        if !board.castling().is_empty()
            || board.halfmove_clock() != 0
            || pieces > max_pieces
            || (pieces == max_pieces && depth < shared.tablebase.probe_depth())
        {
            return None;
        }
        let wdl = shared.tablebase.probe_wdl(board, depth, self.height)?;
        self.tbhits += 1;
        Some(wdl)
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("index", &self.index)
            .field("nodes", &self.nodes)
            .field("depth", &self.depth)
            .field("completed", &self.completed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use vesper_core::{Board, Move, PieceKind, Square};

    use super::Worker;
    use crate::search::stack::STACK_OFFSET;

    #[test]
    fn apply_records_node_state_and_revert_restores() {
        let mut worker = Worker::new(0);
        worker.prepare(&Board::starting_position(), 1);
        let hash = worker.board.hash();

        let mv = Move::new(Square::new(6, 0), Square::new(5, 2));
        assert!(worker.apply(mv));
        assert_eq!(worker.height, 1);
        let ns = &worker.stack[STACK_OFFSET];
        assert_eq!(ns.mv, mv);
        assert!(!ns.tactical);
        let key = ns.continuation.expect("continuation key");
        assert_eq!(key.piece, PieceKind::Knight);
        assert_eq!(key.to, Square::new(5, 2));

        worker.revert(mv);
        assert_eq!(worker.height, 0);
        assert_eq!(worker.board.hash(), hash);
    }

    #[test]
    fn illegal_move_is_rejected_without_side_effects() {
        let board: Board = "4k3/8/8/8/8/8/3r4/4K3 w - - 0 1".parse().unwrap();
        let mut worker = Worker::new(0);
        worker.prepare(&board, 1);

        // f2 is covered by the rook along the second rank.
        assert!(!worker.apply(Move::new(Square::E1, Square::new(5, 1))));
        assert_eq!(worker.height, 0);
        assert_eq!(worker.board.hash(), board.hash());

        assert!(worker.apply(Move::new(Square::E1, Square::F1)));
        assert_eq!(worker.height, 1);
    }

    #[test]
    fn null_move_clears_continuation() {
        let mut worker = Worker::new(0);
        worker.prepare(&Board::starting_position(), 1);
        worker.apply_null();
        let ns = &worker.stack[STACK_OFFSET];
        assert_eq!(ns.mv, Move::NULL);
        assert!(ns.continuation.is_none());
        worker.revert_null();
        assert_eq!(worker.height, 0);
        assert_eq!(worker.board.hash(), Board::starting_position().hash());
    }

    #[test]
    fn draw_score_alternates_around_zero() {
        let mut worker = Worker::new(0);
        worker.nodes = 0;
        assert_eq!(worker.draw_score(), 1);
        worker.nodes = 2;
        assert_eq!(worker.draw_score(), -1);
    }
}
