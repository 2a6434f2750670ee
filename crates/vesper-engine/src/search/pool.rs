//! Lazy SMP thread pool.
//!
//! Every worker searches the same root independently; the only thing they
//! share is the transposition table. The main worker runs on the calling
//! thread, helpers on scoped threads that are aborted and joined once the
//! main worker is done.

use std::time::Duration;

use tracing::{debug, info, warn};
use vesper_core::{Board, Move};

use crate::eval::{Classical, Evaluator};
use crate::search::control::SearchControl;
use crate::search::limits::SearchLimits;
use crate::search::time::TimeManager;
use crate::search::tt::TranspositionTable;
use crate::search::worker::{SearchShared, Worker, WorkerCounters};
use crate::search::{MATE, MATE_IN_MAX, ScoreBound, SearchReport, SearchResult};
use crate::tablebase::{NoTablebase, Tablebase};

/// Stack reserved for every search thread.
pub const SEARCH_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Clock time kept in reserve for communication lag, by default.
pub const DEFAULT_MOVE_OVERHEAD: Duration = Duration::from_millis(100);

/// Owns the workers, the shared transposition table and the evaluation and
/// tablebase collaborators.
pub struct ThreadPool {
    tt: TranspositionTable,
    workers: Vec<Worker>,
    evaluator: Box<dyn Evaluator>,
    tablebase: Box<dyn Tablebase>,
    move_overhead: Duration,
}

impl ThreadPool {
    /// A single-threaded pool with a `hash_mb` MB transposition table.
    pub fn new(hash_mb: usize) -> Self {
        Self {
            tt: TranspositionTable::new(hash_mb),
            workers: vec![Worker::new(0)],
            evaluator: Box::new(Classical),
            tablebase: Box::new(NoTablebase),
            move_overhead: DEFAULT_MOVE_OVERHEAD,
        }
    }

    /// Use `threads` workers. Existing workers keep their history.
    pub fn set_threads(&mut self, threads: usize) {
        let threads = threads.max(1);
        self.workers.truncate(threads);
        while self.workers.len() < threads {
            self.workers.push(Worker::new(self.workers.len()));
        }
        info!(threads, "thread pool resized");
    }

    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Replace the transposition table with an empty one of `mb` MB.
    pub fn resize_tt(&mut self, mb: usize) {
        self.tt = TranspositionTable::new(mb);
    }

    /// Forget everything learned so far, for a new game.
    pub fn clear(&mut self) {
        self.tt.clear();
        self.workers.iter_mut().for_each(Worker::clear);
        debug!("transposition table and histories cleared");
    }

    pub fn set_move_overhead(&mut self, overhead: Duration) {
        self.move_overhead = overhead;
    }

    pub fn set_evaluator(&mut self, evaluator: Box<dyn Evaluator>) {
        self.evaluator = evaluator;
    }

    pub fn set_tablebase(&mut self, tablebase: Box<dyn Tablebase>) {
        self.tablebase = tablebase;
    }

    /// Per-mille occupancy of the transposition table.
    pub fn hashfull(&self) -> usize {
        self.tt.hashfull()
    }

    /// Search `board` within `limits` and return the best move.
    ///
    /// Blocks until the main worker stops. `report` receives the main
    /// worker's progress after every finished iteration or line.
    pub fn get_best_move(
        &mut self,
        board: &Board,
        limits: &SearchLimits,
        control: &SearchControl,
        mut report: impl FnMut(&SearchReport),
    ) -> SearchResult {
        self.tt.new_generation();

        let root_moves = self.root_moves(board, limits);
        if root_moves.is_empty() {
            let score = if board.in_check() { -MATE } else { 0 };
            debug!(score, "no legal moves at the root");
            return SearchResult { best_move: Move::NONE, ponder_move: None, pv: Vec::new(), score, nodes: 0, depth: 0 };
        }

        let multi_pv = limits.multi_pv.clamp(1, root_moves.len());
        let tm = TimeManager::new(limits, self.move_overhead, self.workers.len());
        let counters: Vec<WorkerCounters> = self.workers.iter().map(|_| WorkerCounters::default()).collect();
        let shared = SearchShared {
            tt: &self.tt,
            limits,
            control,
            tm: &tm,
            evaluator: self.evaluator.as_ref(),
            tablebase: self.tablebase.as_ref(),
            root_moves: &root_moves,
            multi_pv,
            counters: &counters,
        };

        for worker in &mut self.workers {
            worker.prepare(board, multi_pv);
        }
        debug!(
            threads = self.workers.len(),
            multi_pv,
            root_moves = root_moves.len(),
            ideal = ?tm.ideal_usage(),
            "search started"
        );

        debug_assert!(!self.workers.is_empty());
        let (main, helpers) = self.workers.split_at_mut(1);

        std::thread::scope(|s| {
            for helper in helpers.iter_mut() {
                let shared = &shared;
                let spawned = std::thread::Builder::new()
                    .name(format!("search-{}", helper.index()))
                    .stack_size(SEARCH_STACK_SIZE)
                    .spawn_scoped(s, move || helper.iterative_deepening(shared, &mut |_: &SearchReport| {}));
                if let Err(err) = spawned {
                    warn!(%err, "failed to spawn search helper");
                }
            }

            main[0].iterative_deepening(&shared, &mut report);
            control.abort();
        });

        let chosen = select_worker(&self.workers);
        let worker = &self.workers[chosen];
        let line = worker.best_line();

        if chosen != 0 {
            report(&worker.progress(&shared, worker.completed_depth() as i32, 1, line, ScoreBound::Exact));
        }

        let best_move = match line.first() {
            Move::NONE => root_moves[0],
            mv => mv,
        };
        let nodes = shared.total_nodes();
        debug!(worker = chosen, depth = worker.completed_depth(), score = line.score, nodes, "search finished");

        SearchResult {
            best_move,
            ponder_move: line.moves().get(1).copied(),
            pv: line.moves().to_vec(),
            score: line.score,
            nodes,
            depth: worker.completed_depth() as i32,
        }
    }

    /// Legal root moves after `searchmoves` and excluded moves are applied.
    /// When the filters leave nothing, every legal move is searched.
    fn root_moves(&self, board: &Board, limits: &SearchLimits) -> Vec<Move> {
        let legal: Vec<Move> = board.legal_moves().iter().collect();

        let mut moves: Vec<Move> = legal
            .iter()
            .copied()
            .filter(|mv| limits.search_moves.is_empty() || limits.search_moves.contains(mv))
            .filter(|mv| !limits.excluded_moves.contains(mv))
            .collect();
        if moves.is_empty() {
            moves = legal;
        }

        // Keep only moves that preserve the tablebase result.
        if limits.search_moves.is_empty() && limits.multi_pv == 1 {
            if let Some(preserving) = self.tablebase.probe_dtz(board) {
                let refined: Vec<Move> = moves.iter().copied().filter(|mv| preserving.contains(mv)).collect();
                if !refined.is_empty() {
                    debug!(moves = refined.len(), "root moves refined by tablebase");
                    moves = refined;
                }
            }
        }

        moves
    }
}

/// Index of the worker whose result is played.
///
/// A worker replaces the current choice when it completed the same depth
/// with a higher score, found a faster mate, or completed a greater depth
/// without giving up a mate.
fn select_worker(workers: &[Worker]) -> usize {
    let mut best = 0;
    for (index, worker) in workers.iter().enumerate().skip(1) {
        let best_depth = workers[best].completed_depth();
        let best_score = workers[best].best_line().score;
        let this_depth = worker.completed_depth();
        let this_score = worker.best_line().score;

        if (this_depth == best_depth && this_score > best_score)
            || (this_score > MATE_IN_MAX && this_score > best_score)
            || (this_depth > best_depth && (this_score > best_score || best_score < MATE_IN_MAX))
        {
            best = index;
        }
    }
    best
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("tt", &self.tt)
            .field("threads", &self.workers.len())
            .field("move_overhead", &self.move_overhead)
            .finish()
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new(16)
    }
}
