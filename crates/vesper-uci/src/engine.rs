//! Event-driven UCI engine with a background search thread.

use std::io::{self, BufRead};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use vesper_core::{Board, divide};
use vesper_engine::{DEFAULT_MOVE_OVERHEAD, SEARCH_STACK_SIZE, SearchControl, SearchResult, ThreadPool};

use crate::command::{
    Command, GoParams, HASH_RANGE, MOVE_OVERHEAD_RANGE, MULTI_PV_RANGE, THREADS_RANGE, UciOption, parse_command,
};
use crate::error::UciError;
use crate::info::{format_bestmove, format_info};

/// How often a finished infinite or ponder search checks whether it may
/// announce its move.
const WAIT_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration knobs adjustable via `setoption`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EngineConfig {
    hash_mb: usize,
    threads: usize,
    multi_pv: usize,
    move_overhead: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { hash_mb: 16, threads: 1, multi_pv: 1, move_overhead: DEFAULT_MOVE_OVERHEAD }
    }
}

/// Events processed by the main engine loop.
enum EngineEvent {
    UciCommand(Result<Command, UciError>),
    SearchDone(SearchDone),
    InputClosed,
}

/// Payload returned by the search thread when it finishes.
struct SearchDone {
    result: SearchResult,
    pool: ThreadPool,
}

/// The UCI engine, holding the current position and the thread pool.
///
/// The pool moves to the search thread for the duration of a search and
/// comes back with the result. Options and `ucinewgame` received in the
/// meantime are applied when it returns.
pub struct UciEngine {
    board: Board,
    pool: Option<ThreadPool>,
    control: Option<Arc<SearchControl>>,
    config: EngineConfig,
    /// Hash size of the table the pool currently holds.
    applied_hash_mb: usize,
    pending_clear: bool,
}

impl UciEngine {
    /// Create a new engine with the starting position.
    pub fn new() -> Self {
        let config = EngineConfig::default();
        Self {
            board: Board::starting_position(),
            pool: Some(ThreadPool::new(config.hash_mb)),
            control: None,
            config,
            applied_hash_mb: config.hash_mb,
            pending_clear: false,
        }
    }

    /// Run the UCI event loop, reading from stdin until `quit` or input closes.
    pub fn run(mut self) -> Result<(), UciError> {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        let stdin_tx = tx.clone();
        thread::Builder::new().name("stdin".to_string()).spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                debug!(cmd = %line, "received UCI command");
                if stdin_tx.send(EngineEvent::UciCommand(parse_command(line))).is_err() {
                    return;
                }
            }
            let _ = stdin_tx.send(EngineEvent::InputClosed);
        })?;

        for event in &rx {
            match event {
                EngineEvent::UciCommand(Ok(cmd)) => match cmd {
                    Command::Uci => self.handle_uci(),
                    Command::IsReady => println!("readyok"),
                    Command::UciNewGame => self.handle_ucinewgame(),
                    Command::Position(board) => self.board = *board,
                    Command::Go(params) => self.handle_go(params, &tx),
                    Command::SetOption(option) => self.handle_setoption(option),
                    Command::PonderHit => self.handle_ponderhit(),
                    Command::Stop => self.handle_stop(),
                    Command::Quit => break,
                    Command::Unknown(cmd) => {
                        if !cmd.is_empty() {
                            debug!(%cmd, "ignoring unknown command");
                        }
                    }
                },
                EngineEvent::UciCommand(Err(err)) => warn!(%err, "UCI parse error"),
                EngineEvent::SearchDone(done) => self.finish_search(done),
                EngineEvent::InputClosed => break,
            }
        }

        // Let a running search end cleanly before exiting.
        if self.control.is_some() {
            self.handle_stop();
            for event in &rx {
                if let EngineEvent::SearchDone(done) = event {
                    self.finish_search(done);
                    break;
                }
            }
        }

        info!("vesper shutting down");
        Ok(())
    }

    fn handle_uci(&self) {
        println!("id name vesper {}", env!("CARGO_PKG_VERSION"));
        println!("id author the vesper developers");
        println!(
            "option name Hash type spin default {} min {} max {}",
            EngineConfig::default().hash_mb,
            HASH_RANGE.start(),
            HASH_RANGE.end()
        );
        println!(
            "option name Threads type spin default {} min {} max {}",
            EngineConfig::default().threads,
            THREADS_RANGE.start(),
            THREADS_RANGE.end()
        );
        println!(
            "option name MultiPV type spin default {} min {} max {}",
            EngineConfig::default().multi_pv,
            MULTI_PV_RANGE.start(),
            MULTI_PV_RANGE.end()
        );
        println!(
            "option name MoveOverhead type spin default {} min {} max {}",
            DEFAULT_MOVE_OVERHEAD.as_millis(),
            MOVE_OVERHEAD_RANGE.start(),
            MOVE_OVERHEAD_RANGE.end()
        );
        println!("option name Ponder type check default false");
        println!("uciok");
    }

    fn handle_ucinewgame(&mut self) {
        self.board = Board::starting_position();
        match self.pool.as_mut() {
            Some(pool) => pool.clear(),
            None => self.pending_clear = true,
        }
    }

    fn handle_setoption(&mut self, option: UciOption) {
        match option {
            UciOption::Hash(mb) => self.config.hash_mb = mb,
            UciOption::Threads(threads) => self.config.threads = threads,
            UciOption::MultiPv(lines) => self.config.multi_pv = lines,
            UciOption::MoveOverhead(overhead) => self.config.move_overhead = overhead,
            // Pondering is driven by `go ponder`; nothing to configure.
            UciOption::Ponder(_) => {}
        }
        debug!(?option, "option set");
        if let Some(mut pool) = self.pool.take() {
            self.configure(&mut pool);
            self.pool = Some(pool);
        }
    }

    /// Bring `pool` in line with the current configuration.
    fn configure(&mut self, pool: &mut ThreadPool) {
        if self.applied_hash_mb != self.config.hash_mb {
            pool.resize_tt(self.config.hash_mb);
            self.applied_hash_mb = self.config.hash_mb;
            // A fresh table is already empty.
            self.pending_clear = false;
            info!(mb = self.config.hash_mb, "transposition table resized");
        }
        if self.pending_clear {
            pool.clear();
            self.pending_clear = false;
        }
        if pool.threads() != self.config.threads {
            pool.set_threads(self.config.threads);
        }
        pool.set_move_overhead(self.config.move_overhead);
    }

    fn handle_go(&mut self, params: GoParams, tx: &mpsc::Sender<EngineEvent>) {
        if let Some(depth) = params.perft {
            self.run_perft(depth);
            return;
        }
        let Some(pool) = self.pool.take() else {
            warn!("go received while searching, ignoring");
            return;
        };

        let limits = params.to_limits(&self.board, self.config.multi_pv);
        let control = Arc::new(SearchControl::new(Arc::new(AtomicBool::new(false)), &limits));
        debug!(?limits, "starting search");

        let board = self.board.clone();
        let search_control = Arc::clone(&control);
        let tx = tx.clone();
        let spawned = thread::Builder::new().name("search".to_string()).stack_size(SEARCH_STACK_SIZE).spawn(
            move || {
                let mut pool = pool;
                let result = pool.get_best_move(&board, &limits, &search_control, |report| {
                    println!("{}", format_info(report));
                });
                // An infinite or ponder search holds its move until told otherwise.
                while search_control.must_wait() {
                    thread::sleep(WAIT_INTERVAL);
                }
                let _ = tx.send(EngineEvent::SearchDone(SearchDone { result, pool }));
            },
        );

        match spawned {
            Ok(_) => self.control = Some(control),
            Err(err) => {
                // The pool went down with the closure; start over with a new one.
                warn!(%err, "failed to spawn search thread");
                let mut pool = ThreadPool::new(self.config.hash_mb);
                self.applied_hash_mb = self.config.hash_mb;
                self.configure(&mut pool);
                self.pool = Some(pool);
            }
        }
    }

    fn run_perft(&self, depth: usize) {
        let mut board = self.board.clone();
        let split = divide(&mut board, depth);
        for (mv, nodes) in &split {
            println!("{mv}: {nodes}");
        }
        println!();
        println!("Nodes searched: {}", split.iter().map(|(_, nodes)| nodes).sum::<u64>());
    }

    fn handle_ponderhit(&mut self) {
        match &self.control {
            Some(control) if control.is_pondering() => control.ponderhit(),
            _ => warn!("ponderhit received while not pondering, ignoring"),
        }
    }

    fn handle_stop(&mut self) {
        if let Some(control) = &self.control {
            control.stop();
        }
    }

    fn finish_search(&mut self, done: SearchDone) {
        let SearchDone { result, mut pool } = done;
        self.configure(&mut pool);
        self.pool = Some(pool);
        self.control = None;

        debug!(best = %result.best_move, score = result.score, depth = result.depth, nodes = result.nodes, "search done");
        println!("{}", format_bestmove(&result));
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{EngineConfig, UciEngine};
    use crate::command::UciOption;

    #[test]
    fn options_reach_an_idle_pool() {
        let mut engine = UciEngine::new();
        engine.handle_setoption(UciOption::Threads(3));
        engine.handle_setoption(UciOption::Hash(2));
        engine.handle_setoption(UciOption::MultiPv(4));

        let pool = engine.pool.as_ref().unwrap();
        assert_eq!(pool.threads(), 3);
        assert_eq!(engine.applied_hash_mb, 2);
        assert_eq!(engine.config.multi_pv, 4);
    }

    #[test]
    fn options_wait_for_a_busy_pool() {
        let mut engine = UciEngine::new();
        let mut pool = engine.pool.take().unwrap();

        engine.handle_setoption(UciOption::Hash(4));
        engine.handle_setoption(UciOption::MoveOverhead(Duration::from_millis(30)));
        engine.handle_ucinewgame();
        assert_eq!(engine.applied_hash_mb, EngineConfig::default().hash_mb);
        assert!(engine.pending_clear);

        engine.configure(&mut pool);
        assert_eq!(engine.applied_hash_mb, 4);
        assert!(!engine.pending_clear);
    }
}
