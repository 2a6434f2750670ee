//! Time management: how long to think about one move.
//!
//! The manager plans an ideal and a maximum usage up front. Between
//! iterations the ideal is scaled by how stable the best move has been, how
//! much the score dropped and how many nodes went into the best move.
//! During search only the maximum is enforced.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::search::PrincipalVariation;
use crate::search::limits::SearchLimits;

/// Dynamic adjustments start once this many iterations have completed.
const MIN_ADJUST_DEPTH: usize = 4;
const MAX_STABILITY: u32 = 10;

/// Time plan for one search.
#[derive(Debug)]
pub struct TimeManager {
    ideal_ms: f64,
    max_ms: f64,
    self_limited: bool,
    movetime_limited: bool,
    node_limit: Option<u64>,
    threads: u64,
    /// Consecutive iterations with the same best move, capped at 10.
    pv_stability: AtomicU32,
}

impl TimeManager {
    /// Plan the time for a search with `limits`, keeping `move_overhead`
    /// in reserve for communication lag. `threads` splits a node limit
    /// across workers.
    pub fn new(limits: &SearchLimits, move_overhead: Duration, threads: usize) -> Self {
        let mut ideal_ms = 0.0;
        let mut max_ms = 0.0;

        if let (true, Some(time)) = (limits.limited_by_self(), limits.time) {
            let available = (time.as_millis() as f64 - move_overhead.as_millis() as f64).max(0.0);
            let inc = limits.increment.as_millis() as f64;
            match limits.moves_to_go {
                Some(mtg) => {
                    let mtg = mtg as f64;
                    ideal_ms = available / (mtg + 5.0) + inc;
                    max_ms = 5.0 * available / (mtg + 10.0) + inc;
                }
                None => {
                    ideal_ms = (available + 25.0 * inc) / 50.0;
                    max_ms = 10.0 * ideal_ms;
                }
            }
            ideal_ms = ideal_ms.min(available);
            max_ms = max_ms.min(available);
        }

        if let Some(movetime) = limits.movetime {
            ideal_ms = movetime.as_millis() as f64;
            max_ms = ideal_ms;
        }

        tracing::debug!(ideal_ms, max_ms, "planned time usage");

        Self {
            ideal_ms,
            max_ms,
            self_limited: limits.limited_by_self(),
            movetime_limited: limits.limited_by_time(),
            node_limit: limits.nodes,
            threads: threads.max(1) as u64,
            pv_stability: AtomicU32::new(0),
        }
    }

    pub fn ideal_usage(&self) -> Duration {
        Duration::from_millis(self.ideal_ms as u64)
    }

    pub fn max_usage(&self) -> Duration {
        Duration::from_millis(self.max_ms as u64)
    }

    /// Polled from inside the search by each worker with its own node count.
    /// Checks only every 1024 nodes and never during the first iteration.
    pub fn should_stop_early(&self, nodes: u64, depth: i32, elapsed: Duration) -> bool {
        if nodes & 1023 != 0 || depth <= 1 {
            return false;
        }
        if let Some(limit) = self.node_limit {
            return nodes >= limit / self.threads;
        }
        (self.self_limited || self.movetime_limited) && elapsed.as_millis() as f64 >= self.max_ms
    }

    /// Track best move stability after the iteration `completed` finished.
    pub fn update(&self, pvs: &[PrincipalVariation], completed: usize) {
        if !self.self_limited || completed < MIN_ADJUST_DEPTH {
            return;
        }
        let stability = if pvs[completed].first() == pvs[completed - 1].first() {
            (self.pv_stability.load(Ordering::Relaxed) + 1).min(MAX_STABILITY)
        } else {
            0
        };
        self.pv_stability.store(stability, Ordering::Relaxed);
    }

    pub fn pv_stability(&self) -> u32 {
        self.pv_stability.load(Ordering::Relaxed)
    }

    /// Whether a self-managed search should not start another iteration.
    ///
    /// `best_nodes` is the number of nodes spent below the current best root
    /// move out of the main worker's `total_nodes`.
    pub fn finished(
        &self,
        pvs: &[PrincipalVariation],
        completed: usize,
        best_nodes: u64,
        total_nodes: u64,
        elapsed: Duration,
    ) -> bool {
        if completed < MIN_ADJUST_DEPTH {
            return false;
        }

        let pv_factor = 1.20 - 0.04 * self.pv_stability() as f64;

        let score_drop = (pvs[completed - 3].score - pvs[completed].score) as f64;
        let score_factor = (0.05 * score_drop).clamp(0.75, 1.25);

        let non_best = 1.0 - best_nodes as f64 / total_nodes.max(1) as f64;
        let node_factor = (2.0 * non_best + 0.4).max(0.50);

        elapsed.as_millis() as f64 > self.ideal_ms * pv_factor * score_factor * node_factor
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use vesper_core::{Move, Square};

    use super::TimeManager;
    use crate::search::PrincipalVariation;
    use crate::search::limits::SearchLimits;

    fn clock(ms: u64, inc: u64, mtg: Option<u32>) -> SearchLimits {
        SearchLimits {
            time: Some(Duration::from_millis(ms)),
            increment: Duration::from_millis(inc),
            moves_to_go: mtg,
            ..SearchLimits::default()
        }
    }

    fn line(mv: Move, score: i32) -> PrincipalVariation {
        let mut pv = PrincipalVariation::new();
        pv.set_single(mv);
        pv.score = score;
        pv
    }

    #[test]
    fn sudden_death_with_increment() {
        let tm = TimeManager::new(&clock(60_100, 1_000, None), Duration::from_millis(100), 1);
        // (60000 + 25 * 1000) / 50
        assert_eq!(tm.ideal_usage(), Duration::from_millis(1_700));
        assert_eq!(tm.max_usage(), Duration::from_millis(17_000));
    }

    #[test]
    fn moves_to_go() {
        let tm = TimeManager::new(&clock(30_100, 0, Some(25)), Duration::from_millis(100), 1);
        assert_eq!(tm.ideal_usage(), Duration::from_millis(1_000));
        assert_eq!(tm.max_usage(), Duration::from_millis(4_285));
    }

    #[test]
    fn usage_is_capped_by_remaining_time() {
        let tm = TimeManager::new(&clock(1_100, 10_000, Some(1)), Duration::from_millis(100), 1);
        assert_eq!(tm.ideal_usage(), Duration::from_millis(1_000));
        assert_eq!(tm.max_usage(), Duration::from_millis(1_000));
    }

    #[test]
    fn movetime_sets_both_limits() {
        let tm = TimeManager::new(&SearchLimits::movetime(Duration::from_millis(250)), Duration::from_millis(100), 1);
        assert_eq!(tm.ideal_usage(), Duration::from_millis(250));
        assert_eq!(tm.max_usage(), Duration::from_millis(250));
        assert!(!tm.should_stop_early(1024, 5, Duration::from_millis(100)));
        assert!(tm.should_stop_early(1024, 5, Duration::from_millis(250)));
        assert!(!tm.should_stop_early(1025, 5, Duration::from_millis(250)));
        assert!(!tm.should_stop_early(1024, 1, Duration::from_millis(250)));
    }

    #[test]
    fn node_limit_is_split_across_threads() {
        let limits = SearchLimits { nodes: Some(8192), ..SearchLimits::default() };
        let tm = TimeManager::new(&limits, Duration::ZERO, 4);
        assert!(!tm.should_stop_early(1024, 3, Duration::ZERO));
        assert!(tm.should_stop_early(2048, 3, Duration::ZERO));
    }

    #[test]
    fn depth_limited_search_never_stops_early_on_time() {
        let tm = TimeManager::new(&SearchLimits::depth(8), Duration::ZERO, 1);
        assert!(!tm.should_stop_early(1024, 5, Duration::from_secs(3600)));
    }

    #[test]
    fn stability_grows_and_resets() {
        let tm = TimeManager::new(&clock(60_000, 0, None), Duration::ZERO, 1);
        let a = Move::new(Square::E1, Square::F1);
        let b = Move::new(Square::E1, Square::D1);
        let mut pvs = vec![PrincipalVariation::new(); 8];
        for pv in pvs.iter_mut().take(6) {
            *pv = line(a, 0);
        }
        tm.update(&pvs, 3);
        assert_eq!(tm.pv_stability(), 0);
        tm.update(&pvs, 4);
        tm.update(&pvs, 5);
        assert_eq!(tm.pv_stability(), 2);
        pvs[6] = line(b, 0);
        tm.update(&pvs, 6);
        assert_eq!(tm.pv_stability(), 0);
    }

    #[test]
    fn finished_needs_four_iterations() {
        let tm = TimeManager::new(&clock(60_000, 0, None), Duration::ZERO, 1);
        let a = Move::new(Square::E1, Square::F1);
        let pvs = vec![line(a, 0); 8];
        assert!(!tm.finished(&pvs, 3, 0, 1000, Duration::from_secs(3600)));
        assert!(tm.finished(&pvs, 4, 0, 1000, Duration::from_secs(3600)));
        // ideal is 1200 ms; a stable score and all nodes in the best move
        // give 1.2 * 0.75 * 0.5 of it.
        assert!(!tm.finished(&pvs, 4, 1000, 1000, Duration::from_millis(500)));
        assert!(tm.finished(&pvs, 4, 1000, 1000, Duration::from_millis(600)));
    }
}
