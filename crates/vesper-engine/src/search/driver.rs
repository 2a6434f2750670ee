//! Iterative deepening with aspiration windows, run by every worker.

use std::time::Duration;

use tracing::{debug, trace};

use crate::search::params::{WINDOW_DEPTH, WINDOW_SIZE, WINDOW_TIMER_MS};
use crate::search::worker::{SearchShared, Worker};
use crate::search::{Aborted, MATE, MAX_PLY, PrincipalVariation, ScoreBound, SearchReport};

impl Worker {
    /// Search depth 1, 2, 3, ... until a limit ends the search.
    ///
    /// Only the main worker reports progress and checks the limits between
    /// iterations; helpers keep deepening until they are aborted.
    pub(super) fn iterative_deepening(&mut self, shared: &SearchShared<'_>, report: &mut dyn FnMut(&SearchReport)) {
        'deepening: for depth in 1..MAX_PLY as i32 {
            self.depth = depth;

            for line in 0..shared.multi_pv {
                self.multi_pv = line;
                if self.aspiration_window(shared, report).is_err() {
                    trace!(worker = self.index, depth, "iteration aborted");
                    break 'deepening;
                }
            }

            if !self.is_main() {
                continue;
            }

            // Lines can finish out of order; report them best first.
            if shared.multi_pv > 1 {
                self.report_lines(shared, report);
            }

            shared.tm.update(&self.pvs, self.completed);

            if shared.control.is_pondering() {
                continue;
            }

            let limits = shared.limits;
            let elapsed = shared.control.elapsed();
            let best_nodes = self.root_nodes[self.pvs[self.completed].first().from_to()];

            if (limits.limited_by_self()
                && shared.tm.finished(&self.pvs, self.completed, best_nodes, self.nodes, elapsed))
                || limits.depth.is_some_and(|limit| depth >= limit)
                || limits.movetime.is_some_and(|movetime| elapsed >= movetime)
            {
                break;
            }
        }

        self.publish(shared);
        debug!(worker = self.index, completed = self.completed, nodes = self.nodes, "worker finished");
    }

    /// Search the current line at the current depth, starting from a narrow
    /// window around the previous score and widening it on every failure.
    fn aspiration_window(
        &mut self,
        shared: &SearchShared<'_>,
        report: &mut dyn FnMut(&SearchReport),
    ) -> Result<(), Aborted> {
        let mut pv = PrincipalVariation::new();
        let mut depth = self.depth;
        let mut alpha = -MATE;
        let mut beta = MATE;
        let mut delta = WINDOW_SIZE;
        let reporting = self.is_main() && shared.multi_pv == 1;

        if self.depth >= WINDOW_DEPTH {
            let previous = if self.multi_pv == 0 {
                self.pvs[self.completed].score
            } else {
                self.mpvs[self.multi_pv].score
            };
            alpha = (previous - delta).max(-MATE);
            beta = (previous + delta).min(MATE);
        }

        loop {
            let score = self.search(shared, &mut pv, alpha, beta, depth.max(1), false)?;
            pv.score = score;

            let inside = score > alpha && score < beta;
            if reporting && (inside || shared.control.elapsed() >= Duration::from_millis(WINDOW_TIMER_MS)) {
                report(&self.progress(shared, self.depth, 1, &pv, ScoreBound::classify(score, alpha, beta)));
            }

            if inside {
                self.best_moves[self.multi_pv] = pv.first();
                self.update_best_line(&pv);
                return Ok(());
            }

            if score <= alpha {
                debug!(depth = self.depth, alpha, beta, score, "aspiration fail low");
                beta = (alpha + beta) / 2;
                alpha = (alpha - delta).max(-MATE);
                depth = self.depth;
                self.revert_best_line();
            } else {
                debug!(depth = self.depth, alpha, beta, score, "aspiration fail high");
                beta = (beta + delta).min(MATE);
                depth -= (score.abs() <= MATE / 2) as i32;
                self.update_best_line(&pv);
            }

            delta += delta / 2;
        }
    }

    /// Record `pv` as the result of the current iteration. Lines after the
    /// first only replace it when they score better.
    fn update_best_line(&mut self, pv: &PrincipalVariation) {
        if self.multi_pv == 0 || pv.score > self.pvs[self.completed].score {
            self.completed = self.depth as usize;
            self.pvs[self.completed] = pv.clone();
        }
        self.mpvs[self.multi_pv] = pv.clone();
    }

    /// Forget a fail high of the current iteration after a later fail low.
    fn revert_best_line(&mut self) {
        if self.multi_pv == 0 {
            self.completed = self.depth as usize - 1;
        }
    }

    fn report_lines(&self, shared: &SearchShared<'_>, report: &mut dyn FnMut(&SearchReport)) {
        let mut lines: Vec<&PrincipalVariation> = self.mpvs.iter().collect();
        lines.sort_by(|a, b| b.score.cmp(&a.score));
        for (index, pv) in lines.into_iter().enumerate() {
            report(&self.progress(shared, self.depth, index + 1, pv, ScoreBound::Exact));
        }
    }

    /// Progress report for `pv`, with counters summed over all workers.
    pub(super) fn progress(
        &self,
        shared: &SearchShared<'_>,
        depth: i32,
        multipv: usize,
        pv: &PrincipalVariation,
        bound: ScoreBound,
    ) -> SearchReport {
        self.publish(shared);
        SearchReport {
            depth,
            seldepth: self.seldepth,
            multipv,
            score: pv.score,
            bound,
            elapsed: shared.control.elapsed(),
            nodes: shared.total_nodes(),
            tbhits: shared.total_tbhits(),
            hashfull: shared.tt.hashfull(),
            pv: pv.moves().to_vec(),
        }
    }
}
