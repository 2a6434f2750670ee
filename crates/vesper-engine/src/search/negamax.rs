//! Negamax alpha-beta search with quiescence and singular extensions.
//!
//! Scores are always from the side to move's point of view. Every node
//! polls the abort state first; a cancelled search returns [`Aborted`],
//! which `?` carries up through the whole recursion.

use vesper_core::{Move, MoveList, PieceKind};

use crate::search::params::*;
use crate::search::picker::Stage;
use crate::search::see::{SEE_VALUE, best_case_value, estimated_value, see};
use crate::search::stack::STACK_OFFSET;
use crate::search::tt::Bound;
use crate::search::worker::{SearchShared, Worker};
use crate::search::{Aborted, MATE, MAX_PLY, PrincipalVariation, TBWIN_IN_MAX, VALUE_NONE};

impl Worker {
    /// Search only captures and promotions until the position is quiet.
    ///
    /// When the side to move is in check every evasion is searched and
    /// there is no stand pat.
    pub(super) fn qsearch(
        &mut self,
        shared: &SearchShared<'_>,
        pv: &mut PrincipalVariation,
        mut alpha: i32,
        beta: i32,
    ) -> Result<i32, Aborted> {
        let height = self.height;
        let idx = height + STACK_OFFSET;
        let old_alpha = alpha;
        let mut lpv = PrincipalVariation::new();

        pv.clear();
        self.seldepth = self.seldepth.max(height);
        self.poll(shared)?;

        if self.board.is_drawn(height) {
            return Ok(self.draw_score());
        }
        if height >= MAX_PLY {
            return Ok(self.evaluate(shared));
        }

        let hash = self.board.hash();
        let entry = shared.tt.probe(hash, height);
        if let Some(entry) = entry {
            if entry.bound.cuts(entry.value, alpha, beta) {
                return Ok(entry.value);
            }
        }
        let tt_move = entry.map_or(Move::NONE, |e| e.mv);

        let in_check = self.board.in_check();
        let eval;
        let mut best;

        if in_check {
            eval = VALUE_NONE;
            best = -MATE + height as i32;
            self.stack[idx].eval = eval;
            self.stack[idx].picker.init(tt_move, [Move::NONE; 2], Move::NONE, [None; 2]);
        } else {
            eval = match entry {
                Some(e) if e.eval != VALUE_NONE => e.eval,
                _ => self.evaluate(shared),
            };
            self.stack[idx].eval = eval;
            if entry.is_none() {
                shared.tt.store(hash, height, Move::NONE, VALUE_NONE, eval, 0, Bound::None);
            }

            // Stand pat.
            best = eval;
            alpha = alpha.max(eval);
            if alpha >= beta {
                return Ok(eval);
            }

            // Delta pruning: not even the best capture on the board reaches alpha.
            if QS_DELTA_MARGIN.max(best_case_value(&self.board)) < alpha - eval {
                return Ok(eval);
            }

            self.stack[idx].picker.init_noisy(tt_move, (alpha - eval - QS_SEE_MARGIN).max(1));
        }

        let mut best_move = Move::NONE;
        while let Some(mv) = self.stack[idx].picker.next(&self.board, &self.history, !in_check) {
            // Worst case: we gain the estimated value and lose the mover.
            let mover = self.board.piece_on(mv.from()).map_or(0, |p| SEE_VALUE[p.kind().index()]);
            let pessimism = estimated_value(&self.board, mv) - mover;

            if !self.apply(mv) {
                continue;
            }

            if !in_check && eval + pessimism > beta && (eval + pessimism).abs() < MATE / 2 {
                self.revert(mv);
                pv.set_single(mv);
                return Ok(beta);
            }

            let value = -self.qsearch(shared, &mut lpv, -beta, -alpha)?;
            self.revert(mv);

            if value > best {
                best = value;
                best_move = mv;
                if value > alpha {
                    alpha = value;
                    pv.update(mv, &lpv);
                }
            }
            if alpha >= beta {
                break;
            }
        }

        let bound = if best >= beta {
            Bound::Lower
        } else if best > old_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        shared.tt.store(hash, height, best_move, best, eval, 0, bound);

        Ok(best)
    }

    /// Full-width search of the current node to `depth`.
    ///
    /// `cut` marks nodes expected to fail high. A depth at or below zero
    /// drops into [`Worker::qsearch`] unless the side to move is in check.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn search(
        &mut self,
        shared: &SearchShared<'_>,
        pv: &mut PrincipalVariation,
        mut alpha: i32,
        beta: i32,
        mut depth: i32,
        cut: bool,
    ) -> Result<i32, Aborted> {
        let height = self.height;
        let idx = height + STACK_OFFSET;
        let root = height == 0;
        let pv_node = alpha != beta - 1;
        let in_check = self.board.in_check();

        if depth <= 0 && !in_check {
            return self.qsearch(shared, pv, alpha, beta);
        }
        depth = depth.max(0);

        let old_alpha = alpha;
        let mut lpv = PrincipalVariation::new();

        pv.clear();
        self.seldepth = if root { 0 } else { self.seldepth.max(height) };
        self.poll(shared)?;

        if !root {
            if self.board.is_drawn(height) {
                return Ok(self.draw_score());
            }
            if height >= MAX_PLY {
                return Ok(if in_check { 0 } else { self.evaluate(shared) });
            }

            // Mate distance pruning.
            let r_alpha = alpha.max(-MATE + height as i32);
            let r_beta = beta.min(MATE - height as i32 - 1);
            if r_alpha >= r_beta {
                return Ok(r_alpha);
            }
        }

        let hash = self.board.hash();
        let excluding = self.stack[idx].excluded != Move::NONE;
        let mut entry = None;
        let mut syzygy_min = -MATE;
        let mut syzygy_max = MATE;

        // Singular verification searches neither trust nor feed the tables.
        if !excluding {
            entry = shared.tt.probe(hash, height);
            if let Some(e) = entry {
                if e.depth >= depth
                    && (depth == 0 || !pv_node)
                    && (cut || e.value <= alpha)
                    && e.bound.cuts(e.value, alpha, beta)
                {
                    return Ok(e.value);
                }

                // One ply short, but a fail low looks certain.
                if !pv_node
                    && e.depth >= depth - 1
                    && e.bound.is_upper()
                    && (cut || e.value <= alpha)
                    && e.value + TT_RESEARCH_MARGIN <= alpha
                {
                    return Ok(alpha);
                }
            }

            if !root {
                if let Some(wdl) = self.probe_wdl(shared, depth) {
                    let (value, bound) = wdl.to_score(height);
                    if bound.cuts(value, alpha, beta) {
                        shared.tt.store(hash, height, Move::NONE, value, VALUE_NONE, depth, bound);
                        return Ok(value);
                    }
                    if pv_node && bound == Bound::Lower {
                        syzygy_min = value;
                        alpha = alpha.max(value);
                    }
                    if pv_node && bound == Bound::Upper {
                        syzygy_max = value;
                    }
                }
            }
        }

        let tt_hit = entry.is_some();
        let tt_move = entry.map_or(Move::NONE, |e| e.mv);
        let tt_value = entry.map_or(VALUE_NONE, |e| e.value);
        let tt_eval = entry.map_or(VALUE_NONE, |e| e.eval);
        let tt_depth = entry.map_or(0, |e| e.depth);
        let tt_bound = entry.map_or(Bound::None, |e| e.bound);

        let eval = if in_check {
            VALUE_NONE
        } else if tt_eval != VALUE_NONE {
            tt_eval
        } else {
            self.evaluate(shared)
        };
        self.stack[idx].eval = eval;

        let see_margin = [SEE_NOISY_MARGIN * depth * depth, SEE_QUIET_MARGIN * depth];
        let improving = !in_check && eval > self.stack[idx - 2].eval;

        self.history.clear_killers(height + 1);
        self.stack[idx].double_extensions = if root { 0 } else { self.stack[idx - 1].double_extensions };

        let probcut_beta = (beta + PROBCUT_MARGIN).min(MATE - MAX_PLY as i32 - 1);

        if !tt_hit && !in_check && !excluding {
            shared.tt.store(hash, height, Move::NONE, VALUE_NONE, eval, 0, Bound::None);
        }

        let prunable = !pv_node && !in_check && !excluding;

        // Reverse futility pruning.
        if prunable
            && depth <= BETA_PRUNING_DEPTH
            && eval - BETA_MARGIN * (depth - improving as i32).max(0) >= beta
        {
            return Ok(eval);
        }

        // Alpha pruning.
        if prunable && depth <= ALPHA_PRUNING_DEPTH && eval + ALPHA_MARGIN <= alpha {
            return Ok(eval);
        }

        // Null move pruning. Skipped right after another null move, without
        // pieces to avoid zugzwang, and when the table predicts a fail low.
        if prunable
            && eval >= beta
            && self.stack[idx - 1].mv != Move::NULL
            && depth >= NULL_MOVE_PRUNING_DEPTH
            && self.board.has_non_pawn_material(self.board.side_to_move())
            && (!tt_hit || !tt_bound.is_upper() || tt_value >= beta)
        {
            let r = 4 + depth / 5 + ((eval - beta) / 191).min(3) + self.stack[idx - 1].tactical as i32;

            self.apply_null();
            let value = -self.search(shared, &mut lpv, -beta, -beta + 1, depth - r, !cut)?;
            self.revert_null();

            // Unproven mates are not returned.
            if value >= beta {
                return Ok(if value > TBWIN_IN_MAX { beta } else { value });
            }
        }

        // ProbCut: a capture that beats a raised beta at reduced depth.
        if prunable
            && depth >= PROBCUT_DEPTH
            && beta.abs() < TBWIN_IN_MAX
            && (!tt_hit || tt_value >= probcut_beta || tt_depth < depth - 3)
        {
            self.stack[idx].picker.init_noisy(tt_move, probcut_beta - eval);
            while let Some(mv) = self.stack[idx].picker.next(&self.board, &self.history, true) {
                if !self.apply(mv) {
                    continue;
                }

                // Deep nodes verify with a quiescence search first.
                let mut value = if depth >= 2 * PROBCUT_DEPTH {
                    -self.qsearch(shared, &mut lpv, -probcut_beta, -probcut_beta + 1)?
                } else {
                    probcut_beta
                };
                if value >= probcut_beta {
                    value = -self.search(shared, &mut lpv, -probcut_beta, -probcut_beta + 1, depth - 4, !cut)?;
                }

                self.revert(mv);

                if value >= probcut_beta {
                    if !tt_hit || tt_depth < depth - 3 {
                        shared.tt.store(hash, height, mv, value, eval, depth - 3, Bound::Lower);
                    }
                    return Ok(value);
                }
            }
        }

        // Internal iterative reduction.
        if depth >= 7 && (pv_node || cut) && (tt_move == Move::NONE || tt_depth + 4 < depth) {
            depth -= 1;
        }

        let parents = [self.stack[idx - 1].continuation, self.stack[idx - 2].continuation];

        // A singular verification search reuses the picker of its parent.
        if !excluding {
            let killers = self.history.killers(height);
            let counter = self.history.counter_move(&self.board, parents[0]);
            self.stack[idx].picker.init(tt_move, killers, counter, parents);
        }

        let mut best = -MATE;
        let mut best_move = Move::NONE;
        let mut played = 0;
        let mut moves_seen = 0;
        let mut skip_quiets = false;
        let mut quiets_tried = MoveList::new();
        let mut captures_tried = MoveList::new();

        while let Some(mv) = self.stack[idx].picker.next(&self.board, &self.history, skip_quiets) {
            let starting_nodes = self.nodes;

            if root && (self.best_moves[..self.multi_pv].contains(&mv) || !shared.is_root_move(mv)) {
                continue;
            }

            moves_seen += 1;
            let is_quiet = !self.board.is_tactical(mv);

            let (hist, counter_hist, follow_up_hist) = if is_quiet {
                let quiet = self.history.quiet(&self.board, parents, mv);
                (quiet.total, quiet.counter, quiet.follow_up)
            } else {
                (self.history.capture(&self.board, mv), 0, 0)
            };

            // Root moves are never pruned. Late move pruning.
            if !root
                && best > -TBWIN_IN_MAX
                && depth <= LATE_MOVE_PRUNING_DEPTH
                && moves_seen >= late_move_count(improving, depth)
            {
                skip_quiets = true;
            }

            if !root && is_quiet && best > -TBWIN_IN_MAX {
                let lmr_depth = (depth - lmr_reduction(depth, played)).max(0);
                let fmp_margin = FUTILITY_MARGIN_BASE + lmr_depth * FUTILITY_MARGIN_PER_DEPTH;

                // Futility pruning, once with and once without history.
                if !in_check
                    && eval + fmp_margin <= alpha
                    && lmr_depth <= FUTILITY_PRUNING_DEPTH
                    && hist < FUTILITY_PRUNING_HISTORY_LIMIT[improving as usize]
                {
                    skip_quiets = true;
                }
                if !in_check
                    && lmr_depth <= FUTILITY_PRUNING_DEPTH
                    && eval + fmp_margin + FUTILITY_MARGIN_NO_HISTORY <= alpha
                {
                    skip_quiets = true;
                }

                // Continuation pruning.
                if self.stack[idx].picker.stage() > Stage::CounterMove
                    && lmr_depth <= CONTINUATION_PRUNING_DEPTH[improving as usize]
                    && counter_hist.min(follow_up_hist) < CONTINUATION_PRUNING_HISTORY_LIMIT[improving as usize]
                {
                    continue;
                }
            }

            // SEE pruning. Good noisy moves already passed a SEE test.
            if !root
                && best > -TBWIN_IN_MAX
                && depth <= SEE_PRUNING_DEPTH
                && self.stack[idx].picker.stage() > Stage::GoodNoisy
                && !see(&self.board, mv, see_margin[is_quiet as usize] - hist / 128)
            {
                continue;
            }

            let king_moved = self.board.piece_on(mv.from()).is_some_and(|p| p.kind() == PieceKind::King);

            if !self.apply(mv) {
                continue;
            }

            played += 1;
            if is_quiet {
                quiets_tried.push(mv);
            } else {
                captures_tried.push(mv);
            }

            let singular = !root
                && depth >= SINGULAR_DEPTH
                && mv == tt_move
                && tt_depth >= depth - 3
                && tt_bound.is_lower();

            let extension = if singular {
                self.singularity(shared, mv, tt_value, depth, pv_node, alpha, beta, cut)?
            } else {
                in_check as i32
            };
            let mut new_depth = depth + if root { 0 } else { extension };
            if extension > 1 {
                self.stack[idx].double_extensions += 1;
            }

            // Multi-cut: several moves beat a raised beta. The board has
            // already been restored.
            if self.stack[idx].picker.stage() == Stage::Done {
                return Ok((tt_value - depth).max(-MATE));
            }

            let mut value = -MATE;
            let mut full_search = !pv_node || played > 1;

            // Late move reductions.
            if depth > 2 && played > 1 {
                let r = if is_quiet {
                    lmr_reduction(depth, played) + !pv_node as i32 + !improving as i32
                        + (in_check && king_moved) as i32
                        - (self.stack[idx].picker.stage() < Stage::Quiet) as i32
                        - hist / 6167
                } else {
                    3 - hist / 4952 - self.board.in_check() as i32
                };
                let r = r.clamp(1, depth - 1);

                value = -self.search(shared, &mut lpv, -alpha - 1, -alpha, new_depth - r, true)?;

                if value > alpha && r > 1 {
                    let reduced = new_depth - r;
                    new_depth += (value > best + 35) as i32;
                    new_depth -= (value < best + new_depth) as i32;
                    if new_depth - 1 > reduced {
                        value = -self.search(shared, &mut lpv, -alpha - 1, -alpha, new_depth - 1, !cut)?;
                    }
                }
                full_search = false;
            }

            if full_search {
                value = -self.search(shared, &mut lpv, -alpha - 1, -alpha, new_depth - 1, !cut)?;
            }

            if pv_node && (played == 1 || value > alpha) {
                value = -self.search(shared, &mut lpv, -beta, -alpha, new_depth - 1, false)?;
            }

            self.revert(mv);

            if extension > 1 {
                self.stack[idx].double_extensions -= 1;
            }

            if root && self.is_main() {
                self.root_nodes[mv.from_to()] += self.nodes - starting_nodes;
            }

            if value > best {
                best = value;
                best_move = mv;
                if value > alpha {
                    alpha = value;
                    pv.update(mv, &lpv);
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        if best >= beta {
            if !root && !self.board.is_tactical(best_move) {
                self.history.update_quiets(&self.board, height, parents, quiets_tried.as_slice(), depth);
            }
            self.history.update_captures(&self.board, best_move, captures_tried.as_slice(), depth);
        }

        if played == 0 {
            return Ok(if in_check { -MATE + height as i32 } else { 0 });
        }

        // Never contradict a known tablebase result.
        if pv_node {
            best = best.min(syzygy_max).max(syzygy_min);
        }

        // Later lines of a multi-PV search must not overwrite the root entry.
        if !excluding && (!root || self.multi_pv == 0) {
            let bound = if best >= beta {
                Bound::Lower
            } else if best > old_alpha {
                Bound::Exact
            } else {
                Bound::Upper
            };
            let mv = if bound == Bound::Upper { Move::NONE } else { best_move };
            shared.tt.store(hash, height, mv, best, eval, depth, bound);
        }

        Ok(best)
    }

    /// Decide the extension of the table move `tt_move`, currently applied.
    ///
    /// All other moves are searched at half depth against a bound just
    /// below the table value. Returns 2 or 1 when they fall short, -1 when
    /// the table value lies outside the window and 0 otherwise. When the
    /// alternatives beat beta the picker is finished and the table move is
    /// left unapplied, telling the caller to cut the node.
    #[allow(clippy::too_many_arguments)]
    fn singularity(
        &mut self,
        shared: &SearchShared<'_>,
        tt_move: Move,
        tt_value: i32,
        depth: i32,
        pv_node: bool,
        alpha: i32,
        beta: i32,
        cut: bool,
    ) -> Result<i32, Aborted> {
        let idx = self.height - 1 + STACK_OFFSET;
        let r_beta = (tt_value - depth).max(-MATE);
        let mut lpv = PrincipalVariation::new();

        self.revert(tt_move);
        self.stack[idx].excluded = tt_move;
        let result = self.search(shared, &mut lpv, r_beta - 1, r_beta, (depth - 1) / 2, cut);
        self.stack[idx].excluded = Move::NONE;
        let value = result?;

        self.stack[idx].picker.rewind();

        if value >= r_beta && r_beta >= beta {
            self.stack[idx].picker.finish();
        } else {
            // The table move was legal a moment ago.
            let reapplied = self.apply(tt_move);
            debug_assert!(reapplied, "table move {tt_move} became illegal");
        }

        let double = !pv_node
            && value < r_beta - 16
            && self.stack[idx - 1].double_extensions <= MAX_DOUBLE_EXTENSIONS;

        Ok(if double {
            2
        } else if value < r_beta {
            1
        } else if tt_value >= beta || tt_value <= alpha {
            -1
        } else {
            0
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    use vesper_core::{Board, Color, Move};

    use crate::eval::Classical;
    use crate::search::control::SearchControl;
    use crate::search::limits::SearchLimits;
    use crate::search::time::TimeManager;
    use crate::search::tt::{Bound, TranspositionTable};
    use crate::search::worker::{SearchShared, Worker, WorkerCounters};
    use crate::search::{MATE, PrincipalVariation, TBWIN};
    use crate::tablebase::{NoTablebase, Tablebase, Wdl};

    const KPK_FEN: &str = "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1";

    /// Tables in which White always wins.
    struct WhiteWins {
        max_pieces: u32,
        probe_depth: i32,
    }

    impl Tablebase for WhiteWins {
        fn probe_wdl(&self, board: &Board, _depth: i32, _height: usize) -> Option<Wdl> {
            Some(if board.side_to_move() == Color::White { Wdl::Win } else { Wdl::Loss })
        }

        fn probe_dtz(&self, _board: &Board) -> Option<Vec<Move>> {
            None
        }

        fn max_pieces(&self) -> u32 {
            self.max_pieces
        }

        fn probe_depth(&self) -> i32 {
            self.probe_depth
        }
    }

    fn run<T>(fen: &str, f: impl FnOnce(&mut Worker, &SearchShared<'_>) -> T) -> T {
        run_with(fen, &NoTablebase, f)
    }

    fn run_with<T>(
        fen: &str,
        tablebase: &dyn Tablebase,
        f: impl FnOnce(&mut Worker, &SearchShared<'_>) -> T,
    ) -> T {
        let board: Board = fen.parse().unwrap();
        let limits = SearchLimits::default();
        let control = SearchControl::new(Arc::new(AtomicBool::new(false)), &limits);
        let tm = TimeManager::new(&limits, Duration::ZERO, 1);
        let tt = TranspositionTable::new(1);
        let root_moves: Vec<Move> = board.legal_moves().iter().collect();
        let counters = [WorkerCounters::default()];
        let shared = SearchShared {
            tt: &tt,
            limits: &limits,
            control: &control,
            tm: &tm,
            evaluator: &Classical,
            tablebase,
            root_moves: &root_moves,
            multi_pv: 1,
            counters: &counters,
        };
        let mut worker = Worker::new(0);
        worker.prepare(&board, 1);
        worker.depth = 1;
        f(&mut worker, &shared)
    }

    #[test]
    fn qsearch_stands_pat_in_quiet_positions() {
        let score = run("4k3/8/8/8/8/8/8/3QK3 w - - 0 1", |worker, shared| {
            let eval = worker.evaluate(shared);
            let score = worker.qsearch(shared, &mut PrincipalVariation::new(), -MATE, MATE).unwrap();
            assert_eq!(score, eval);
            score
        });
        assert!(score > 900);
    }

    #[test]
    fn qsearch_wins_a_hanging_queen() {
        run("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1", |worker, shared| {
            let eval = worker.evaluate(shared);
            let mut pv = PrincipalVariation::new();
            let score = worker.qsearch(shared, &mut pv, -MATE, MATE).unwrap();
            assert!(score > eval + 800);
            assert_eq!(pv.first().to_string(), "d1d5");
        });
    }

    #[test]
    fn qsearch_finds_mate_when_evasions_run_out() {
        // Black is in check from the rook and every king move is covered.
        run("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1", |worker, shared| {
            let score = worker.qsearch(shared, &mut PrincipalVariation::new(), -MATE, MATE).unwrap();
            assert_eq!(score, -MATE);
        });
    }

    #[test]
    fn search_scores_checkmate_and_stalemate() {
        run("7k/6Q1/5K2/8/8/8/8/8 b - - 0 1", |worker, shared| {
            let score = worker.search(shared, &mut PrincipalVariation::new(), -MATE, MATE, 3, false).unwrap();
            assert_eq!(score, -MATE);
        });
        run("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1", |worker, shared| {
            let score = worker.search(shared, &mut PrincipalVariation::new(), -MATE, MATE, 3, false).unwrap();
            assert_eq!(score, 0);
        });
    }

    #[test]
    fn search_finds_back_rank_mate() {
        run("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", |worker, shared| {
            let mut pv = PrincipalVariation::new();
            let score = worker.search(shared, &mut pv, -MATE, MATE, 3, false).unwrap();
            assert_eq!(score, MATE - 1);
            assert_eq!(pv.first().to_string(), "a1a8");
        });
    }

    #[test]
    fn tablebase_loss_cuts_off_without_searching() {
        let tables = WhiteWins { max_pieces: 3, probe_depth: 0 };
        run_with(KPK_FEN, &tables, |worker, shared| {
            let e2e4 = worker.board.parse_uci_move("e2e4").unwrap();
            assert!(worker.apply(e2e4));
            let hash = worker.board.hash();

            let score = worker.search(shared, &mut PrincipalVariation::new(), -100, 100, 3, false).unwrap();
            assert_eq!(score, -TBWIN + 1);
            assert_eq!(worker.tbhits, 1);

            let entry = shared.tt.probe(hash, 1).unwrap();
            assert_eq!(entry.mv, Move::NONE);
            assert_eq!(entry.value, -TBWIN + 1);
            assert_eq!(entry.bound, Bound::Upper);
            assert_eq!(entry.depth, 3);
        });
    }

    #[test]
    fn tablebase_win_bounds_the_root_score() {
        let tables = WhiteWins { max_pieces: 3, probe_depth: 0 };
        run_with(KPK_FEN, &tables, |worker, shared| {
            let mut pv = PrincipalVariation::new();
            let score = worker.search(shared, &mut pv, -MATE, MATE, 2, false).unwrap();
            assert_eq!(score, TBWIN - 1);
            assert!(worker.tbhits > 0);
            assert!(["e2e3", "e2e4"].contains(&pv.first().to_string().as_str()));
        });
    }

    #[test]
    fn largest_tables_wait_for_enough_depth() {
        let tables = WhiteWins { max_pieces: 3, probe_depth: 5 };
        for (depth, hits) in [(3, 0), (5, 1)] {
            run_with(KPK_FEN, &tables, |worker, shared| {
                let e2e4 = worker.board.parse_uci_move("e2e4").unwrap();
                assert!(worker.apply(e2e4));
                worker.search(shared, &mut PrincipalVariation::new(), -100, 100, depth, false).unwrap();
                assert_eq!(worker.tbhits, hits, "depth {depth}");
            });
        }

        // Smaller material is looked up at any depth.
        let tables = WhiteWins { max_pieces: 4, probe_depth: 5 };
        run_with(KPK_FEN, &tables, |worker, shared| {
            let e2e4 = worker.board.parse_uci_move("e2e4").unwrap();
            assert!(worker.apply(e2e4));
            let score = worker.search(shared, &mut PrincipalVariation::new(), -100, 100, 3, false).unwrap();
            assert_eq!(score, -TBWIN + 1);
            assert_eq!(worker.tbhits, 1);
        });
    }

    #[test]
    fn search_leaves_the_board_as_it_found_it() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        run(fen, |worker, shared| {
            let hash = worker.board.hash();
            worker.search(shared, &mut PrincipalVariation::new(), -MATE, MATE, 4, false).unwrap();
            assert_eq!(worker.board.hash(), hash);
            assert_eq!(worker.height, 0);
            assert_eq!(worker.board.to_fen(), fen);
        });
    }
}
