//! Per-worker move ordering statistics: quiet, capture and continuation
//! histories, killer moves and counter moves.
//!
//! Every history value moves toward `±HISTORY_DIVISOR` with a gravity term,
//! so it stays inside `i16` without clamping.

use vesper_core::{Board, Move, PieceKind, Square};

use crate::search::MAX_PLY;

/// History values saturate around this magnitude.
const HISTORY_DIVISOR: i32 = 16_384;

const PIECES: usize = PieceKind::COUNT;
const SQUARES: usize = Square::COUNT;
/// Capturable piece kinds, pawn through queen.
const VICTIMS: usize = PieceKind::COUNT - 1;

/// Continuation slots: the move one ply ago and the move two plies ago.
const CONT_SLOTS: usize = 2;
const CONT_BLOCK: usize = CONT_SLOTS * PIECES * SQUARES;

/// Identifies the move that led to a node, for continuation lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContKey {
    pub tactical: bool,
    pub piece: PieceKind,
    pub to: Square,
}

impl ContKey {
    fn block(self) -> usize {
        ((self.tactical as usize * PIECES + self.piece.index()) * SQUARES + self.to.index()) * CONT_BLOCK
    }
}

/// The quiet history of one move, split into its parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuietHistory {
    /// Butterfly history plus both continuation parts.
    pub total: i32,
    /// Continuation history after the previous move.
    pub counter: i32,
    /// Continuation history after our own previous move.
    pub follow_up: i32,
}

/// Bonus for a move that refuted a node searched to `depth`.
pub fn stat_bonus(depth: i32) -> i32 {
    if depth > 13 { 32 } else { 16 * depth * depth + 128 * (depth - 1).max(0) }
}

#[inline]
fn apply_bonus(entry: &mut i16, depth: i32, good: bool) {
    let bonus = stat_bonus(depth);
    let delta = if good { bonus } else { -bonus };
    let current = *entry as i32;
    *entry = (current + delta - current * delta.abs() / HISTORY_DIVISOR) as i16;
}

/// Move ordering statistics owned by one search worker.
///
/// Survives between searches; [`History::clear`] resets it for a new game.
pub struct History {
    /// `[side][from threatened][to threatened][from][to]`
    quiet: Vec<i16>,
    /// `[piece][from threatened][to threatened][to][captured]`
    capture: Vec<i16>,
    /// `[tactical][piece][to]` of the earlier move, then `[slot][piece][to]`.
    continuation: Vec<i16>,
    killers: Vec<[Move; 2]>,
    /// `[side that moved][piece][to]` of the move being answered.
    counters: Vec<Move>,
}

impl History {
    pub fn new() -> Self {
        Self {
            quiet: vec![0; 2 * 2 * 2 * SQUARES * SQUARES],
            capture: vec![0; PIECES * 2 * 2 * SQUARES * VICTIMS],
            continuation: vec![0; 2 * PIECES * SQUARES * CONT_BLOCK],
            killers: vec![[Move::NONE; 2]; MAX_PLY + 2],
            counters: vec![Move::NONE; 2 * PIECES * SQUARES],
        }
    }

    /// Forget everything learned so far.
    pub fn clear(&mut self) {
        self.quiet.fill(0);
        self.capture.fill(0);
        self.continuation.fill(0);
        self.killers.fill([Move::NONE; 2]);
        self.counters.fill(Move::NONE);
    }

    fn quiet_index(board: &Board, mv: Move) -> usize {
        let threats = board.threats();
        let from = mv.from();
        let to = mv.to();
        let side = board.side_to_move().index();
        ((((side * 2 + threats.contains(from) as usize) * 2 + threats.contains(to) as usize) * SQUARES + from.index())
            * SQUARES)
            + to.index()
    }

    fn capture_index(board: &Board, mv: Move) -> usize {
        let threats = board.threats();
        let from = mv.from();
        let to = mv.to();
        let piece = board.piece_on(from).map_or(PieceKind::Pawn, |p| p.kind());
        let captured = match board.piece_on(to) {
            Some(p) if !mv.is_en_passant() => p.kind().index().min(VICTIMS - 1),
            _ => PieceKind::Pawn.index(),
        };
        ((((piece.index() * 2 + threats.contains(from) as usize) * 2 + threats.contains(to) as usize) * SQUARES
            + to.index())
            * VICTIMS)
            + captured
    }

    fn continuation_index(parent: ContKey, slot: usize, piece: PieceKind, to: Square) -> usize {
        parent.block() + (slot * PIECES + piece.index()) * SQUARES + to.index()
    }

    fn counter_index(board: &Board, parent: ContKey) -> usize {
        let mover = (!board.side_to_move()).index();
        (mover * PIECES + parent.piece.index()) * SQUARES + parent.to.index()
    }

    /// Killer moves stored for `height`.
    #[inline]
    pub fn killers(&self, height: usize) -> [Move; 2] {
        self.killers[height.min(MAX_PLY + 1)]
    }

    pub fn clear_killers(&mut self, height: usize) {
        self.killers[height.min(MAX_PLY + 1)] = [Move::NONE; 2];
    }

    /// The move that last refuted `parent` in this kind of position.
    pub fn counter_move(&self, board: &Board, parent: Option<ContKey>) -> Move {
        parent.map_or(Move::NONE, |parent| self.counters[Self::counter_index(board, parent)])
    }

    /// Quiet history of `mv`, played at a node reached via `parents`
    /// (one and two plies ago).
    pub fn quiet(&self, board: &Board, parents: [Option<ContKey>; 2], mv: Move) -> QuietHistory {
        let piece = board.piece_on(mv.from()).map_or(PieceKind::Pawn, |p| p.kind());
        let lookup = |slot: usize| {
            parents[slot].map_or(0, |parent| {
                self.continuation[Self::continuation_index(parent, slot, piece, mv.to())] as i32
            })
        };
        let counter = lookup(0);
        let follow_up = lookup(1);
        let butterfly = self.quiet[Self::quiet_index(board, mv)] as i32;
        QuietHistory { total: butterfly + counter + follow_up, counter, follow_up }
    }

    /// Capture history of a noisy move.
    #[inline]
    pub fn capture(&self, board: &Board, mv: Move) -> i32 {
        self.capture[Self::capture_index(board, mv)] as i32
    }

    /// Reward the last of `tried` quiet moves, which caused a cutoff, and
    /// penalise the others. Also records the killer and counter move.
    pub fn update_quiets(
        &mut self,
        board: &Board,
        height: usize,
        parents: [Option<ContKey>; 2],
        tried: &[Move],
        depth: i32,
    ) {
        let Some(&best) = tried.last() else {
            return;
        };

        let slot = &mut self.killers[height.min(MAX_PLY + 1)];
        if slot[0] != best {
            slot[1] = slot[0];
            slot[0] = best;
        }
        if let Some(parent) = parents[0] {
            self.counters[Self::counter_index(board, parent)] = best;
        }

        // A single early cutoff at low depth says little about the move.
        if tried.len() == 1 && depth <= 3 {
            return;
        }

        for (i, &mv) in tried.iter().enumerate() {
            let good = i == tried.len() - 1;
            let piece = board.piece_on(mv.from()).map_or(PieceKind::Pawn, |p| p.kind());
            apply_bonus(&mut self.quiet[Self::quiet_index(board, mv)], depth, good);
            for (slot, parent) in parents.iter().enumerate() {
                if let Some(parent) = *parent {
                    let index = Self::continuation_index(parent, slot, piece, mv.to());
                    apply_bonus(&mut self.continuation[index], depth, good);
                }
            }
        }
    }

    /// Reward `best` if it is among the `tried` captures and penalise the rest.
    pub fn update_captures(&mut self, board: &Board, best: Move, tried: &[Move], depth: i32) {
        for &mv in tried {
            apply_bonus(&mut self.capture[Self::capture_index(board, mv)], depth, mv == best);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use vesper_core::{Board, Move, PieceKind, Square};

    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn parent(piece: PieceKind, to: &str) -> Option<ContKey> {
        Some(ContKey { tactical: false, piece, to: sq(to) })
    }

    #[test]
    fn bonus_grows_then_caps() {
        assert_eq!(stat_bonus(1), 16);
        assert_eq!(stat_bonus(2), 64 + 128);
        assert_eq!(stat_bonus(13), 16 * 169 + 128 * 12);
        assert_eq!(stat_bonus(14), 32);
        assert_eq!(stat_bonus(0), 0);
    }

    #[test]
    fn gravity_keeps_values_bounded() {
        let mut entry = 0i16;
        for _ in 0..1000 {
            apply_bonus(&mut entry, 12, true);
        }
        assert!(entry as i32 <= HISTORY_DIVISOR);
        assert!(entry > 15_000);
        for _ in 0..1000 {
            apply_bonus(&mut entry, 12, false);
        }
        assert!(entry as i32 >= -HISTORY_DIVISOR);
        assert!(entry < -15_000);
    }

    #[test]
    fn cutoff_move_gains_and_others_lose() {
        let board = Board::starting_position();
        let mut history = History::new();
        let parents = [parent(PieceKind::Pawn, "e5"), parent(PieceKind::Knight, "f3")];
        let bad = Move::new(sq("a2"), sq("a3"));
        let good = Move::new(sq("d2"), sq("d4"));
        history.update_quiets(&board, 3, parents, &[bad, good], 6);

        let good_score = history.quiet(&board, parents, good);
        let bad_score = history.quiet(&board, parents, bad);
        assert_eq!(good_score.counter, stat_bonus(6));
        assert_eq!(good_score.follow_up, stat_bonus(6));
        assert_eq!(good_score.total, 3 * stat_bonus(6));
        assert_eq!(bad_score.total, -3 * stat_bonus(6));

        assert_eq!(history.killers(3)[0], good);
        assert_eq!(history.counter_move(&board, parents[0]), good);
        assert_eq!(history.quiet(&board, [None, None], good).total, stat_bonus(6));
    }

    #[test]
    fn lone_shallow_cutoff_only_sets_refutations() {
        let board = Board::starting_position();
        let mut history = History::new();
        let mv = Move::new(sq("g1"), sq("f3"));
        history.update_quiets(&board, 0, [None, None], &[mv], 3);
        assert_eq!(history.killers(0), [mv, Move::NONE]);
        assert_eq!(history.quiet(&board, [None, None], mv).total, 0);
    }

    #[test]
    fn killers_shift_without_duplicates() {
        let board = Board::starting_position();
        let mut history = History::new();
        let first = Move::new(sq("g1"), sq("f3"));
        let second = Move::new(sq("b1"), sq("c3"));
        history.update_quiets(&board, 2, [None, None], &[first], 1);
        history.update_quiets(&board, 2, [None, None], &[first], 1);
        assert_eq!(history.killers(2), [first, Move::NONE]);
        history.update_quiets(&board, 2, [None, None], &[second], 1);
        assert_eq!(history.killers(2), [second, first]);
        history.clear_killers(2);
        assert_eq!(history.killers(2), [Move::NONE; 2]);
    }

    #[test]
    fn capture_history_tracks_best_capture() {
        let board: Board = "4k3/8/8/3p1r2/4P3/8/8/4K3 w - - 0 1".parse().unwrap();
        let mut history = History::new();
        let pawn = Move::new(sq("e4"), sq("d5"));
        let rook = Move::new(sq("e4"), sq("f5"));
        history.update_captures(&board, rook, &[pawn, rook], 5);
        assert_eq!(history.capture(&board, rook), stat_bonus(5));
        assert_eq!(history.capture(&board, pawn), -stat_bonus(5));
    }

    #[test]
    fn clear_resets_everything() {
        let board = Board::starting_position();
        let mut history = History::new();
        let mv = Move::new(sq("e2"), sq("e4"));
        history.update_quiets(&board, 1, [parent(PieceKind::Pawn, "d5"), None], &[mv, mv], 8);
        history.clear();
        assert_eq!(history.killers(1), [Move::NONE; 2]);
        assert_eq!(history.quiet(&board, [parent(PieceKind::Pawn, "d5"), None], mv), QuietHistory::default());
        assert_eq!(history.counter_move(&board, parent(PieceKind::Pawn, "d5")), Move::NONE);
    }
}
