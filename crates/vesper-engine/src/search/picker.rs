//! Staged move picker.
//!
//! Moves are generated lazily and handed out in stages: the table move,
//! winning captures, killers, the counter move, quiets by history and
//! finally losing captures. Each stage selects its best remaining move by
//! partial selection sort.

use vesper_core::{Board, MAX_MOVES, Move, MoveList, PieceKind};

use crate::search::history::{ContKey, History};
use crate::search::see::see;

/// MVV bonus by captured piece, pawn through queen.
const MVV_AUGMENT: [i32; 5] = [0, 2400, 2400, 4800, 9600];

/// Base score of noisy moves, keeping them positive unless penalised.
const NOISY_BASE: i32 = 64_000;

/// Picker stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Table,
    GenerateNoisy,
    GoodNoisy,
    Killer1,
    Killer2,
    CounterMove,
    GenerateQuiet,
    Quiet,
    BadNoisy,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PickerKind {
    /// Every move of the position.
    Full,
    /// Captures and promotions that pass a SEE threshold.
    Noisy,
}

/// Hands out the moves of one node in search order.
pub struct Picker {
    kind: PickerKind,
    stage: Stage,
    threshold: i32,
    tt_move: Move,
    killers: [Move; 2],
    counter: Move,
    parents: [Option<ContKey>; 2],
    /// Noisy moves occupy `0..noisy_size`, quiets `split..split + quiet_size`.
    list: MoveList,
    scores: [i32; MAX_MOVES],
    split: usize,
    noisy_size: usize,
    quiet_size: usize,
}

impl Picker {
    pub fn new() -> Self {
        Self {
            kind: PickerKind::Full,
            stage: Stage::Done,
            threshold: 0,
            tt_move: Move::NONE,
            killers: [Move::NONE; 2],
            counter: Move::NONE,
            parents: [None; 2],
            list: MoveList::new(),
            scores: [0; MAX_MOVES],
            split: 0,
            noisy_size: 0,
            quiet_size: 0,
        }
    }

    /// Prepare to walk every move of a main search node.
    pub fn init(&mut self, tt_move: Move, killers: [Move; 2], counter: Move, parents: [Option<ContKey>; 2]) {
        self.kind = PickerKind::Full;
        self.stage = Stage::Table;
        self.threshold = 0;
        self.tt_move = tt_move;
        self.killers = killers;
        self.counter = counter;
        self.parents = parents;
        self.reset_lists();
    }

    /// Prepare to walk the captures of a quiescence or ProbCut node that
    /// win at least `threshold`.
    pub fn init_noisy(&mut self, tt_move: Move, threshold: i32) {
        self.kind = PickerKind::Noisy;
        self.stage = Stage::Table;
        self.threshold = threshold;
        self.tt_move = tt_move;
        self.killers = [Move::NONE; 2];
        self.counter = Move::NONE;
        self.parents = [None; 2];
        self.reset_lists();
    }

    fn reset_lists(&mut self) {
        self.list.clear();
        self.split = 0;
        self.noisy_size = 0;
        self.quiet_size = 0;
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Restart from move generation, keeping the table move and refutations.
    pub fn rewind(&mut self) {
        self.stage = Stage::GenerateNoisy;
    }

    /// Stop handing out moves.
    pub fn finish(&mut self) {
        self.stage = Stage::Done;
    }

    /// The next move to search, or `None` when the node is exhausted.
    ///
    /// With `skip_quiets` set, the remaining quiet stages are passed over.
    pub fn next(&mut self, board: &Board, history: &History, skip_quiets: bool) -> Option<Move> {
        loop {
            match self.stage {
                Stage::Table => {
                    self.stage = Stage::GenerateNoisy;
                    if self.table_move_fits(board) {
                        return Some(self.tt_move);
                    }
                }
                Stage::GenerateNoisy => {
                    self.list.clear();
                    board.gen_noisy(&mut self.list);
                    self.noisy_size = self.list.len();
                    self.split = self.noisy_size;
                    self.quiet_size = 0;
                    self.score_noisy(board, history);
                    self.stage = Stage::GoodNoisy;
                }
                Stage::GoodNoisy => {
                    if let Some(mv) = self.next_good_noisy(board) {
                        return Some(mv);
                    }
                    self.stage = match self.kind {
                        PickerKind::Noisy => Stage::Done,
                        PickerKind::Full if skip_quiets => Stage::BadNoisy,
                        PickerKind::Full => Stage::Killer1,
                    };
                }
                Stage::Killer1 => {
                    self.stage = Stage::Killer2;
                    let killer = self.killers[0];
                    if !skip_quiets && killer != self.tt_move && board.is_pseudo_legal(killer) {
                        return Some(killer);
                    }
                }
                Stage::Killer2 => {
                    self.stage = Stage::CounterMove;
                    let killer = self.killers[1];
                    if !skip_quiets && killer != self.tt_move && board.is_pseudo_legal(killer) {
                        return Some(killer);
                    }
                }
                Stage::CounterMove => {
                    self.stage = Stage::GenerateQuiet;
                    let counter = self.counter;
                    if !skip_quiets
                        && counter != self.tt_move
                        && !self.killers.contains(&counter)
                        && board.is_pseudo_legal(counter)
                    {
                        return Some(counter);
                    }
                }
                Stage::GenerateQuiet => {
                    if !skip_quiets {
                        board.gen_quiet(&mut self.list);
                        self.quiet_size = self.list.len() - self.split;
                        self.score_quiet(board, history);
                    }
                    self.stage = Stage::Quiet;
                }
                Stage::Quiet => {
                    let quiet = if skip_quiets { None } else { self.next_quiet() };
                    if quiet.is_some() {
                        return quiet;
                    }
                    self.stage = Stage::BadNoisy;
                }
                Stage::BadNoisy => {
                    if self.kind == PickerKind::Full {
                        while self.noisy_size > 0 {
                            let mv = self.pop_noisy(0);
                            if mv != self.tt_move {
                                return Some(mv);
                            }
                        }
                    }
                    self.stage = Stage::Done;
                }
                Stage::Done => return None,
            }
        }
    }

    fn table_move_fits(&self, board: &Board) -> bool {
        if !board.is_pseudo_legal(self.tt_move) {
            return false;
        }
        match self.kind {
            PickerKind::Full => true,
            PickerKind::Noisy => board.is_tactical(self.tt_move) && see(board, self.tt_move, self.threshold),
        }
    }

    fn score_noisy(&mut self, board: &Board, history: &History) {
        for i in 0..self.noisy_size {
            let mv = self.list.as_slice()[i];
            let captured = match board.piece_on(mv.to()) {
                Some(piece) if !mv.is_en_passant() => piece.kind().index().min(MVV_AUGMENT.len() - 1),
                _ => PieceKind::Pawn.index(),
            };
            self.scores[i] = match mv.promotion_piece() {
                Some(PieceKind::Queen) | None => {
                    let queening = if mv.is_promotion() { NOISY_BASE } else { 0 };
                    NOISY_BASE + history.capture(board, mv) + MVV_AUGMENT[captured] + queening
                }
                Some(_) => -1,
            };
        }
    }

    fn score_quiet(&mut self, board: &Board, history: &History) {
        for i in self.split..self.split + self.quiet_size {
            let mv = self.list.as_slice()[i];
            self.scores[i] = history.quiet(board, self.parents, mv).total;
        }
    }

    fn best_index(&self, start: usize, end: usize) -> usize {
        let mut best = start;
        for i in start + 1..end {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }
        best
    }

    /// Remove the noisy move at `index`, filling the hole with the last one.
    fn pop_noisy(&mut self, index: usize) -> Move {
        self.noisy_size -= 1;
        let last = self.noisy_size;
        let moves = self.list.as_mut_slice();
        let mv = moves[index];
        moves[index] = moves[last];
        self.scores[index] = self.scores[last];
        mv
    }

    fn pop_quiet(&mut self, index: usize) -> Move {
        self.quiet_size -= 1;
        let last = self.split + self.quiet_size;
        let moves = self.list.as_mut_slice();
        let mv = moves[index];
        moves[index] = moves[last];
        self.scores[index] = self.scores[last];
        mv
    }

    fn next_good_noisy(&mut self, board: &Board) -> Option<Move> {
        while self.noisy_size > 0 {
            let best = self.best_index(0, self.noisy_size);
            if self.scores[best] < 0 {
                break;
            }
            if !see(board, self.list.as_slice()[best], self.threshold) {
                self.scores[best] = -1;
                continue;
            }
            let mv = self.pop_noisy(best);
            if mv == self.tt_move {
                continue;
            }
            for killer in &mut self.killers {
                if *killer == mv {
                    *killer = Move::NONE;
                }
            }
            if self.counter == mv {
                self.counter = Move::NONE;
            }
            return Some(mv);
        }
        None
    }

    fn next_quiet(&mut self) -> Option<Move> {
        while self.quiet_size > 0 {
            let best = self.best_index(self.split, self.split + self.quiet_size);
            let mv = self.pop_quiet(best);
            if mv == self.tt_move || self.killers.contains(&mv) || mv == self.counter {
                continue;
            }
            return Some(mv);
        }
        None
    }
}

impl Default for Picker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Picker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Picker")
            .field("stage", &self.stage)
            .field("tt_move", &self.tt_move)
            .field("noisy_size", &self.noisy_size)
            .field("quiet_size", &self.quiet_size)
            .finish()
    }
}
