//! Perft: leaf-node counts used to verify move generation and make/unmake.

use crate::board::Board;
use crate::chess_move::MoveList;

/// Count the leaf nodes of the legal move tree at `depth`.
pub fn perft(board: &mut Board, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut moves = MoveList::new();
    board.gen_all(&mut moves);

    let mut nodes = 0;
    for mv in moves.iter() {
        if let Some(undo) = board.apply(mv) {
            nodes += perft(board, depth - 1);
            board.revert(mv, &undo);
        }
    }
    nodes
}

/// Per-move breakdown, sorted by move text.
pub fn divide(board: &mut Board, depth: usize) -> Vec<(String, u64)> {
    let mut results: Vec<(String, u64)> = board
        .legal_moves()
        .iter()
        .filter_map(|mv| {
            let undo = board.apply(mv)?;
            let count = perft(board, depth.saturating_sub(1));
            board.revert(mv, &undo);
            Some((mv.to_string(), count))
        })
        .collect();
    results.sort();
    results
}
