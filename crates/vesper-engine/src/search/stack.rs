//! Per-ply search state shared between a node and its children.

use vesper_core::Move;

use crate::search::MAX_PLY;
use crate::search::history::ContKey;
use crate::search::picker::Picker;

/// Sentinel entries below the root, so that `height - 2` is always valid.
pub const STACK_OFFSET: usize = 4;
/// Entries in a search stack.
pub const STACK_SIZE: usize = MAX_PLY + STACK_OFFSET + 2;

/// State of one node on the current search path.
#[derive(Debug)]
pub struct NodeState {
    /// Static evaluation, or `VALUE_NONE` when in check.
    pub eval: i32,
    /// Move played from this node toward the current child.
    pub mv: Move,
    pub tactical: bool,
    /// Continuation history key of `mv`; `None` for null moves.
    pub continuation: Option<ContKey>,
    /// Move skipped during a singular extension search.
    pub excluded: Move,
    /// Double extensions applied on the path to this node.
    pub double_extensions: i32,
    pub picker: Picker,
}

impl NodeState {
    pub fn new() -> Self {
        Self {
            eval: 0,
            mv: Move::NONE,
            tactical: false,
            continuation: None,
            excluded: Move::NONE,
            double_extensions: 0,
            picker: Picker::new(),
        }
    }

    fn reset(&mut self) {
        self.eval = 0;
        self.mv = Move::NONE;
        self.tactical = false;
        self.continuation = None;
        self.excluded = Move::NONE;
        self.double_extensions = 0;
    }
}

impl Default for NodeState {
    fn default() -> Self {
        Self::new()
    }
}

/// A fresh stack of node states.
pub fn new_stack() -> Vec<NodeState> {
    (0..STACK_SIZE).map(|_| NodeState::new()).collect()
}

/// Clear every entry before a new search.
pub fn reset_stack(stack: &mut [NodeState]) {
    stack.iter_mut().for_each(NodeState::reset);
}
