//! Search and evaluation for vesper.

pub mod eval;
pub mod search;
pub mod tablebase;

pub use eval::{Classical, Evaluator, evaluate};
pub use search::control::SearchControl;
pub use search::limits::SearchLimits;
pub use search::pool::{DEFAULT_MOVE_OVERHEAD, SEARCH_STACK_SIZE, ThreadPool};
pub use search::{MATE, MATE_IN_MAX, ScoreBound, SearchReport, SearchResult};
pub use tablebase::{NoTablebase, Tablebase, Wdl};
