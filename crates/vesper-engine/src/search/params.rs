//! Search tuning constants and the reduction/pruning tables built from them.

use std::sync::OnceLock;

pub const WINDOW_DEPTH: i32 = 4;
pub const WINDOW_SIZE: i32 = 10;
/// Aspiration results outside the window are reported once this many ms have passed.
pub const WINDOW_TIMER_MS: u64 = 2500;

pub const TT_RESEARCH_MARGIN: i32 = 141;

pub const BETA_PRUNING_DEPTH: i32 = 8;
pub const BETA_MARGIN: i32 = 65;

pub const ALPHA_PRUNING_DEPTH: i32 = 4;
pub const ALPHA_MARGIN: i32 = 3488;

pub const NULL_MOVE_PRUNING_DEPTH: i32 = 2;

pub const PROBCUT_DEPTH: i32 = 5;
pub const PROBCUT_MARGIN: i32 = 100;

pub const FUTILITY_PRUNING_DEPTH: i32 = 8;
pub const FUTILITY_MARGIN_BASE: i32 = 92;
pub const FUTILITY_MARGIN_PER_DEPTH: i32 = 59;
pub const FUTILITY_MARGIN_NO_HISTORY: i32 = 158;
/// Indexed by `improving`.
pub const FUTILITY_PRUNING_HISTORY_LIMIT: [i32; 2] = [12_000, 6_000];

pub const CONTINUATION_PRUNING_DEPTH: [i32; 2] = [3, 2];
pub const CONTINUATION_PRUNING_HISTORY_LIMIT: [i32; 2] = [-1000, -2500];

pub const LATE_MOVE_PRUNING_DEPTH: i32 = 8;

pub const SEE_PRUNING_DEPTH: i32 = 9;
pub const SEE_QUIET_MARGIN: i32 = -64;
pub const SEE_NOISY_MARGIN: i32 = -19;

pub const QS_SEE_MARGIN: i32 = 110;
pub const QS_DELTA_MARGIN: i32 = 150;

pub const SINGULAR_DEPTH: i32 = 8;
pub const MAX_DOUBLE_EXTENSIONS: i32 = 6;

struct Tables {
    lmr: [[i32; 64]; 64],
    lmp: [[i32; 11]; 2],
}

static TABLES: OnceLock<Tables> = OnceLock::new();

fn tables() -> &'static Tables {
    TABLES.get_or_init(|| {
        let mut lmr = [[0; 64]; 64];
        for (depth, row) in lmr.iter_mut().enumerate().skip(1) {
            for (played, cell) in row.iter_mut().enumerate().skip(1) {
                *cell = (0.7844 + (depth as f64).ln() * (played as f64).ln() / 2.4696) as i32;
            }
        }
        let mut lmp = [[0; 11]; 2];
        for depth in 1..=10 {
            let d2 = (depth * depth) as f64;
            lmp[0][depth] = (2.0767 + 0.3743 * d2) as i32;
            lmp[1][depth] = (3.8733 + 0.7124 * d2) as i32;
        }
        Tables { lmr, lmp }
    })
}

/// Base late move reduction for a move searched `played`-th at `depth`.
#[inline]
pub fn lmr_reduction(depth: i32, played: i32) -> i32 {
    tables().lmr[depth.clamp(0, 63) as usize][played.clamp(0, 63) as usize]
}

/// Moves to try before quiets are skipped at `depth`.
#[inline]
pub fn late_move_count(improving: bool, depth: i32) -> i32 {
    tables().lmp[improving as usize][depth.clamp(0, 10) as usize]
}

#[cfg(test)]
mod tests {
    use super::{late_move_count, lmr_reduction};

    #[test]
    fn lmr_grows_with_depth_and_move_number() {
        assert_eq!(lmr_reduction(1, 1), 0);
        assert!(lmr_reduction(20, 30) > lmr_reduction(4, 4));
        assert_eq!(lmr_reduction(200, 200), lmr_reduction(63, 63));
    }

    #[test]
    fn improving_nodes_allow_more_moves() {
        assert_eq!(late_move_count(false, 1), 2);
        assert_eq!(late_move_count(true, 1), 4);
        for depth in 1..=8 {
            assert!(late_move_count(true, depth) > late_move_count(false, depth));
        }
    }
}
