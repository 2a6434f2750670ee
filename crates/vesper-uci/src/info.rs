//! Formatting of `info` and `bestmove` output.

use std::fmt::Write;

use vesper_core::Move;
use vesper_engine::{MATE, MATE_IN_MAX, ScoreBound, SearchReport, SearchResult};

/// `cp X` or, for mate scores, `mate M` with M in moves, negative when
/// the engine is getting mated.
pub fn format_score(score: i32) -> String {
    if score.abs() > MATE_IN_MAX {
        let moves = (MATE - score.abs() + 1) / 2;
        format!("mate {}", if score > 0 { moves } else { -moves })
    } else {
        format!("cp {score}")
    }
}

/// One `info` line for a finished iteration or line.
pub fn format_info(report: &SearchReport) -> String {
    let elapsed_ms = report.elapsed.as_millis() as u64;
    let nps = report.nodes * 1000 / elapsed_ms.max(1);

    let mut line = format!(
        "info depth {} seldepth {} multipv {} score {}",
        report.depth,
        report.seldepth,
        report.multipv,
        format_score(report.score)
    );
    match report.bound {
        ScoreBound::Lower => line.push_str(" lowerbound"),
        ScoreBound::Upper => line.push_str(" upperbound"),
        ScoreBound::Exact => {}
    }
    let _ = write!(
        line,
        " time {elapsed_ms} nodes {} nps {nps} tbhits {} hashfull {} pv",
        report.nodes, report.tbhits, report.hashfull
    );
    for mv in &report.pv {
        let _ = write!(line, " {mv}");
    }
    line
}

/// `bestmove B [ponder P]`, with `0000` when there is nothing to play.
pub fn format_bestmove(result: &SearchResult) -> String {
    match result.ponder_move {
        Some(ponder) if result.best_move != Move::NONE && !ponder.is_none_or_null() => {
            format!("bestmove {} ponder {ponder}", result.best_move)
        }
        _ => format!("bestmove {}", result.best_move),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use vesper_core::{Board, Move};
    use vesper_engine::{MATE, ScoreBound, SearchReport, SearchResult};

    use super::{format_bestmove, format_info, format_score};

    #[test]
    fn centipawn_and_mate_scores() {
        assert_eq!(format_score(0), "cp 0");
        assert_eq!(format_score(-35), "cp -35");
        assert_eq!(format_score(MATE - 1), "mate 1");
        assert_eq!(format_score(MATE - 3), "mate 2");
        assert_eq!(format_score(-(MATE - 2)), "mate -1");
        assert_eq!(format_score(-(MATE - 4)), "mate -2");
    }

    #[test]
    fn info_line_lists_every_field() {
        let board = Board::starting_position();
        let e2e4 = board.parse_uci_move("e2e4").unwrap();
        let report = SearchReport {
            depth: 7,
            seldepth: 11,
            multipv: 1,
            score: 24,
            bound: ScoreBound::Exact,
            elapsed: Duration::from_millis(500),
            nodes: 100_000,
            tbhits: 0,
            hashfull: 12,
            pv: vec![e2e4],
        };
        assert_eq!(
            format_info(&report),
            "info depth 7 seldepth 11 multipv 1 score cp 24 time 500 nodes 100000 nps 200000 tbhits 0 hashfull 12 pv e2e4"
        );
    }

    #[test]
    fn bounds_follow_the_score() {
        let report = SearchReport {
            depth: 5,
            seldepth: 5,
            multipv: 1,
            score: MATE - 5,
            bound: ScoreBound::Lower,
            elapsed: Duration::ZERO,
            nodes: 10,
            tbhits: 0,
            hashfull: 0,
            pv: Vec::new(),
        };
        assert!(format_info(&report).contains("score mate 3 lowerbound time 0 nodes 10 nps 10000"));

        let report = SearchReport { score: -40, bound: ScoreBound::Upper, ..report };
        assert!(format_info(&report).contains("score cp -40 upperbound"));
    }

    #[test]
    fn bestmove_with_and_without_ponder() {
        let board = Board::starting_position();
        let e2e4 = board.parse_uci_move("e2e4").unwrap();
        let mut result =
            SearchResult { best_move: e2e4, ponder_move: None, pv: vec![e2e4], score: 0, nodes: 1, depth: 1 };
        assert_eq!(format_bestmove(&result), "bestmove e2e4");

        let mut after = board.clone();
        after.apply(e2e4).unwrap();
        result.ponder_move = Some(after.parse_uci_move("c7c5").unwrap());
        assert_eq!(format_bestmove(&result), "bestmove e2e4 ponder c7c5");

        result.best_move = Move::NONE;
        assert_eq!(format_bestmove(&result), "bestmove 0000");
    }
}
