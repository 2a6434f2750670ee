//! UCI command parsing.

use std::ops::RangeInclusive;
use std::time::Duration;

use tracing::warn;
use vesper_core::{Board, Color, Move, MoveParseError};
use vesper_engine::SearchLimits;

use crate::error::UciError;

/// Transposition table size in MB.
pub const HASH_RANGE: RangeInclusive<usize> = 1..=65536;
pub const THREADS_RANGE: RangeInclusive<usize> = 1..=256;
pub const MULTI_PV_RANGE: RangeInclusive<usize> = 1..=256;
/// Clock time kept in reserve per move, in milliseconds.
pub const MOVE_OVERHEAD_RANGE: RangeInclusive<u64> = 0..=10_000;

/// Parameters for the `go` command.
///
/// All fields are optional; a bare `go` searches on the clock, or without
/// limit if no clock was given.
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub movestogo: Option<u32>,
    pub depth: Option<i32>,
    pub movetime: Option<Duration>,
    pub nodes: Option<u64>,
    /// Root moves to consider, as written by the GUI.
    pub searchmoves: Vec<String>,
    /// Search until `stop`.
    pub infinite: bool,
    pub ponder: bool,
    /// Count leaf nodes to this depth instead of searching.
    pub perft: Option<usize>,
}

impl GoParams {
    /// Limits for a search of `board` by the side to move.
    ///
    /// `searchmoves` entries that are not legal in `board` are dropped.
    pub fn to_limits(&self, board: &Board, multi_pv: usize) -> SearchLimits {
        let (time, increment) = match board.side_to_move() {
            Color::White => (self.wtime, self.winc),
            Color::Black => (self.btime, self.binc),
        };

        let search_moves = self
            .searchmoves
            .iter()
            .filter_map(|text| match board.parse_uci_move(text) {
                Ok(mv) => Some(mv),
                Err(err) => {
                    warn!(%err, "ignoring searchmoves entry");
                    None
                }
            })
            .collect();

        SearchLimits {
            depth: self.depth,
            movetime: self.movetime,
            time,
            increment: increment.unwrap_or_default(),
            moves_to_go: self.movestogo,
            nodes: self.nodes,
            search_moves,
            multi_pv,
            infinite: self.infinite,
            ponder: self.ponder,
            ..SearchLimits::default()
        }
    }
}

/// An engine option set through `setoption`, already clamped to its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UciOption {
    Hash(usize),
    Threads(usize),
    MultiPv(usize),
    MoveOverhead(Duration),
    Ponder(bool),
}

/// A parsed UCI command.
#[derive(Debug)]
pub enum Command {
    /// `uci` -- identify the engine.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- reset engine state.
    UciNewGame,
    /// `position` -- the board after the listed moves, with their history.
    Position(Box<Board>),
    /// `go` -- start searching with given parameters.
    Go(GoParams),
    SetOption(UciOption),
    /// `ponderhit` -- opponent played the expected move during pondering.
    PonderHit,
    /// `stop` -- halt the current search.
    Stop,
    /// `quit` -- exit the engine.
    Quit,
    /// Anything else; ignored as the protocol requires.
    Unknown(String),
}

/// Parse a single line of UCI input into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&first, rest)) = tokens.split_first() else {
        return Ok(Command::Unknown(String::new()));
    };

    match first {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "ponderhit" => Ok(Command::PonderHit),
        "position" => parse_position(rest),
        "go" => parse_go(rest),
        "setoption" => parse_setoption(rest),
        _ => Ok(Command::Unknown(first.to_string())),
    }
}

/// Parse the `position` command arguments.
///
/// Supports:
/// - `position startpos [moves e2e4 d7d5 ...]`
/// - `position fen <fen-string> [moves e2e4 d7d5 ...]`
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    let moves_at = tokens.iter().position(|&t| t == "moves").unwrap_or(tokens.len());
    let (setup, moves) = tokens.split_at(moves_at);

    let mut board = match setup.split_first() {
        Some((&"startpos", _)) => Board::starting_position(),
        Some((&"fen", fields)) => {
            let fen = fields.join(" ");
            fen.parse().map_err(|source| UciError::InvalidFen { fen: fen.clone(), source })?
        }
        _ => return Err(UciError::MalformedPosition),
    };

    for &text in moves.iter().skip(1) {
        let mv = board.parse_uci_move(text)?;
        apply_legal(&mut board, mv, text)?;
    }

    Ok(Command::Position(Box::new(board)))
}

fn apply_legal(board: &mut Board, mv: Move, text: &str) -> Result<(), UciError> {
    match board.apply(mv) {
        Some(_) => Ok(()),
        None => Err(MoveParseError::Illegal { text: text.to_string() }.into()),
    }
}

/// Parse the `go` command arguments. Unknown tokens are skipped.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut i = 0;
    while i < tokens.len() {
        let value = tokens.get(i + 1).copied();
        match tokens[i] {
            "wtime" => params.wtime = Some(parse_millis(value, "wtime")?),
            "btime" => params.btime = Some(parse_millis(value, "btime")?),
            "winc" => params.winc = Some(parse_millis(value, "winc")?),
            "binc" => params.binc = Some(parse_millis(value, "binc")?),
            "movestogo" => params.movestogo = Some(parse_value(value, "movestogo")?),
            "depth" => params.depth = Some(parse_value(value, "depth")?),
            "movetime" => params.movetime = Some(parse_millis(value, "movetime")?),
            "nodes" => params.nodes = Some(parse_value(value, "nodes")?),
            "perft" => params.perft = Some(parse_value(value, "perft")?),
            "infinite" => params.infinite = true,
            "ponder" => params.ponder = true,
            "searchmoves" => {
                // Everything up to the next keyword is a move.
                let moves: Vec<String> =
                    tokens[i + 1..].iter().take_while(|t| !is_go_keyword(t)).map(|t| t.to_string()).collect();
                i += moves.len() + 1;
                params.searchmoves = moves;
                continue;
            }
            _ => {
                i += 1;
                continue;
            }
        }
        i += if matches!(tokens[i], "infinite" | "ponder") { 1 } else { 2 };
    }

    Ok(Command::Go(params))
}

fn is_go_keyword(token: &str) -> bool {
    matches!(
        token,
        "wtime"
            | "btime"
            | "winc"
            | "binc"
            | "movestogo"
            | "depth"
            | "movetime"
            | "nodes"
            | "perft"
            | "infinite"
            | "ponder"
            | "searchmoves"
    )
}

/// Parse `name <name> [value <value>]`. Option names are case-insensitive
/// and may contain spaces.
fn parse_setoption(tokens: &[&str]) -> Result<Command, UciError> {
    let Some((&"name", rest)) = tokens.split_first() else {
        return Err(UciError::MalformedOption);
    };
    let value_at = rest.iter().position(|&t| t == "value").unwrap_or(rest.len());
    let name = rest[..value_at].join(" ");
    let value = rest.get(value_at + 1..).map(|v| v.join(" ")).filter(|v| !v.is_empty());
    let value = value.as_deref();

    let option = match name.to_ascii_lowercase().as_str() {
        "hash" => UciOption::Hash(parse_spin(value, "Hash", HASH_RANGE)?),
        "threads" => UciOption::Threads(parse_spin(value, "Threads", THREADS_RANGE)?),
        "multipv" => UciOption::MultiPv(parse_spin(value, "MultiPV", MULTI_PV_RANGE)?),
        "moveoverhead" => {
            UciOption::MoveOverhead(Duration::from_millis(parse_spin(value, "MoveOverhead", MOVE_OVERHEAD_RANGE)?))
        }
        "ponder" => UciOption::Ponder(parse_value(value, "Ponder")?),
        _ => return Err(UciError::UnknownOption { name }),
    };
    Ok(Command::SetOption(option))
}

/// Parse a spin option and clamp it into `range`.
fn parse_spin<T>(value: Option<&str>, param: &str, range: RangeInclusive<T>) -> Result<T, UciError>
where
    T: std::str::FromStr + Ord + Copy,
{
    let parsed: T = parse_value(value, param)?;
    Ok(parsed.clamp(*range.start(), *range.end()))
}

/// Parse a millisecond value. Negative clock times, which some GUIs send
/// when a flag falls, count as zero.
fn parse_millis(value: Option<&str>, param: &str) -> Result<Duration, UciError> {
    let ms: i64 = parse_value(value, param)?;
    Ok(Duration::from_millis(ms.max(0) as u64))
}

fn parse_value<T: std::str::FromStr>(value: Option<&str>, param: &str) -> Result<T, UciError> {
    let value = value.ok_or_else(|| UciError::MissingValue { param: param.to_string() })?;
    value.parse().map_err(|_| UciError::InvalidValue { param: param.to_string(), value: value.to_string() })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use vesper_core::{Board, STARTING_FEN};

    use super::*;

    fn go(line: &str) -> GoParams {
        match parse_command(line).unwrap() {
            Command::Go(params) => params,
            other => panic!("expected Go, got {other:?}"),
        }
    }

    fn position(line: &str) -> Board {
        match parse_command(line).unwrap() {
            Command::Position(board) => *board,
            other => panic!("expected Position, got {other:?}"),
        }
    }

    fn option(line: &str) -> UciOption {
        match parse_command(line).unwrap() {
            Command::SetOption(option) => option,
            other => panic!("expected SetOption, got {other:?}"),
        }
    }

    #[test]
    fn parse_simple_commands() {
        assert!(matches!(parse_command("uci").unwrap(), Command::Uci));
        assert!(matches!(parse_command("isready").unwrap(), Command::IsReady));
        assert!(matches!(parse_command("ucinewgame").unwrap(), Command::UciNewGame));
        assert!(matches!(parse_command("stop").unwrap(), Command::Stop));
        assert!(matches!(parse_command("ponderhit").unwrap(), Command::PonderHit));
        assert!(matches!(parse_command("  quit  ").unwrap(), Command::Quit));
    }

    #[test]
    fn parse_position_startpos() {
        assert_eq!(position("position startpos").to_fen(), STARTING_FEN);
    }

    #[test]
    fn parse_position_startpos_with_moves() {
        let board = position("position startpos moves e2e4 e7e5 g1f3");
        assert_eq!(board.to_fen(), "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2");
    }

    #[test]
    fn parse_position_fen_with_and_without_counters() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        assert_eq!(position(&format!("position fen {fen}")).to_fen(), fen);

        let board = position("position fen 4k3/8/8/8/8/8/8/4K2R w K - moves e1g1");
        assert_eq!(board.to_fen(), "4k3/8/8/8/8/8/8/5RK1 b - - 1 1");
    }

    #[test]
    fn position_moves_build_repetition_history() {
        let board = position("position startpos moves g1f3 g8f6 f3g1 f6g8 g1f3 g8f6 f3g1 f6g8");
        assert!(board.is_repetition(0));
    }

    #[test]
    fn parse_position_errors() {
        assert!(matches!(parse_command("position"), Err(UciError::MalformedPosition)));
        assert!(matches!(parse_command("position fen invalid"), Err(UciError::InvalidFen { .. })));
        assert!(matches!(parse_command("position startpos moves e2e5"), Err(UciError::InvalidMove { .. })));
    }

    #[test]
    fn parse_go_bare_defaults() {
        let params = go("go");
        assert!(params.depth.is_none());
        assert!(params.wtime.is_none());
        assert!(params.searchmoves.is_empty());
        assert!(!params.infinite);
        assert!(!params.ponder);
    }

    #[test]
    fn parse_go_clock() {
        let params = go("go ponder wtime 300000 btime 290000 winc 2000 binc 1000 movestogo 20");
        assert!(params.ponder);
        assert_eq!(params.wtime, Some(Duration::from_millis(300_000)));
        assert_eq!(params.btime, Some(Duration::from_millis(290_000)));
        assert_eq!(params.winc, Some(Duration::from_millis(2_000)));
        assert_eq!(params.binc, Some(Duration::from_millis(1_000)));
        assert_eq!(params.movestogo, Some(20));
    }

    #[test]
    fn parse_go_fixed_limits() {
        assert_eq!(go("go depth 6").depth, Some(6));
        assert_eq!(go("go movetime 5000").movetime, Some(Duration::from_millis(5_000)));
        assert_eq!(go("go nodes 1000000").nodes, Some(1_000_000));
        assert_eq!(go("go perft 4").perft, Some(4));
        assert!(go("go infinite").infinite);
        assert_eq!(go("go wtime -150").wtime, Some(Duration::ZERO));
    }

    #[test]
    fn parse_go_searchmoves_stops_at_keywords() {
        let params = go("go searchmoves e2e4 d2d4 depth 3");
        assert_eq!(params.searchmoves, vec!["e2e4", "d2d4"]);
        assert_eq!(params.depth, Some(3));

        let params = go("go infinite searchmoves g1f3");
        assert!(params.infinite);
        assert_eq!(params.searchmoves, vec!["g1f3"]);
    }

    #[test]
    fn parse_go_errors() {
        assert!(matches!(parse_command("go wtime"), Err(UciError::MissingValue { .. })));
        assert!(matches!(parse_command("go depth abc"), Err(UciError::InvalidValue { .. })));
    }

    #[test]
    fn limits_use_the_clock_of_the_side_to_move() {
        let params = go("go wtime 1000 btime 2000 winc 10 binc 20 searchmoves e7e5 e2e4");
        let black = position("position startpos moves e2e4");
        let limits = params.to_limits(&black, 2);
        assert_eq!(limits.time, Some(Duration::from_millis(2_000)));
        assert_eq!(limits.increment, Duration::from_millis(20));
        assert_eq!(limits.multi_pv, 2);
        // e2e4 is not a black move.
        assert_eq!(limits.search_moves, vec![black.parse_uci_move("e7e5").unwrap()]);

        let white = Board::starting_position();
        let limits = params.to_limits(&white, 1);
        assert_eq!(limits.time, Some(Duration::from_millis(1_000)));
        assert_eq!(limits.search_moves, vec![white.parse_uci_move("e2e4").unwrap()]);
    }

    #[test]
    fn parse_setoption() {
        assert_eq!(option("setoption name Hash value 128"), UciOption::Hash(128));
        assert_eq!(option("setoption name threads value 4"), UciOption::Threads(4));
        assert_eq!(option("setoption name MultiPV value 3"), UciOption::MultiPv(3));
        assert_eq!(option("setoption name MoveOverhead value 50"), UciOption::MoveOverhead(Duration::from_millis(50)));
        assert_eq!(option("setoption name Ponder value true"), UciOption::Ponder(true));
    }

    #[test]
    fn setoption_clamps_spins() {
        assert_eq!(option("setoption name Hash value 0"), UciOption::Hash(1));
        assert_eq!(option("setoption name Threads value 100000"), UciOption::Threads(256));
    }

    #[test]
    fn setoption_errors() {
        assert!(matches!(parse_command("setoption"), Err(UciError::MalformedOption)));
        assert!(matches!(parse_command("setoption name Hash"), Err(UciError::MissingValue { .. })));
        assert!(matches!(parse_command("setoption name Hash value big"), Err(UciError::InvalidValue { .. })));
        assert!(matches!(
            parse_command("setoption name Clear Hash"),
            Err(UciError::UnknownOption { name }) if name == "Clear Hash"
        ));
    }

    #[test]
    fn parse_unknown_and_empty() {
        assert!(matches!(parse_command("foobar").unwrap(), Command::Unknown(_)));
        assert!(matches!(parse_command("").unwrap(), Command::Unknown(_)));
    }
}
