//! Protocol errors.

use vesper_core::{FenError, MoveParseError};

/// Errors raised while parsing or executing a protocol command.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// `position` without `startpos` or `fen`.
    #[error("malformed position command: missing startpos or fen keyword")]
    MalformedPosition,

    #[error("invalid FEN \"{fen}\": {source}")]
    InvalidFen {
        fen: String,
        #[source]
        source: FenError,
    },

    /// A move of a `position ... moves` list is not legal where it is played.
    #[error("invalid move in position command: {source}")]
    InvalidMove {
        #[from]
        source: MoveParseError,
    },

    /// A `go` or `setoption` parameter is missing its value.
    #[error("missing value for {param}")]
    MissingValue { param: String },

    #[error("invalid value for {param}: {value}")]
    InvalidValue { param: String, value: String },

    /// `setoption` without a `name`.
    #[error("malformed setoption command")]
    MalformedOption,

    #[error("unknown option: {name}")]
    UnknownOption { name: String },

    /// Reading stdin failed.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}
