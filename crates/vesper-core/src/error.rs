//! Error types for FEN parsing, board validation and move parsing.

use crate::color::Color;

/// Errors that occur when parsing a FEN string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    /// The FEN string has neither 4 nor 6 space-separated fields.
    #[error("expected 4 or 6 FEN fields, found {found}")]
    WrongFieldCount { found: usize },

    /// The piece placement section does not have exactly 8 ranks.
    #[error("expected 8 ranks in piece placement, found {found}")]
    WrongRankCount { found: usize },

    /// A rank describes more or fewer than 8 squares.
    #[error("rank {rank_index} describes {length} squares, expected 8")]
    BadRankLength {
        /// Zero-based rank index (0 = rank 8 in FEN).
        rank_index: usize,
        length: usize,
    },

    #[error("invalid piece character: '{character}'")]
    InvalidPieceChar { character: char },

    #[error("invalid active color: \"{found}\"")]
    InvalidColor { found: String },

    #[error("invalid castling character: '{character}'")]
    InvalidCastlingChar { character: char },

    #[error("invalid en passant square: \"{found}\"")]
    InvalidEnPassant { found: String },

    #[error("invalid {field}: \"{found}\"")]
    InvalidMoveCounter { field: &'static str, found: String },

    /// The parsed position fails structural validation.
    #[error("invalid board: {source}")]
    InvalidBoard {
        #[from]
        source: BoardError,
    },
}

/// Errors from structural validation of a [`Board`](crate::board::Board).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// A side does not have exactly one king.
    #[error("expected 1 king for {color}, found {count}")]
    InvalidKingCount { color: Color, count: u32 },

    /// Pawns occupy the first or eighth rank.
    #[error("pawns found on back rank")]
    PawnsOnBackRank,

    /// The side not to move is in check.
    #[error("side not to move is in check")]
    OpponentInCheck,
}

/// A move string that names no legal move in the current position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveParseError {
    #[error("illegal or malformed move: {text}")]
    Illegal { text: String },
}

#[cfg(test)]
mod tests {
    use super::{BoardError, FenError};

    #[test]
    fn fen_error_display() {
        let err = FenError::WrongFieldCount { found: 2 };
        assert_eq!(format!("{err}"), "expected 4 or 6 FEN fields, found 2");
    }

    #[test]
    fn fen_error_from_board_error() {
        let fen_err: FenError = BoardError::PawnsOnBackRank.into();
        assert_eq!(fen_err.to_string(), "invalid board: pawns found on back rank");
    }
}
