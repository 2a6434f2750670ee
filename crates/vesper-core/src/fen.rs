//! FEN string parsing and serialization for [`Board`].

use std::fmt;
use std::str::FromStr;

use crate::attacks::pawn_attacks;
use crate::board::Board;
use crate::castle_rights::{CastlePath, CastleRights, CastleSide};
use crate::color::Color;
use crate::error::FenError;
use crate::piece::{Piece, PieceKind};
use crate::square::Square;

/// The FEN string for the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn parse_castling(field: &str) -> Result<CastleRights, FenError> {
    if field == "-" {
        return Ok(CastleRights::NONE);
    }
    let mut rights = CastleRights::NONE;
    for c in field.chars() {
        rights = match c {
            'K' => rights.with(Color::White, CastleSide::KingSide),
            'Q' => rights.with(Color::White, CastleSide::QueenSide),
            'k' => rights.with(Color::Black, CastleSide::KingSide),
            'q' => rights.with(Color::Black, CastleSide::QueenSide),
            _ => return Err(FenError::InvalidCastlingChar { character: c }),
        };
    }
    Ok(rights)
}

fn parse_counter(field: Option<&str>, name: &'static str, default: u16) -> Result<u16, FenError> {
    match field {
        None => Ok(default),
        Some(text) => text.parse().map_err(|_| FenError::InvalidMoveCounter {
            field: name,
            found: text.to_string(),
        }),
    }
}

impl FromStr for Board {
    type Err = FenError;

    /// Parse a FEN string. The two move counters may be omitted.
    fn from_str(fen: &str) -> Result<Board, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 4 && fields.len() != 6 {
            return Err(FenError::WrongFieldCount { found: fields.len() });
        }

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::WrongRankCount { found: ranks.len() });
        }

        let mut board = Board::empty();
        for (rank_index, rank_str) in ranks.iter().enumerate() {
            // FEN ranks go from 8 to 1
            let rank = 7 - rank_index as u8;
            let mut file: u8 = 0;
            for c in rank_str.chars() {
                if let Some(digit) = c.to_digit(10) {
                    if !(1..=8).contains(&digit) {
                        return Err(FenError::InvalidPieceChar { character: c });
                    }
                    file += digit as u8;
                } else {
                    let piece = Piece::from_fen_char(c).ok_or(FenError::InvalidPieceChar { character: c })?;
                    if file >= 8 {
                        return Err(FenError::BadRankLength { rank_index, length: file as usize + 1 });
                    }
                    board.put_piece(piece, Square::new(file, rank));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::BadRankLength { rank_index, length: file as usize });
            }
        }

        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidColor { found: other.to_string() }),
        };

        let mut castling = parse_castling(fields[2])?;
        for color in Color::ALL {
            for side in CastleSide::BOTH {
                let path = CastlePath::of(color, side);
                let king_home = board.piece_on(path.king_from) == Some(Piece::new(PieceKind::King, color));
                let rook_home = board.piece_on(path.rook_from) == Some(Piece::new(PieceKind::Rook, color));
                if !(king_home && rook_home) {
                    castling = castling.without(color, side);
                }
            }
        }

        let en_passant = match fields[3] {
            "-" => None,
            text => {
                let sq = Square::from_algebraic(text)
                    .filter(|sq| sq.relative_rank(side_to_move) == 5)
                    .ok_or_else(|| FenError::InvalidEnPassant { found: text.to_string() })?;
                // Only kept when a pawn can actually take, so equal positions hash equally.
                let capturers = pawn_attacks(!side_to_move, sq) & board.colored(PieceKind::Pawn, side_to_move);
                capturers.is_nonempty().then_some(sq)
            }
        };

        let halfmove_clock = parse_counter(fields.get(4).copied(), "halfmove clock", 0)?;
        let fullmove_number = parse_counter(fields.get(5).copied(), "fullmove number", 1)?;

        board.set_state(side_to_move, castling, en_passant, halfmove_clock, fullmove_number.max(1));
        board.validate()?;
        board.finish_setup();
        Ok(board)
    }
}

impl Board {
    /// Serialize the position as FEN.
    pub fn to_fen(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0u8..8).rev() {
            let mut empty = 0u8;
            for file in 0u8..8 {
                match self.piece_on(Square::new(file, rank)) {
                    Some(piece) => {
                        if empty > 0 {
                            write!(f, "{empty}")?;
                            empty = 0;
                        }
                        write!(f, "{}", piece.fen_char())?;
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                write!(f, "{empty}")?;
            }
            if rank > 0 {
                write!(f, "/")?;
            }
        }

        write!(f, " {} {}", self.side_to_move(), self.castling())?;
        match self.en_passant() {
            Some(sq) => write!(f, " {sq}")?,
            None => write!(f, " -")?,
        }
        write!(f, " {} {}", self.halfmove_clock(), self.fullmove_number())
    }
}
