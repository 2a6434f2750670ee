//! Core chess types: board representation, move generation and game rules.

mod attacks;
mod bitboard;
mod board;
mod castle_rights;
mod chess_move;
mod color;
mod error;
mod fen;
mod make_move;
mod movegen;
mod perft;
mod piece;
mod square;
mod zobrist;

pub use attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks};
pub use bitboard::Bitboard;
pub use board::{Board, PrettyBoard};
pub use castle_rights::{CastleRights, CastleSide};
pub use chess_move::{MAX_MOVES, Move, MoveClass, MoveList};
pub use color::Color;
pub use error::{BoardError, FenError, MoveParseError};
pub use fen::STARTING_FEN;
pub use make_move::Undo;
pub use perft::{divide, perft};
pub use piece::{Piece, PieceKind};
pub use square::Square;
