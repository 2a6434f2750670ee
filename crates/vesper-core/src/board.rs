//! Board representation: piece bitboards, a square mailbox and game state.

use std::fmt;

use crate::attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::castle_rights::CastleRights;
use crate::color::Color;
use crate::error::BoardError;
use crate::piece::{Piece, PieceKind};
use crate::square::Square;
use crate::zobrist;

/// A chess position together with the hash history needed for repetition checks.
///
/// `king_attackers` and `threats` are refreshed after every move so the
/// search can read them without recomputation.
#[derive(Clone)]
pub struct Board {
    pieces: [Bitboard; PieceKind::COUNT],
    colours: [Bitboard; Color::COUNT],
    squares: [Option<Piece>; 64],
    side_to_move: Color,
    castling: CastleRights,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    fullmove_number: u16,
    hash: u64,
    king_attackers: Bitboard,
    threats: Bitboard,
    pub(crate) history: Vec<u64>,
}

impl Board {
    /// An empty board with White to move. Callers must place both kings and
    /// then call [`Board::finish_setup`].
    pub(crate) fn empty() -> Board {
        Board {
            pieces: [Bitboard::EMPTY; PieceKind::COUNT],
            colours: [Bitboard::EMPTY; Color::COUNT],
            squares: [None; 64],
            side_to_move: Color::White,
            castling: CastleRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            king_attackers: Bitboard::EMPTY,
            threats: Bitboard::EMPTY,
            history: Vec::with_capacity(512),
        }
    }

    /// Return the standard starting position.
    pub fn starting_position() -> Board {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut board = Board::empty();
        for (file, &kind) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            board.put_piece(Piece::new(kind, Color::White), Square::new(file, 0));
            board.put_piece(Piece::new(PieceKind::Pawn, Color::White), Square::new(file, 1));
            board.put_piece(Piece::new(PieceKind::Pawn, Color::Black), Square::new(file, 6));
            board.put_piece(Piece::new(kind, Color::Black), Square::new(file, 7));
        }
        board.castling = CastleRights::ALL;
        board.finish_setup();
        board
    }

    /// Recompute derived state after the position was assembled piece by piece.
    pub(crate) fn finish_setup(&mut self) {
        self.hash = zobrist::hash_from_scratch(self);
        self.refresh_attacks();
    }

    pub(crate) fn set_state(
        &mut self,
        side_to_move: Color,
        castling: CastleRights,
        en_passant: Option<Square>,
        halfmove_clock: u16,
        fullmove_number: u16,
    ) {
        self.side_to_move = side_to_move;
        self.castling = castling;
        self.en_passant = en_passant;
        self.halfmove_clock = halfmove_clock;
        self.fullmove_number = fullmove_number;
    }

    /// Return the piece on the given square, if any.
    #[inline]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    /// Return the bitboard for the given piece kind (both colors).
    #[inline]
    pub fn pieces(&self, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()]
    }

    /// Return the bitboard for the given side.
    #[inline]
    pub fn side(&self, color: Color) -> Bitboard {
        self.colours[color.index()]
    }

    /// Pieces of one kind belonging to one side.
    #[inline]
    pub fn colored(&self, kind: PieceKind, color: Color) -> Bitboard {
        self.pieces[kind.index()] & self.colours[color.index()]
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.colours[0] | self.colours[1]
    }

    /// Return the square of the king for the given side.
    ///
    /// Every board built through FEN parsing or the starting position holds
    /// exactly one king per side.
    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.colored(PieceKind::King, color).lsb().unwrap_or(Square::A1)
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling(&self) -> CastleRights {
        self.castling
    }

    /// The en passant target, set only when a pawn can actually capture there.
    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// Zobrist hash of the position.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Enemy pieces giving check to the side to move.
    #[inline]
    pub fn king_attackers(&self) -> Bitboard {
        self.king_attackers
    }

    #[inline]
    pub fn in_check(&self) -> bool {
        self.king_attackers.is_nonempty()
    }

    /// Squares attacked by the side that is not to move.
    #[inline]
    pub fn threats(&self) -> Bitboard {
        self.threats
    }

    /// True if `color` has a knight, bishop, rook or queen.
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        let kings_and_pawns = self.pieces(PieceKind::King) | self.pieces(PieceKind::Pawn);
        (self.side(color) & !kings_and_pawns).is_nonempty()
    }

    /// Every piece of either colour attacking `sq`, given an occupancy.
    pub fn attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let diagonal = self.pieces(PieceKind::Bishop) | self.pieces(PieceKind::Queen);
        let straight = self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen);
        (pawn_attacks(Color::White, sq) & self.colored(PieceKind::Pawn, Color::Black))
            | (pawn_attacks(Color::Black, sq) & self.colored(PieceKind::Pawn, Color::White))
            | (knight_attacks(sq) & self.pieces(PieceKind::Knight))
            | (bishop_attacks(sq, occupied) & diagonal)
            | (rook_attacks(sq, occupied) & straight)
            | (king_attacks(sq) & self.pieces(PieceKind::King))
    }

    /// Return `true` if `sq` is attacked by any piece of `by`.
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        (self.attackers_to(sq, self.occupied()) & self.side(by)).is_nonempty()
    }

    /// Every square attacked by `color`.
    pub fn attacked_by(&self, color: Color) -> Bitboard {
        let occupied = self.occupied();
        let mut attacked = Bitboard::EMPTY;
        for sq in self.colored(PieceKind::Pawn, color) {
            attacked |= pawn_attacks(color, sq);
        }
        for sq in self.colored(PieceKind::Knight, color) {
            attacked |= knight_attacks(sq);
        }
        let diagonal = self.pieces(PieceKind::Bishop) | self.pieces(PieceKind::Queen);
        for sq in diagonal & self.side(color) {
            attacked |= bishop_attacks(sq, occupied);
        }
        let straight = self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen);
        for sq in straight & self.side(color) {
            attacked |= rook_attacks(sq, occupied);
        }
        attacked | king_attacks(self.king_square(color))
    }

    pub(crate) fn refresh_attacks(&mut self) {
        let us = self.side_to_move;
        let them = !us;
        self.king_attackers = self.attackers_to(self.king_square(us), self.occupied()) & self.side(them);
        self.threats = self.attacked_by(them);
    }

    pub(crate) fn put_piece(&mut self, piece: Piece, sq: Square) {
        let mask = sq.bitboard();
        self.pieces[piece.kind().index()] |= mask;
        self.colours[piece.color().index()] |= mask;
        self.squares[sq.index()] = Some(piece);
        self.hash ^= zobrist::piece_square(piece, sq);
    }

    pub(crate) fn remove_piece(&mut self, piece: Piece, sq: Square) {
        let mask = !sq.bitboard();
        self.pieces[piece.kind().index()] &= mask;
        self.colours[piece.color().index()] &= mask;
        self.squares[sq.index()] = None;
        self.hash ^= zobrist::piece_square(piece, sq);
    }

    pub(crate) fn move_piece(&mut self, piece: Piece, from: Square, to: Square) {
        self.remove_piece(piece, from);
        self.put_piece(piece, to);
    }

    pub(crate) fn set_side_to_move(&mut self, color: Color) {
        if color != self.side_to_move {
            self.hash ^= zobrist::side();
        }
        self.side_to_move = color;
    }

    pub(crate) fn set_en_passant(&mut self, sq: Option<Square>) {
        if let Some(old) = self.en_passant {
            self.hash ^= zobrist::en_passant(old);
        }
        if let Some(new) = sq {
            self.hash ^= zobrist::en_passant(new);
        }
        self.en_passant = sq;
    }

    pub(crate) fn set_castling(&mut self, rights: CastleRights) {
        self.hash ^= zobrist::castling(self.castling) ^ zobrist::castling(rights);
        self.castling = rights;
    }

    pub(crate) fn set_counters(&mut self, halfmove_clock: u16, fullmove_number: u16) {
        self.halfmove_clock = halfmove_clock;
        self.fullmove_number = fullmove_number;
    }

    pub(crate) fn restore(&mut self, hash: u64, king_attackers: Bitboard, threats: Bitboard) {
        self.hash = hash;
        self.king_attackers = king_attackers;
        self.threats = threats;
    }

    /// Draw by the fifty-move rule, repetition or insufficient material.
    ///
    /// `height` is the distance from the search root. A single repetition of
    /// a position reached inside the search counts as a draw; positions only
    /// seen before the root need to occur twice.
    pub fn is_drawn(&self, height: usize) -> bool {
        self.is_fifty_move_draw() || self.is_repetition(height) || self.is_insufficient_material()
    }

    /// The clock alone decides; a checkmate on the hundredth ply still counts as a draw.
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock > 99
    }

    pub fn is_repetition(&self, height: usize) -> bool {
        let len = self.history.len();
        let halfmove = self.halfmove_clock as usize;
        let mut reps = 0;
        let mut i = len as isize - 2;
        while i >= 0 {
            let idx = i as usize;
            if idx + halfmove < len {
                break;
            }
            if self.history[idx] == self.hash {
                if idx + height > len {
                    return true;
                }
                reps += 1;
                if reps == 2 {
                    return true;
                }
            }
            i -= 2;
        }
        false
    }

    /// Neither side can possibly mate: no pawns, rooks or queens, at most
    /// one side with more than a king, and that side holding at most two
    /// knights or a lone minor.
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = self.pieces(PieceKind::Pawn) | self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen);
        if heavy.is_nonempty() {
            return false;
        }
        let knights = self.pieces(PieceKind::Knight);
        let bishops = self.pieces(PieceKind::Bishop);
        let one_side_bare =
            !self.side(Color::White).has_several() || !self.side(Color::Black).has_several();
        let few_minors = !(knights | bishops).has_several() || (bishops.is_empty() && knights.count() <= 2);
        one_side_bare && few_minors
    }

    /// Hashes of the positions before each move played so far.
    pub fn history(&self) -> &[u64] {
        &self.history
    }

    /// Validate the structural integrity of the board.
    pub fn validate(&self) -> Result<(), BoardError> {
        for color in Color::ALL {
            let count = self.colored(PieceKind::King, color).count();
            if count != 1 {
                return Err(BoardError::InvalidKingCount { color, count });
            }
        }
        let back_ranks = Bitboard::RANK_1 | Bitboard::RANK_8;
        if (self.pieces(PieceKind::Pawn) & back_ranks).is_nonempty() {
            return Err(BoardError::PawnsOnBackRank);
        }
        let them = !self.side_to_move;
        if self.is_square_attacked(self.king_square(them), self.side_to_move) {
            return Err(BoardError::OpponentInCheck);
        }
        Ok(())
    }

    /// Return a pretty-printable wrapper for this board.
    pub fn pretty(&self) -> PrettyBoard<'_> {
        PrettyBoard(self)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board(\"{}\")", self.to_fen())
    }
}

/// Wrapper for pretty-printing a board as an 8x8 grid.
pub struct PrettyBoard<'a>(&'a Board);

impl fmt::Display for PrettyBoard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let board = self.0;
        for rank in (0u8..8).rev() {
            write!(f, "{}  ", rank + 1)?;
            for file in 0u8..8 {
                let c = board.piece_on(Square::new(file, rank)).map_or('.', Piece::fen_char);
                if file < 7 {
                    write!(f, "{c} ")?;
                } else {
                    write!(f, "{c}")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::Board;
    use crate::color::Color;
    use crate::piece::{Piece, PieceKind};
    use crate::square::Square;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn starting_position_validates() {
        let board = Board::starting_position();
        board.validate().unwrap();
        assert_eq!(board.occupied().count(), 32);
        assert!(!board.in_check());
    }

    #[test]
    fn starting_position_piece_on() {
        let board = Board::starting_position();
        assert_eq!(board.piece_on(Square::E1), Some(Piece::new(PieceKind::King, Color::White)));
        assert_eq!(board.piece_on(Square::D8), Some(Piece::new(PieceKind::Queen, Color::Black)));
        assert_eq!(board.piece_on(sq("e4")), None);
        assert_eq!(board.king_square(Color::Black), Square::E8);
    }

    #[test]
    fn starting_threats_cover_third_rank() {
        let board = Board::starting_position();
        assert!(board.threats().contains(sq("e6")));
        assert!(!board.threats().contains(sq("e5")));
    }

    #[test]
    fn attackers_include_both_colours() {
        let board: Board = "4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1".parse().unwrap();
        let attackers = board.attackers_to(sq("d5"), board.occupied());
        assert_eq!(attackers, sq("e4").bitboard());
        let attackers = board.attackers_to(sq("e4"), board.occupied());
        assert_eq!(attackers, sq("d5").bitboard());
    }

    #[test]
    fn insufficient_material_cases() {
        let draw = |fen: &str| fen.parse::<Board>().unwrap().is_insufficient_material();
        assert!(draw("4k3/8/8/8/8/8/8/4K3 w - - 0 1"));
        assert!(draw("4k3/8/8/8/8/8/8/4KB2 w - - 0 1"));
        assert!(draw("4k3/8/8/8/8/8/8/3NKN2 w - - 0 1"));
        assert!(!draw("4kb2/8/8/8/8/8/8/4KB2 w - - 0 1"));
        assert!(!draw("4k3/8/8/8/8/8/8/3BKB2 w - - 0 1"));
        assert!(!draw("4k3/8/8/8/8/8/8/4KR2 w - - 0 1"));
        assert!(!draw("4k3/4p3/8/8/8/8/8/4K3 w - - 0 1"));
    }

    #[test]
    fn fifty_move_rule_uses_clock() {
        let board: Board = "4k3/8/8/8/8/8/8/R3K3 w - - 100 80".parse().unwrap();
        assert!(board.is_fifty_move_draw());
        let board: Board = "4k3/8/8/8/8/8/8/R3K3 w - - 99 80".parse().unwrap();
        assert!(!board.is_fifty_move_draw());
    }

    #[test]
    fn pretty_print() {
        let board = Board::starting_position();
        let output = format!("{}", board.pretty());
        assert!(output.contains("r n b q k b n r"));
        assert!(output.contains("R N B Q K B N R"));
        assert!(output.contains("a b c d e f g h"));
    }
}
