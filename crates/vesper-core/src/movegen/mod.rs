//! Pseudo-legal move generation, split into noisy and quiet moves.
//!
//! Legality is settled by [`Board::apply`], which rejects moves that leave
//! the mover's king in check.

mod pawns;
mod pieces;

use crate::attacks::pawn_attacks;
use crate::board::Board;
use crate::castle_rights::{CastlePath, CastleSide};
use crate::chess_move::{Move, MoveClass, MoveList};
use crate::error::MoveParseError;
use crate::piece::PieceKind;
use crate::square::Square;

use self::pawns::{gen_pawn_noisy, gen_pawn_quiet};
use self::pieces::{can_castle, gen_castles, gen_pieces, piece_attacks};

impl Board {
    /// Captures, en passant captures and promotions.
    pub fn gen_noisy(&self, list: &mut MoveList) {
        gen_pawn_noisy(self, list);
        gen_pieces(self, self.side(!self.side_to_move()), list);
    }

    /// Non-capturing, non-promoting moves including castling.
    pub fn gen_quiet(&self, list: &mut MoveList) {
        gen_pawn_quiet(self, list);
        gen_pieces(self, !self.occupied(), list);
        gen_castles(self, list);
    }

    /// Every pseudo-legal move.
    pub fn gen_all(&self, list: &mut MoveList) {
        self.gen_noisy(list);
        self.gen_quiet(list);
    }

    /// Every legal move, found by trying each pseudo-legal one.
    pub fn legal_moves(&self) -> MoveList {
        let mut pseudo = MoveList::new();
        self.gen_all(&mut pseudo);
        let mut scratch = self.clone();
        let mut legal = MoveList::new();
        for mv in pseudo.iter() {
            if let Some(undo) = scratch.apply(mv) {
                scratch.revert(mv, &undo);
                legal.push(mv);
            }
        }
        legal
    }

    /// Captures (castling excluded), en passant and promotions.
    #[inline]
    pub fn is_tactical(&self, mv: Move) -> bool {
        match mv.class() {
            MoveClass::Normal => self.piece_on(mv.to()).is_some(),
            MoveClass::Castle => false,
            MoveClass::EnPassant | MoveClass::Promotion => true,
        }
    }

    /// True if `mv` could be generated in this position. Used to vet moves
    /// that come from the transposition table, killers and counter moves.
    pub fn is_pseudo_legal(&self, mv: Move) -> bool {
        if mv.is_none_or_null() {
            return false;
        }
        let us = self.side_to_move();
        let from = mv.from();
        let to = mv.to();
        let Some(piece) = self.piece_on(from) else {
            return false;
        };
        if piece.color() != us || self.side(us).contains(to) {
            return false;
        }
        let last_rank = to.relative_rank(us) == 7;

        match mv.class() {
            MoveClass::Castle => {
                piece.kind() == PieceKind::King
                    && CastleSide::BOTH.into_iter().any(|side| {
                        let path = CastlePath::of(us, side);
                        path.king_from == from && path.king_to == to && can_castle(self, side)
                    })
            }
            MoveClass::EnPassant => {
                piece.kind() == PieceKind::Pawn
                    && self.en_passant() == Some(to)
                    && pawn_attacks(us, from).contains(to)
            }
            MoveClass::Promotion => piece.kind() == PieceKind::Pawn && last_rank && self.pawn_reaches(from, to),
            MoveClass::Normal if piece.kind() == PieceKind::Pawn => !last_rank && self.pawn_reaches(from, to),
            MoveClass::Normal => piece_attacks(piece.kind(), from, self.occupied()).contains(to),
        }
    }

    fn pawn_reaches(&self, from: Square, to: Square) -> bool {
        let us = self.side_to_move();
        let occupied = self.occupied();
        if pawn_attacks(us, from).contains(to) {
            return self.side(!us).contains(to);
        }
        let forward = us.forward();
        if to == from.offset(forward) {
            return !occupied.contains(to);
        }
        from.relative_rank(us) == 1
            && to == from.offset(2 * forward)
            && !occupied.contains(from.offset(forward))
            && !occupied.contains(to)
    }

    /// Find the legal move written in UCI notation (`e2e4`, `e1g1`, `a7a8q`).
    pub fn parse_uci_move(&self, text: &str) -> Result<Move, MoveParseError> {
        self.legal_moves()
            .iter()
            .find(|mv| mv.to_string() == text)
            .ok_or_else(|| MoveParseError::Illegal { text: text.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use crate::board::Board;
    use crate::chess_move::{Move, MoveList};
    use crate::piece::PieceKind;
    use crate::square::Square;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn starting_position_20_moves() {
        let board = Board::starting_position();
        assert_eq!(board.legal_moves().len(), 20);
        let mut noisy = MoveList::new();
        board.gen_noisy(&mut noisy);
        assert!(noisy.is_empty());
    }

    #[test]
    fn pinned_knight_has_no_legal_moves() {
        let board: Board = "4r2k/8/8/8/8/8/4N3/4K3 w - - 0 1".parse().unwrap();
        assert!(board.legal_moves().iter().all(|mv| mv.from() != sq("e2")));
    }

    #[test]
    fn castling_not_through_check() {
        let board: Board = "4k3/8/b7/8/8/8/8/R3K2R w KQ - 0 1".parse().unwrap();
        let castles: Vec<Move> = board.legal_moves().iter().filter(|m| m.is_castle()).collect();
        assert_eq!(castles, vec![Move::castle(Square::E1, Square::C1)]);
    }

    #[test]
    fn en_passant_discovered_check_is_illegal() {
        let board: Board = "4k3/8/8/KPp4r/8/8/8/8 w - c6 0 1".parse().unwrap();
        assert!(board.legal_moves().iter().all(|mv| !mv.is_en_passant()));
    }

    #[test]
    fn promotions_are_noisy() {
        let board: Board = "4k3/P7/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let mut noisy = MoveList::new();
        board.gen_noisy(&mut noisy);
        assert_eq!(noisy.len(), 4);
        assert_eq!(noisy.as_slice()[0].promotion_piece(), Some(PieceKind::Queen));
        let mut quiet = MoveList::new();
        board.gen_quiet(&mut quiet);
        assert!(quiet.iter().all(|mv| !mv.is_promotion()));
    }

    #[test]
    fn pseudo_legality_of_stored_moves() {
        let board = Board::starting_position();
        assert!(board.is_pseudo_legal(Move::new(sq("e2"), sq("e4"))));
        assert!(board.is_pseudo_legal(Move::new(sq("g1"), sq("f3"))));
        assert!(!board.is_pseudo_legal(Move::new(sq("e2"), sq("e5"))));
        assert!(!board.is_pseudo_legal(Move::new(sq("f1"), sq("c4"))));
        assert!(!board.is_pseudo_legal(Move::new(sq("e7"), sq("e5"))));
        assert!(!board.is_pseudo_legal(Move::castle(Square::E1, Square::G1)));
        assert!(!board.is_pseudo_legal(Move::NONE));
        assert!(!board.is_pseudo_legal(Move::NULL));
    }

    #[test]
    fn tactical_classification() {
        let board: Board = "4k3/8/8/3p4/4P3/8/8/R3K3 w Q - 0 1".parse().unwrap();
        assert!(board.is_tactical(Move::new(sq("e4"), sq("d5"))));
        assert!(!board.is_tactical(Move::new(sq("e4"), sq("e5"))));
        assert!(!board.is_tactical(Move::castle(Square::E1, Square::C1)));
    }

    #[test]
    fn parse_uci_move_finds_castle() {
        let board: Board = "4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1".parse().unwrap();
        assert_eq!(board.parse_uci_move("e1g1").unwrap(), Move::castle(Square::E1, Square::G1));
        assert!(board.parse_uci_move("e1e3").is_err());
    }
}
