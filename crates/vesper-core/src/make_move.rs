//! Move execution via make/unmake with an undo record.

use crate::attacks::pawn_attacks;
use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::castle_rights::{CastlePath, CastleRights};
use crate::chess_move::{Move, MoveClass};
use crate::color::Color;
use crate::piece::{Piece, PieceKind};
use crate::square::Square;

/// State that cannot be recovered from the move alone.
#[derive(Debug, Clone, Copy)]
pub struct Undo {
    hash: u64,
    king_attackers: Bitboard,
    threats: Bitboard,
    castling: CastleRights,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    captured: Option<Piece>,
}

impl Undo {
    /// The piece removed by the move, if it was a capture.
    pub fn captured(&self) -> Option<Piece> {
        self.captured
    }
}

impl Board {
    /// Play a pseudo-legal move.
    ///
    /// Returns `None` and leaves the board untouched if the move would leave
    /// the mover's king in check.
    pub fn apply(&mut self, mv: Move) -> Option<Undo> {
        let undo = self.apply_unchecked(mv);
        let us = !self.side_to_move();
        if self.is_square_attacked(self.king_square(us), self.side_to_move()) {
            self.revert(mv, &undo);
            return None;
        }
        Some(undo)
    }

    /// Play a pseudo-legal move without checking legality.
    pub fn apply_unchecked(&mut self, mv: Move) -> Undo {
        let us = self.side_to_move();
        let them = !us;
        let from = mv.from();
        let to = mv.to();
        let mut undo = Undo {
            hash: self.hash(),
            king_attackers: self.king_attackers(),
            threats: self.threats(),
            castling: self.castling(),
            en_passant: self.en_passant(),
            halfmove_clock: self.halfmove_clock(),
            captured: None,
        };
        self.history.push(self.hash());
        self.set_en_passant(None);

        let Some(mover) = self.piece_on(from) else {
            debug_assert!(false, "no piece on {from} for {mv}");
            return undo;
        };
        let mut reset_clock = mover.kind() == PieceKind::Pawn;

        match mv.class() {
            MoveClass::Normal => {
                if let Some(victim) = self.piece_on(to) {
                    self.remove_piece(victim, to);
                    undo.captured = Some(victim);
                    reset_clock = true;
                }
                self.move_piece(mover, from, to);
                if mover.kind() == PieceKind::Pawn && from.index().abs_diff(to.index()) == 16 {
                    let target = from.offset(us.forward());
                    let capturers = pawn_attacks(us, target) & self.colored(PieceKind::Pawn, them);
                    if capturers.is_nonempty() {
                        self.set_en_passant(Some(target));
                    }
                }
            }
            MoveClass::Castle => {
                if let Some(path) = CastlePath::from_king_move(us, from, to) {
                    self.move_piece(mover, from, to);
                    self.move_piece(Piece::new(PieceKind::Rook, us), path.rook_from, path.rook_to);
                }
            }
            MoveClass::EnPassant => {
                let victim_sq = to.offset(-us.forward());
                let victim = Piece::new(PieceKind::Pawn, them);
                self.remove_piece(victim, victim_sq);
                self.move_piece(mover, from, to);
                undo.captured = Some(victim);
            }
            MoveClass::Promotion => {
                if let Some(victim) = self.piece_on(to) {
                    self.remove_piece(victim, to);
                    undo.captured = Some(victim);
                }
                let promoted = mv.promotion_piece().unwrap_or(PieceKind::Queen);
                self.remove_piece(mover, from);
                self.put_piece(Piece::new(promoted, us), to);
            }
        }

        let rights = self.castling().after_move(from, to);
        self.set_castling(rights);
        let halfmove = if reset_clock { 0 } else { self.halfmove_clock() + 1 };
        let fullmove = self.fullmove_number() + u16::from(us == Color::Black);
        self.set_counters(halfmove, fullmove);
        self.set_side_to_move(them);
        self.refresh_attacks();
        undo
    }

    /// Take back `mv`, which must be the last move applied with `undo`.
    pub fn revert(&mut self, mv: Move, undo: &Undo) {
        let them = self.side_to_move();
        let us = !them;
        let from = mv.from();
        let to = mv.to();

        match mv.class() {
            MoveClass::Normal => {
                if let Some(mover) = self.piece_on(to) {
                    self.move_piece(mover, to, from);
                }
                if let Some(victim) = undo.captured {
                    self.put_piece(victim, to);
                }
            }
            MoveClass::Castle => {
                if let Some(path) = CastlePath::from_king_move(us, from, to) {
                    self.move_piece(Piece::new(PieceKind::King, us), to, from);
                    self.move_piece(Piece::new(PieceKind::Rook, us), path.rook_to, path.rook_from);
                }
            }
            MoveClass::EnPassant => {
                let pawn = Piece::new(PieceKind::Pawn, us);
                self.move_piece(pawn, to, from);
                self.put_piece(Piece::new(PieceKind::Pawn, them), to.offset(-us.forward()));
            }
            MoveClass::Promotion => {
                if let Some(promoted) = self.piece_on(to) {
                    self.remove_piece(promoted, to);
                }
                self.put_piece(Piece::new(PieceKind::Pawn, us), from);
                if let Some(victim) = undo.captured {
                    self.put_piece(victim, to);
                }
            }
        }

        let fullmove = self.fullmove_number() - u16::from(us == Color::Black);
        self.set_state(us, undo.castling, undo.en_passant, undo.halfmove_clock, fullmove);
        self.restore(undo.hash, undo.king_attackers, undo.threats);
        self.history.pop();
    }

    /// Pass the turn. Only valid when the side to move is not in check.
    pub fn apply_null(&mut self) -> Undo {
        let undo = Undo {
            hash: self.hash(),
            king_attackers: self.king_attackers(),
            threats: self.threats(),
            castling: self.castling(),
            en_passant: self.en_passant(),
            halfmove_clock: self.halfmove_clock(),
            captured: None,
        };
        self.history.push(self.hash());
        self.set_en_passant(None);
        let us = self.side_to_move();
        let fullmove = self.fullmove_number() + u16::from(us == Color::Black);
        self.set_counters(self.halfmove_clock() + 1, fullmove);
        self.set_side_to_move(!us);
        self.refresh_attacks();
        undo
    }

    pub fn revert_null(&mut self, undo: &Undo) {
        let us = !self.side_to_move();
        let fullmove = self.fullmove_number() - u16::from(us == Color::Black);
        self.set_state(us, undo.castling, undo.en_passant, undo.halfmove_clock, fullmove);
        self.restore(undo.hash, undo.king_attackers, undo.threats);
        self.history.pop();
    }
}

#[cfg(test)]
mod tests {
    use crate::board::Board;
    use crate::chess_move::Move;
    use crate::piece::PieceKind;
    use crate::square::Square;
    use crate::zobrist;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn board(fen: &str) -> Board {
        fen.parse().unwrap()
    }

    #[test]
    fn apply_and_revert_restores_position() {
        let mut b = board("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let before = b.to_fen();
        let hash = b.hash();
        let mv = Move::castle(Square::E1, Square::G1);
        let undo = b.apply(mv).unwrap();
        assert_eq!(b.hash(), zobrist::hash_from_scratch(&b));
        assert_eq!(b.to_fen(), "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R4RK1 b kq - 1 1");
        b.revert(mv, &undo);
        assert_eq!(b.to_fen(), before);
        assert_eq!(b.hash(), hash);
        assert!(b.history().is_empty());
    }

    #[test]
    fn en_passant_removes_captured_pawn() {
        let mut b = board("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
        let mv = Move::en_passant(sq("e5"), sq("d6"));
        let undo = b.apply(mv).unwrap();
        assert_eq!(b.piece_on(sq("d5")), None);
        assert_eq!(undo.captured().map(|p| p.kind()), Some(PieceKind::Pawn));
        assert_eq!(b.hash(), zobrist::hash_from_scratch(&b));
        b.revert(mv, &undo);
        assert_eq!(b.to_fen(), "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
    }

    #[test]
    fn double_push_sets_en_passant_only_when_capturable() {
        let mut b = Board::starting_position();
        b.apply(Move::new(sq("e2"), sq("e4"))).unwrap();
        assert_eq!(b.en_passant(), None);

        let mut b = board("4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1");
        b.apply(Move::new(sq("e2"), sq("e4"))).unwrap();
        assert_eq!(b.en_passant(), Some(sq("e3")));
        assert_eq!(b.hash(), zobrist::hash_from_scratch(&b));
    }

    #[test]
    fn illegal_move_is_rejected_and_reverted() {
        let mut b = board("4k3/8/8/8/8/8/8/r3K3 w - - 0 1");
        let before = b.to_fen();
        assert!(b.apply(Move::new(Square::E1, Square::F1)).is_none());
        assert_eq!(b.to_fen(), before);
        assert!(b.apply(Move::new(Square::E1, sq("e2"))).is_some());
    }

    #[test]
    fn promotion_with_capture_round_trip() {
        let mut b = board("1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let mv = Move::promotion(sq("a7"), Square::B8, PieceKind::Queen);
        let undo = b.apply(mv).unwrap();
        assert_eq!(b.to_fen(), "1Q2k3/8/8/8/8/8/8/4K3 b - - 0 1");
        assert!(b.in_check());
        b.revert(mv, &undo);
        assert_eq!(b.to_fen(), "1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
    }

    #[test]
    fn null_move_flips_side_and_hash() {
        let mut b = board("4k3/8/8/8/3p4/8/4P3/4K3 w - - 3 1");
        let hash = b.hash();
        let undo = b.apply_null();
        assert_ne!(b.hash(), hash);
        assert_eq!(b.hash(), zobrist::hash_from_scratch(&b));
        assert_eq!(b.halfmove_clock(), 4);
        b.revert_null(&undo);
        assert_eq!(b.hash(), hash);
        assert_eq!(b.to_fen(), "4k3/8/8/8/3p4/8/4P3/4K3 w - - 3 1");
    }

    #[test]
    fn repetition_inside_search_is_a_draw() {
        let mut b = Board::starting_position();
        let moves = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8"), ("g1", "f3")];
        for (from, to) in moves {
            b.apply(Move::new(sq(from), sq(to))).unwrap();
        }
        assert!(b.is_drawn(5));
        assert!(!b.is_drawn(0));

        let moves = [("g8", "f6"), ("f3", "g1"), ("f6", "g8"), ("g1", "f3")];
        for (from, to) in moves {
            b.apply(Move::new(sq(from), sq(to))).unwrap();
        }
        assert!(b.is_drawn(0));
    }
}
