//! The rules-engine collaborator.
//!
//! The session never decides chess legality itself. It talks to a
//! [`RulesEngine`], and [`ChessRules`] is the implementation backed by the
//! `chess` crate.

use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square};
use std::str::FromStr;

use super::utils::has_insufficient_material;
use crate::error::RulesError;
use crate::models::AppliedMove;

pub trait RulesEngine {
    /// Reset to the standard starting position.
    fn new_game(&mut self);

    /// Play `from`-`to`. A promotion piece given for a move that is not a
    /// promotion is ignored; a promotion without a piece is illegal.
    fn apply_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<AppliedMove, RulesError>;

    /// Take back the last ply.
    fn undo(&mut self) -> Option<AppliedMove>;

    fn piece_at(&self, square: Square) -> Option<Piece>;

    fn serialize_position(&self) -> String;

    fn turn(&self) -> Color;

    fn is_check(&self) -> bool;

    fn is_checkmate(&self) -> bool;

    fn is_draw(&self) -> bool;
}

/// Board state before a ply, kept so the ply can be taken back.
#[derive(Debug, Clone)]
struct Ply {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    mv: AppliedMove,
}

#[derive(Debug, Clone)]
pub struct ChessRules {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    history: Vec<Ply>,
}

impl Default for ChessRules {
    fn default() -> Self {
        Self::new()
    }
}

impl ChessRules {
    pub fn new() -> Self {
        Self {
            board: Board::default(),
            halfmove_clock: 0,
            fullmove_number: 1,
            history: Vec::new(),
        }
    }

    /// Start from an arbitrary FEN position.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let board =
            Board::from_str(fen).map_err(|e| RulesError::InvalidPosition(format!("{:?}", e)))?;
        let mut counters = fen.split_whitespace().skip(4);
        let halfmove_clock = counters.next().and_then(|n| n.parse().ok()).unwrap_or(0);
        let fullmove_number = counters.next().and_then(|n| n.parse().ok()).unwrap_or(1);

        Ok(Self {
            board,
            halfmove_clock,
            fullmove_number,
            history: Vec::new(),
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    fn find_legal(&self, from: Square, to: Square, promotion: Option<Piece>) -> Option<ChessMove> {
        let candidates: Vec<ChessMove> = MoveGen::new_legal(&self.board)
            .filter(|m| m.get_source() == from && m.get_dest() == to)
            .collect();

        if candidates.iter().any(|m| m.get_promotion().is_some()) {
            let piece = promotion?;
            candidates
                .into_iter()
                .find(|m| m.get_promotion() == Some(piece))
        } else {
            candidates.into_iter().next()
        }
    }

    fn repetitions(&self) -> usize {
        let hash = self.board.get_hash();
        self.history
            .iter()
            .filter(|ply| ply.board.get_hash() == hash)
            .count()
    }
}

impl RulesEngine for ChessRules {
    fn new_game(&mut self) {
        *self = Self::new();
    }

    fn apply_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<AppliedMove, RulesError> {
        let illegal = || RulesError::IllegalMove {
            from: from.to_string(),
            to: to.to_string(),
        };

        let chess_move = self.find_legal(from, to, promotion).ok_or_else(illegal)?;
        let piece = self.board.piece_on(from).ok_or_else(illegal)?;
        let color = self.board.side_to_move();

        // En passant lands on an empty square
        let captured = self
            .board
            .piece_on(to)
            .or_else(|| (piece == Piece::Pawn && from.get_file() != to.get_file()).then_some(Piece::Pawn));

        let mv = AppliedMove {
            from,
            to,
            piece,
            color: color.into(),
            captured,
            promotion: chess_move.get_promotion(),
        };

        self.history.push(Ply {
            board: self.board,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            mv,
        });

        self.board = self.board.make_move_new(chess_move);
        if piece == Piece::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if color == Color::Black {
            self.fullmove_number += 1;
        }

        Ok(mv)
    }

    fn undo(&mut self) -> Option<AppliedMove> {
        let ply = self.history.pop()?;
        self.board = ply.board;
        self.halfmove_clock = ply.halfmove_clock;
        self.fullmove_number = ply.fullmove_number;
        Some(ply.mv)
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board.piece_on(square)
    }

    fn serialize_position(&self) -> String {
        // The board prints placement, side, castling and en passant; the move
        // counters are ours.
        let fen = self.board.to_string();
        let fields: Vec<&str> = fen.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            fields.join(" "),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    fn turn(&self) -> Color {
        self.board.side_to_move()
    }

    fn is_check(&self) -> bool {
        self.board.checkers().popcnt() > 0
    }

    fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    fn is_draw(&self) -> bool {
        self.board.status() == BoardStatus::Stalemate
            || has_insufficient_material(&self.board)
            || self.halfmove_clock >= 100
            || self.repetitions() >= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(rules: &mut ChessRules, moves: &[(Square, Square)]) {
        for (from, to) in moves {
            rules.apply_move(*from, *to, None).unwrap();
        }
    }

    #[test]
    fn starts_from_the_standard_position() {
        let rules = ChessRules::new();
        assert!(rules
            .serialize_position()
            .starts_with("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w"));
        assert!(rules.serialize_position().ends_with(" 0 1"));
        assert_eq!(rules.turn(), Color::White);
    }

    #[test]
    fn applies_and_undoes_a_move() {
        let mut rules = ChessRules::new();
        let start = rules.serialize_position();

        let mv = rules.apply_move(Square::E2, Square::E4, None).unwrap();
        assert_eq!(mv.piece, Piece::Pawn);
        assert_eq!(rules.turn(), Color::Black);
        assert_ne!(rules.serialize_position(), start);

        assert_eq!(rules.undo(), Some(mv));
        assert_eq!(rules.serialize_position(), start);
        assert_eq!(rules.undo(), None);
    }

    #[test]
    fn rejects_illegal_moves_without_changing_the_board() {
        let mut rules = ChessRules::new();
        let start = rules.serialize_position();
        let err = rules.apply_move(Square::E2, Square::E5, None).unwrap_err();
        assert_eq!(
            err,
            RulesError::IllegalMove {
                from: "e2".to_string(),
                to: "e5".to_string()
            }
        );
        assert_eq!(rules.serialize_position(), start);
    }

    #[test]
    fn promotion_piece_is_ignored_for_ordinary_moves() {
        let mut rules = ChessRules::new();
        let mv = rules
            .apply_move(Square::G1, Square::F3, Some(Piece::Queen))
            .unwrap();
        assert_eq!(mv.promotion, None);
    }

    #[test]
    fn promotion_requires_a_piece() {
        let mut rules = ChessRules::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(rules.apply_move(Square::A7, Square::A8, None).is_err());

        let mv = rules
            .apply_move(Square::A7, Square::A8, Some(Piece::Knight))
            .unwrap();
        assert_eq!(mv.promotion, Some(Piece::Knight));
        assert_eq!(rules.piece_at(Square::A8), Some(Piece::Knight));
    }

    #[test]
    fn detects_fools_mate() {
        let mut rules = ChessRules::new();
        play(
            &mut rules,
            &[
                (Square::F2, Square::F3),
                (Square::E7, Square::E5),
                (Square::G2, Square::G4),
                (Square::D8, Square::H4),
            ],
        );
        assert!(rules.is_check());
        assert!(rules.is_checkmate());
        assert!(!rules.is_draw());
    }

    #[test]
    fn threefold_repetition_is_a_draw() {
        let mut rules = ChessRules::new();
        let shuffle = [
            (Square::G1, Square::F3),
            (Square::G8, Square::F6),
            (Square::F3, Square::G1),
            (Square::F6, Square::G8),
        ];
        play(&mut rules, &shuffle);
        assert!(!rules.is_draw());
        play(&mut rules, &shuffle);
        assert!(rules.is_draw());
    }

    #[test]
    fn counts_full_moves_and_resets_the_halfmove_clock() {
        let mut rules = ChessRules::new();
        play(
            &mut rules,
            &[(Square::G1, Square::F3), (Square::G8, Square::F6)],
        );
        assert!(rules.serialize_position().ends_with(" 2 2"));

        play(&mut rules, &[(Square::E2, Square::E4)]);
        assert!(rules.serialize_position().ends_with(" 0 2"));
    }

    #[test]
    fn records_en_passant_captures() {
        let mut rules = ChessRules::new();
        play(
            &mut rules,
            &[
                (Square::E2, Square::E4),
                (Square::A7, Square::A6),
                (Square::E4, Square::E5),
                (Square::D7, Square::D5),
            ],
        );
        let mv = rules.apply_move(Square::E5, Square::D6, None).unwrap();
        assert_eq!(mv.captured, Some(Piece::Pawn));
        assert_eq!(rules.piece_at(Square::D5), None);
    }
}
