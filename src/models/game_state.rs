use chess::{Color, Piece, Square};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MoveError;

/// Side of the board, spelled the way the wire protocol spells it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    White,
    Black,
}

impl PlayerColor {
    pub fn opposite(self) -> Self {
        match self {
            PlayerColor::White => PlayerColor::Black,
            PlayerColor::Black => PlayerColor::White,
        }
    }
}

impl From<Color> for PlayerColor {
    fn from(color: Color) -> Self {
        match color {
            Color::White => PlayerColor::White,
            Color::Black => PlayerColor::Black,
        }
    }
}

impl From<PlayerColor> for Color {
    fn from(color: PlayerColor) -> Self {
        match color {
            PlayerColor::White => Color::White,
            PlayerColor::Black => Color::Black,
        }
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerColor::White => write!(f, "white"),
            PlayerColor::Black => write!(f, "black"),
        }
    }
}

/// Piece kinds a pawn can be promoted to. Serialized as the single letters
/// used by the wire protocol.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionPiece {
    #[serde(rename = "q")]
    Queen,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "n")]
    Knight,
}

impl FromStr for PromotionPiece {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "q" | "queen" => Ok(PromotionPiece::Queen),
            "r" | "rook" => Ok(PromotionPiece::Rook),
            "b" | "bishop" => Ok(PromotionPiece::Bishop),
            "n" | "knight" => Ok(PromotionPiece::Knight),
            other => Err(MoveError::InvalidPromotion(other.to_string())),
        }
    }
}

impl From<PromotionPiece> for Piece {
    fn from(piece: PromotionPiece) -> Self {
        match piece {
            PromotionPiece::Queen => Piece::Queen,
            PromotionPiece::Rook => Piece::Rook,
            PromotionPiece::Bishop => Piece::Bishop,
            PromotionPiece::Knight => Piece::Knight,
        }
    }
}

impl TryFrom<Piece> for PromotionPiece {
    type Error = MoveError;

    fn try_from(piece: Piece) -> Result<Self, Self::Error> {
        match piece {
            Piece::Queen => Ok(PromotionPiece::Queen),
            Piece::Rook => Ok(PromotionPiece::Rook),
            Piece::Bishop => Ok(PromotionPiece::Bishop),
            Piece::Knight => Ok(PromotionPiece::Knight),
            other => Err(MoveError::InvalidPromotion(format!("{:?}", other))),
        }
    }
}

/// Status of the game derived from the rules engine after every applied move.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Active,
    Check,
    Checkmate,
    Draw,
}

impl GameStatus {
    /// Checkmate and draw end the game; check does not.
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Checkmate | GameStatus::Draw)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GameStatus::Active => "Active",
            GameStatus::Check => "Check",
            GameStatus::Checkmate => "Checkmate",
            GameStatus::Draw => "Draw",
        };
        f.write_str(label)
    }
}

/// A move the rules engine accepted, with enough detail to replay it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMove {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub color: PlayerColor,
    pub captured: Option<Piece>,
    pub promotion: Option<Piece>,
}

impl fmt::Display for AppliedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "={}", piece)?;
        }
        Ok(())
    }
}

/// A pawn move to the last rank waiting for the player to pick a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPromotion {
    pub from: Square,
    pub to: Square,
    pub color: PlayerColor,
}

/// Where a committed move came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOrigin {
    Local,
    Remote,
    Redo,
}

/// Published once for every move that enters the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCommitted {
    pub mv: AppliedMove,
    pub origin: MoveOrigin,
    pub position: String,
}

/// Everything a board view needs to render the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub position: String,
    pub turn: PlayerColor,
    pub status: GameStatus,
    pub pending_promotion: Option<PendingPromotion>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub move_count: usize,
    pub last_move: Option<AppliedMove>,
    pub orientation: PlayerColor,
}
