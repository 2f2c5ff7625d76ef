use serde::{Deserialize, Serialize};

use super::game_state::{AppliedMove, PlayerColor, PromotionPiece};

/// Message sent from a client to the relay
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateGame,
    JoinGame {
        #[serde(rename = "gameId")]
        game_id: String,
    },
    Move {
        #[serde(rename = "gameId")]
        game_id: String,
        #[serde(rename = "move")]
        mv: WireMove,
        position: String,
    },
}

/// Message sent from the relay to a client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    GameCreated {
        #[serde(rename = "gameId")]
        game_id: String,
        color: PlayerColor,
    },
    GameStarted {
        #[serde(rename = "gameId")]
        game_id: String,
        color: PlayerColor,
    },
    MoveMade {
        #[serde(rename = "move", default)]
        mv: Option<WireMove>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<String>,
    },
    OpponentDisconnected {
        #[serde(rename = "gameId", default)]
        game_id: Option<String>,
        #[serde(rename = "playerColor", default)]
        player_color: Option<PlayerColor>,
    },
    Error {
        message: String,
    },
}

/// A move as it travels between peers: algebraic squares plus an optional
/// promotion letter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WireMove {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionPiece>,
}

impl WireMove {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, piece: PromotionPiece) -> Self {
        self.promotion = Some(piece);
        self
    }
}

impl From<&AppliedMove> for WireMove {
    fn from(mv: &AppliedMove) -> Self {
        Self {
            from: mv.from.to_string(),
            to: mv.to.to_string(),
            promotion: mv.promotion.and_then(|piece| PromotionPiece::try_from(piece).ok()),
        }
    }
}
