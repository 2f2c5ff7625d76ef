use std::fmt;

use super::game_state::PlayerColor;

/// Lifecycle of the link to the relay and of the game played over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    WaitingForOpponent,
    Playing,
    OpponentDisconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::WaitingForOpponent => "waiting_for_opponent",
            ConnectionStatus::Playing => "playing",
            ConnectionStatus::OpponentDisconnected => "opponent_disconnected",
        };
        f.write_str(label)
    }
}

/// Game identity handed out by the relay. The id and colour always travel
/// together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSeat {
    pub game_id: String,
    pub color: PlayerColor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub seat: Option<GameSeat>,
    pub reconnect_attempts: u32,
}

impl ConnectionState {
    pub fn game_id(&self) -> Option<&str> {
        self.seat.as_ref().map(|seat| seat.game_id.as_str())
    }

    pub fn player_color(&self) -> Option<PlayerColor> {
        self.seat.as_ref().map(|seat| seat.color)
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            seat: None,
            reconnect_attempts: 0,
        }
    }
}
