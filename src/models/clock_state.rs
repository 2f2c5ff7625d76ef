use super::game_state::PlayerColor;

/// Remaining time for both players, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockState {
    pub white: u32,
    pub black: u32,
    pub is_running: bool,
    pub active_player: PlayerColor,
}

impl ClockState {
    /// Both clocks at `minutes`, stopped, white to move.
    pub fn new(minutes: u32) -> Self {
        let seconds = minutes.saturating_mul(60);
        Self {
            white: seconds,
            black: seconds,
            is_running: false,
            active_player: PlayerColor::White,
        }
    }

    pub fn remaining(&self, color: PlayerColor) -> u32 {
        match color {
            PlayerColor::White => self.white,
            PlayerColor::Black => self.black,
        }
    }

    pub fn remaining_mut(&mut self, color: PlayerColor) -> &mut u32 {
        match color {
            PlayerColor::White => &mut self.white,
            PlayerColor::Black => &mut self.black,
        }
    }

    /// The colour whose clock ran out, if any.
    pub fn flagged(&self) -> Option<PlayerColor> {
        if self.white == 0 {
            Some(PlayerColor::White)
        } else if self.black == 0 {
            Some(PlayerColor::Black)
        } else {
            None
        }
    }
}

/// Render seconds as `m:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
