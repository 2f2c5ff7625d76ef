use log::{debug, warn};

use crate::models::{ClockState, PlayerColor};
use crate::observable::Observable;

/// Two countdowns and the pointer to the one that is running.
///
/// The clock knows nothing about moves. Whoever assembles the session tells
/// it when to start, pause and switch.
pub struct Clock {
    state: ClockState,
    flag_reported: bool,
    states: Observable<ClockState>,
}

impl Clock {
    pub fn new(minutes: u32) -> Self {
        let state = ClockState::new(minutes);
        Self {
            state,
            flag_reported: false,
            states: Observable::state(state),
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn states(&self) -> Observable<ClockState> {
        self.states.clone()
    }

    /// Both clocks to `minutes`, stopped, white active.
    pub fn set_time(&mut self, minutes: u32) {
        self.state = ClockState::new(minutes);
        self.flag_reported = false;
        self.publish();
    }

    /// Start the clock, or resume it after a pause.
    pub fn start(&mut self) {
        self.state.is_running = true;
        self.publish();
    }

    pub fn pause(&mut self) {
        self.state.is_running = false;
        self.publish();
    }

    /// Hand the clock to the other player. Ignored unless running.
    pub fn switch_active_player(&mut self) -> bool {
        if !self.state.is_running {
            debug!("Clock is not running, not switching players");
            return false;
        }
        self.state.active_player = self.state.active_player.opposite();
        self.publish();
        true
    }

    pub fn reset(&mut self, minutes: u32) {
        self.set_time(minutes);
    }

    /// One second elapses. Returns false when the clock is not running.
    pub fn tick(&mut self) -> bool {
        if !self.state.is_running {
            return false;
        }

        let active = self.state.active_player;
        let remaining = self.state.remaining_mut(active);
        *remaining = remaining.saturating_sub(1);
        let flagged = *remaining == 0;

        if flagged && !self.flag_reported {
            warn!("{} has run out of time", active);
            self.flag_reported = true;
        }
        self.publish();
        true
    }

    pub fn active_player(&self) -> PlayerColor {
        self.state.active_player
    }

    fn publish(&self) {
        self.states.publish(self.state);
    }
}
