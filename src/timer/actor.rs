use actix::prelude::*;
use log::info;
use std::time::Duration;

use super::clock::Clock;
use crate::models::ClockState;

/// Runs a [`Clock`] on a fixed cadence. The interval lives as long as the
/// actor; ticks while stopped are no-ops.
pub struct ClockActor {
    clock: Clock,
    tick_interval: Duration,
}

impl ClockActor {
    pub fn new(clock: Clock, tick_interval: Duration) -> Self {
        Self {
            clock,
            tick_interval,
        }
    }
}

impl Actor for ClockActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("Clock started, ticking every {:?}", self.tick_interval);
        ctx.run_interval(self.tick_interval, |act, _| {
            act.clock.tick();
        });
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        info!("Clock stopped");
    }
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct SetTime(pub u32);

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct StartClock;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct PauseClock;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "bool")]
pub struct SwitchActivePlayer;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct ResetClock(pub u32);

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "ClockState")]
pub struct GetClock;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct StopClock;

impl Handler<SetTime> for ClockActor {
    type Result = ();

    fn handle(&mut self, msg: SetTime, _: &mut Self::Context) {
        info!("Time control set to {} minutes", msg.0);
        self.clock.set_time(msg.0);
    }
}

impl Handler<StartClock> for ClockActor {
    type Result = ();

    fn handle(&mut self, _: StartClock, _: &mut Self::Context) {
        self.clock.start();
    }
}

impl Handler<PauseClock> for ClockActor {
    type Result = ();

    fn handle(&mut self, _: PauseClock, _: &mut Self::Context) {
        self.clock.pause();
    }
}

impl Handler<SwitchActivePlayer> for ClockActor {
    type Result = bool;

    fn handle(&mut self, _: SwitchActivePlayer, _: &mut Self::Context) -> bool {
        self.clock.switch_active_player()
    }
}

impl Handler<ResetClock> for ClockActor {
    type Result = ();

    fn handle(&mut self, msg: ResetClock, _: &mut Self::Context) {
        self.clock.reset(msg.0);
    }
}

impl Handler<GetClock> for ClockActor {
    type Result = MessageResult<GetClock>;

    fn handle(&mut self, _: GetClock, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.clock.state())
    }
}

impl Handler<StopClock> for ClockActor {
    type Result = ();

    fn handle(&mut self, _: StopClock, ctx: &mut Self::Context) {
        ctx.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlayerColor;

    #[actix_rt::test]
    async fn ticks_only_while_running() {
        let addr = ClockActor::new(Clock::new(1), Duration::from_millis(5)).start();

        actix_rt::time::sleep(Duration::from_millis(40)).await;
        let idle = addr.send(GetClock).await.unwrap();
        assert_eq!(idle, ClockState::new(1));

        addr.send(StartClock).await.unwrap();
        actix_rt::time::sleep(Duration::from_millis(60)).await;
        addr.send(PauseClock).await.unwrap();

        let state = addr.send(GetClock).await.unwrap();
        assert!(state.white < 60);
        assert_eq!(state.black, 60);
        assert_eq!(state.active_player, PlayerColor::White);

        actix_rt::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(addr.send(GetClock).await.unwrap(), state);
    }

    #[actix_rt::test]
    async fn switch_is_refused_while_stopped() {
        let addr = ClockActor::new(Clock::new(1), Duration::from_secs(1)).start();
        assert!(!addr.send(SwitchActivePlayer).await.unwrap());

        addr.send(StartClock).await.unwrap();
        assert!(addr.send(SwitchActivePlayer).await.unwrap());
        assert_eq!(
            addr.send(GetClock).await.unwrap().active_player,
            PlayerColor::Black
        );
    }

    #[actix_rt::test]
    async fn stopping_cancels_the_ticker() {
        let clock = Clock::new(1);
        let states = clock.states();
        let addr = ClockActor::new(clock, Duration::from_millis(5)).start();
        addr.send(StartClock).await.unwrap();
        addr.send(StopClock).await.unwrap();

        actix_rt::time::sleep(Duration::from_millis(20)).await;
        let frozen = states.get();
        actix_rt::time::sleep(Duration::from_millis(30)).await;

        assert!(!addr.connected());
        assert_eq!(states.get(), frozen);
    }
}
