//! One game as the player sees it: the board, the clock and the link to the
//! opponent, wired together.

use actix::prelude::*;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::ClientConfig;
use crate::error::TableError;
use crate::game::{
    ApplyMove, ApplyRemoteMove, CancelPromotion, FlipBoard, GetSnapshot, MoveOutcome, Redo,
    ResolvePromotion, Session, SessionActor, SetOrientation, StartNewGame, StopSession, Undo,
};
use crate::models::{
    AppliedMove, ClockState, ConnectionState, ConnectionStatus, MoveCommitted, MoveOrigin,
    PromotionPiece, SessionSnapshot, WireMove,
};
use crate::observable::{Observable, Subscription};
use crate::timer::{
    Clock, ClockActor, GetClock, PauseClock, ResetClock, SetTime, StartClock, StopClock,
    SwitchActivePlayer,
};
use crate::websocket::{
    Connector, CreateGame, Disconnect, GetConnectionState, JoinGame, MakeMove, MultiplayerClient,
};

/// Owns the three actors of a session. Must be created inside a running
/// actix system. Dropping the table stops all of them.
pub struct GameTable {
    session: Addr<SessionActor>,
    clock: Addr<ClockActor>,
    client: Addr<MultiplayerClient>,
    snapshots: Observable<SessionSnapshot>,
    clock_states: Observable<ClockState>,
    connection: Observable<ConnectionState>,
    first_move_played: Arc<AtomicBool>,
    minutes: Arc<AtomicU32>,
    subscriptions: Vec<Subscription>,
}

impl GameTable {
    pub fn new(config: ClientConfig, connector: impl Connector + 'static) -> Self {
        let minutes = Arc::new(AtomicU32::new(config.default_minutes));
        let first_move_played = Arc::new(AtomicBool::new(false));

        let session = Session::new();
        let snapshots = session.snapshots();
        let moves = session.moves();
        let undone = session.undone();
        let session = SessionActor::new(session).start();

        let clock = Clock::new(config.default_minutes);
        let clock_states = clock.states();
        let clock = ClockActor::new(clock, config.tick_interval).start();

        let client = MultiplayerClient::new(config, connector);
        let connection = client.states();
        let opponent_moves = client.opponent_moves();
        let client = client.start();

        let mut subscriptions = Vec::new();

        let to_session = session.clone();
        subscriptions.push(opponent_moves.subscribe(move |mv: &WireMove| {
            to_session.do_send(ApplyRemoteMove(mv.clone()));
        }));

        let to_client = client.clone();
        let to_clock = clock.clone();
        let gate = Arc::clone(&first_move_played);
        subscriptions.push(moves.subscribe(move |committed: &MoveCommitted| {
            if committed.origin == MoveOrigin::Local {
                to_client.do_send(MakeMove {
                    mv: WireMove::from(&committed.mv),
                    position: committed.position.clone(),
                });
            }
            // The first move of a game starts the clock for both sides
            if !gate.swap(true, Ordering::SeqCst) {
                info!("First move played, starting the clock");
                to_clock.do_send(StartClock);
            }
            to_clock.do_send(SwitchActivePlayer);
        }));

        // Taking a move back hands the clock back to the player who made it
        let to_clock = clock.clone();
        subscriptions.push(undone.subscribe(move |_: &AppliedMove| {
            to_clock.do_send(SwitchActivePlayer);
        }));

        let to_session = session.clone();
        let to_clock = clock.clone();
        let gate = Arc::clone(&first_move_played);
        let time_control = Arc::clone(&minutes);
        let previous: Mutex<Option<ConnectionState>> = Mutex::new(None);
        subscriptions.push(connection.subscribe(move |state: &ConnectionState| {
            let before = previous
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .replace(state.clone());
            let before_status = before.as_ref().map(|b| b.status);
            if before_status == Some(state.status) {
                return;
            }
            let lost_seat =
                before.as_ref().is_some_and(|b| b.seat.is_some()) && state.seat.is_none();

            match state.status {
                ConnectionStatus::Playing => {
                    to_session.do_send(StartNewGame);
                    if let Some(color) = state.player_color() {
                        to_session.do_send(SetOrientation(color));
                    }
                    to_clock.do_send(ResetClock(time_control.load(Ordering::SeqCst)));
                    gate.store(false, Ordering::SeqCst);
                }
                ConnectionStatus::Disconnected if before.is_some() => {
                    info!("Disconnected from the relay, resetting the board");
                    to_session.do_send(StartNewGame);
                    to_clock.do_send(PauseClock);
                    gate.store(false, Ordering::SeqCst);
                }
                ConnectionStatus::Connected if lost_seat => {
                    info!("Reconnected without a game, resetting the board");
                    to_session.do_send(StartNewGame);
                    to_clock.do_send(PauseClock);
                    gate.store(false, Ordering::SeqCst);
                }
                _ => {}
            }
        }));

        Self {
            session,
            clock,
            client,
            snapshots,
            clock_states,
            connection,
            first_move_played,
            minutes,
            subscriptions,
        }
    }

    pub fn snapshots(&self) -> Observable<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn clock_states(&self) -> Observable<ClockState> {
        self.clock_states.clone()
    }

    pub fn connection_states(&self) -> Observable<ConnectionState> {
        self.connection.clone()
    }

    /// Play a move on the local board. While seated in a relay game only
    /// the seated colour may move.
    pub async fn apply_move(&self, from: &str, to: &str) -> Result<MoveOutcome, TableError> {
        if let Some(seat) = self.connection.get().and_then(|state| state.player_color()) {
            let turn = self.snapshot().await?.turn;
            if turn != seat {
                return Err(TableError::NotYourTurn { seat, turn });
            }
        }
        let outcome = self
            .session
            .send(ApplyMove {
                from: from.to_string(),
                to: to.to_string(),
            })
            .await??;
        Ok(outcome)
    }

    pub async fn resolve_promotion(&self, piece: PromotionPiece) -> Result<AppliedMove, TableError> {
        Ok(self.session.send(ResolvePromotion(piece)).await??)
    }

    pub async fn cancel_promotion(&self) -> Result<bool, TableError> {
        Ok(self.session.send(CancelPromotion).await?)
    }

    pub async fn undo(&self) -> Result<AppliedMove, TableError> {
        Ok(self.session.send(Undo).await??)
    }

    pub async fn redo(&self) -> Result<AppliedMove, TableError> {
        Ok(self.session.send(Redo).await??)
    }

    pub async fn flip_board(&self) -> Result<(), TableError> {
        Ok(self.session.send(FlipBoard).await?)
    }

    /// Fresh board and clock. The next move starts the clock again.
    pub async fn new_game(&self) -> Result<(), TableError> {
        self.session.send(StartNewGame).await?;
        self.clock
            .send(ResetClock(self.minutes.load(Ordering::SeqCst)))
            .await?;
        self.first_move_played.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Change the time control. Only allowed before the first move.
    pub async fn set_time(&self, minutes: u32) -> Result<(), TableError> {
        if self.first_move_played.load(Ordering::SeqCst) {
            return Err(TableError::GameInProgress);
        }
        self.minutes.store(minutes, Ordering::SeqCst);
        Ok(self.clock.send(SetTime(minutes)).await?)
    }

    pub async fn start_clock(&self) -> Result<(), TableError> {
        Ok(self.clock.send(StartClock).await?)
    }

    pub async fn pause_clock(&self) -> Result<(), TableError> {
        Ok(self.clock.send(PauseClock).await?)
    }

    pub async fn reset_clock(&self) -> Result<(), TableError> {
        let minutes = self.minutes.load(Ordering::SeqCst);
        Ok(self.clock.send(ResetClock(minutes)).await?)
    }

    pub async fn create_game(&self) -> Result<(), TableError> {
        Ok(self.client.send(CreateGame).await??)
    }

    pub async fn join_game(&self, game_id: &str) -> Result<(), TableError> {
        Ok(self.client.send(JoinGame(game_id.to_string())).await??)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, TableError> {
        Ok(self.session.send(GetSnapshot).await?)
    }

    pub async fn clock_state(&self) -> Result<ClockState, TableError> {
        Ok(self.clock.send(GetClock).await?)
    }

    pub async fn connection_state(&self) -> Result<ConnectionState, TableError> {
        Ok(self.client.send(GetConnectionState).await?)
    }

    /// Stop every actor. Same as dropping the table.
    pub fn shutdown(self) {}
}

impl Drop for GameTable {
    fn drop(&mut self) {
        debug!("Tearing down game table");
        self.subscriptions.clear();
        self.client.do_send(Disconnect);
        self.clock.do_send(StopClock);
        self.session.do_send(StopSession);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MoveError;
    use crate::models::{GameStatus, PlayerColor};
    use crate::websocket::testing::MockConnector;
    use crate::websocket::OutboundFrame;
    use std::time::Duration;

    fn config() -> ClientConfig {
        ClientConfig {
            reconnect_delay: Duration::from_millis(5),
            // Long enough that no tick lands during a test
            tick_interval: Duration::from_secs(60),
            ..ClientConfig::default()
        }
    }

    async fn settle() {
        actix_rt::time::sleep(Duration::from_millis(30)).await;
    }

    #[actix_rt::test]
    async fn first_move_starts_the_clock_for_the_opponent() {
        let table = GameTable::new(config(), MockConnector::default());

        let idle = table.clock_state().await.unwrap();
        assert!(!idle.is_running);

        table.apply_move("e2", "e4").await.unwrap();
        settle().await;

        let clock = table.clock_state().await.unwrap();
        assert!(clock.is_running);
        assert_eq!(clock.active_player, PlayerColor::Black);

        table.apply_move("e7", "e5").await.unwrap();
        settle().await;
        assert_eq!(
            table.clock_state().await.unwrap().active_player,
            PlayerColor::White
        );
    }

    #[actix_rt::test]
    async fn plays_against_the_relay() {
        let connector = MockConnector::default();
        let table = GameTable::new(config(), connector.clone());
        settle().await;

        connector.push_text(r#"{"type":"game_started","gameId":"abc","color":"black"}"#);
        settle().await;
        let snapshot = table.snapshot().await.unwrap();
        assert_eq!(snapshot.orientation, PlayerColor::Black);

        connector.push_text(r#"{"type":"move_made","move":{"from":"e2","to":"e4"}}"#);
        settle().await;
        let snapshot = table.snapshot().await.unwrap();
        assert_eq!(snapshot.move_count, 1);
        assert_eq!(snapshot.turn, PlayerColor::Black);
        assert_eq!(
            table.clock_state().await.unwrap().active_player,
            PlayerColor::Black
        );
        // Remote moves are not echoed back
        assert!(connector.received().is_empty());

        table.apply_move("e7", "e5").await.unwrap();
        settle().await;
        let frames = connector.received();
        assert_eq!(frames.len(), 1);
        let OutboundFrame::Text(text) = &frames[0] else {
            panic!("expected text, got {:?}", frames[0]);
        };
        assert!(text.contains(r#""move":{"from":"e7","to":"e5"}"#));
        assert!(text.contains(r#""gameId":"abc""#));
    }

    #[actix_rt::test]
    async fn time_control_is_locked_once_play_starts() {
        let table = GameTable::new(config(), MockConnector::default());

        table.set_time(5).await.unwrap();
        assert_eq!(table.clock_state().await.unwrap(), ClockState::new(5));

        table.apply_move("e2", "e4").await.unwrap();
        assert_eq!(table.set_time(3).await, Err(TableError::GameInProgress));

        table.new_game().await.unwrap();
        table.set_time(3).await.unwrap();
        assert_eq!(table.clock_state().await.unwrap(), ClockState::new(3));
        assert_eq!(table.snapshot().await.unwrap().move_count, 0);
    }

    #[actix_rt::test]
    async fn illegal_moves_surface_as_errors() {
        let table = GameTable::new(config(), MockConnector::default());
        let result = table.apply_move("e2", "e5").await;
        assert!(matches!(result, Err(TableError::Move(_))));
        assert_eq!(table.undo().await, Err(TableError::Move(MoveError::NothingToUndo)));
    }

    #[actix_rt::test]
    async fn losing_the_relay_resets_the_board() {
        let connector = MockConnector::default();
        let config = ClientConfig {
            max_reconnect_attempts: 1,
            ..config()
        };
        let table = GameTable::new(config, connector.clone());
        settle().await;

        connector.push_text(r#"{"type":"game_started","gameId":"abc","color":"white"}"#);
        settle().await;
        table.apply_move("e2", "e4").await.unwrap();

        connector.set_refuse(true);
        connector.hang_up();
        actix_rt::time::sleep(Duration::from_millis(80)).await;

        let state = table.connection_state().await.unwrap();
        assert_eq!(state.status, ConnectionStatus::Disconnected);
        let snapshot = table.snapshot().await.unwrap();
        assert_eq!(snapshot.move_count, 0);
        assert_eq!(snapshot.status, GameStatus::Active);
        assert!(!table.clock_state().await.unwrap().is_running);
    }

    #[actix_rt::test]
    async fn undo_and_redo_keep_the_clock_on_the_side_to_move() {
        let table = GameTable::new(config(), MockConnector::default());
        table.apply_move("e2", "e4").await.unwrap();
        table.apply_move("e7", "e5").await.unwrap();
        settle().await;

        table.undo().await.unwrap();
        settle().await;
        let clock = table.clock_state().await.unwrap();
        assert_eq!(table.snapshot().await.unwrap().turn, PlayerColor::Black);
        assert_eq!(clock.active_player, PlayerColor::Black);
        assert!(clock.is_running);

        table.redo().await.unwrap();
        settle().await;
        assert_eq!(table.snapshot().await.unwrap().turn, PlayerColor::White);
        assert_eq!(
            table.clock_state().await.unwrap().active_player,
            PlayerColor::White
        );
    }

    #[actix_rt::test]
    async fn seated_players_only_move_their_own_pieces() {
        let connector = MockConnector::default();
        let table = GameTable::new(config(), connector.clone());
        settle().await;
        connector.push_text(r#"{"type":"game_started","gameId":"abc","color":"black"}"#);
        settle().await;

        assert_eq!(
            table.apply_move("e2", "e4").await,
            Err(TableError::NotYourTurn {
                seat: PlayerColor::Black,
                turn: PlayerColor::White,
            })
        );
        settle().await;
        assert_eq!(table.snapshot().await.unwrap().move_count, 0);
        assert!(connector.received().is_empty());

        connector.push_text(r#"{"type":"move_made","move":{"from":"e2","to":"e4"}}"#);
        settle().await;
        table.apply_move("e7", "e5").await.unwrap();
        assert_eq!(table.snapshot().await.unwrap().move_count, 2);
    }

    #[actix_rt::test]
    async fn reconnecting_without_a_seat_resets_the_board() {
        let connector = MockConnector::default();
        let table = GameTable::new(config(), connector.clone());
        settle().await;
        connector.push_text(r#"{"type":"game_started","gameId":"abc","color":"white"}"#);
        settle().await;
        table.apply_move("e2", "e4").await.unwrap();

        connector.hang_up();
        actix_rt::time::sleep(Duration::from_millis(80)).await;

        let state = table.connection_state().await.unwrap();
        assert_eq!(state.status, ConnectionStatus::Connected);
        assert_eq!(state.seat, None);
        assert_eq!(table.snapshot().await.unwrap().move_count, 0);
        assert!(!table.clock_state().await.unwrap().is_running);

        // Unseated again, so either colour may move
        table.apply_move("e2", "e4").await.unwrap();
        table.apply_move("e7", "e5").await.unwrap();
    }

    #[actix_rt::test]
    async fn dropping_the_table_stops_every_actor() {
        let table = GameTable::new(config(), MockConnector::default());
        let (session, clock, client) = (
            table.session.clone(),
            table.clock.clone(),
            table.client.clone(),
        );
        settle().await;

        table.shutdown();
        settle().await;

        assert!(!session.connected());
        assert!(!clock.connected());
        assert!(!client.connected());
    }
}
