use actix::prelude::*;
use futures::channel::mpsc;
use futures::{future, stream, StreamExt};
use log::{debug, error, info, warn};
use uuid::Uuid;

use super::transport::{Connection, Connector, InboundFrame, OutboundFrame};
use crate::config::ClientConfig;
use crate::error::{SendError, TransportError};
use crate::models::{
    ClientMessage, ConnectionState, ConnectionStatus, GameSeat, ServerMessage, WireMove,
};
use crate::observable::Observable;

/// Client side of the relay protocol.
///
/// Connects as soon as it starts. A failed or dropped socket is retried up to
/// `max_reconnect_attempts` times, `reconnect_delay` apart; after that the
/// status settles on `Disconnected` and nothing more is attempted.
pub struct MultiplayerClient {
    config: ClientConfig,
    connector: Box<dyn Connector>,
    state: ConnectionState,
    states: Observable<ConnectionState>,
    connected: Observable<bool>,
    opponent_moves: Observable<WireMove>,
    /// Bumped for every attempt. Socket events carry the generation they
    /// were read under.
    generation: u64,
    outbound: Option<mpsc::UnboundedSender<OutboundFrame>>,
    connecting: bool,
    retry: Option<SpawnHandle>,
    closing: bool,
}

impl MultiplayerClient {
    pub fn new(config: ClientConfig, connector: impl Connector + 'static) -> Self {
        let state = ConnectionState::default();
        Self {
            config,
            connector: Box::new(connector),
            states: Observable::state(state.clone()),
            state,
            connected: Observable::state(false),
            opponent_moves: Observable::events(),
            generation: 0,
            outbound: None,
            connecting: false,
            retry: None,
            closing: false,
        }
    }

    pub fn states(&self) -> Observable<ConnectionState> {
        self.states.clone()
    }

    pub fn connected(&self) -> Observable<bool> {
        self.connected.clone()
    }

    pub fn opponent_moves(&self) -> Observable<WireMove> {
        self.opponent_moves.clone()
    }

    fn connect(&mut self, ctx: &mut Context<Self>) {
        if self.closing || self.connecting || self.outbound.is_some() {
            return;
        }
        self.connecting = true;
        self.retry = None;
        self.generation += 1;
        let generation = self.generation;
        let connection_id = Uuid::new_v4();

        info!(
            "Connecting to {} (connection {}, retry {}/{})",
            self.config.server_url,
            connection_id,
            self.state.reconnect_attempts,
            self.config.max_reconnect_attempts
        );
        self.set_status(ConnectionStatus::Connecting);

        self.connector
            .connect(&self.config.server_url)
            .into_actor(self)
            .map(move |result, act, ctx| {
                act.connecting = false;
                if act.closing || generation != act.generation {
                    return;
                }
                match result {
                    Ok(connection) => act.opened(connection, connection_id, ctx),
                    Err(e) => {
                        warn!("Connection {} failed: {}", connection_id, e);
                        act.connection_lost(ctx);
                    }
                }
            })
            .spawn(ctx);
    }

    fn opened(&mut self, connection: Connection, connection_id: Uuid, ctx: &mut Context<Self>) {
        let generation = self.generation;
        let Connection { sink, stream } = connection;

        let (tx, rx) = mpsc::unbounded();
        rx.map(Ok::<_, TransportError>)
            .forward(sink)
            .into_actor(self)
            .map(move |result, act, ctx| {
                if act.closing && generation == act.generation {
                    debug!("Writer for connection {} finished", connection_id);
                    ctx.stop();
                    return;
                }
                if let Err(e) = result {
                    if act.is_live(generation) {
                        warn!("Writing to connection {} failed: {}", connection_id, e);
                        act.connection_lost(ctx);
                    }
                }
            })
            .spawn(ctx);

        let events = stream
            .map(move |item| SocketEvent {
                generation,
                kind: match item {
                    Ok(frame) => SocketEventKind::Frame(frame),
                    Err(e) => SocketEventKind::Failed(e),
                },
            })
            .chain(stream::once(future::ready(SocketEvent {
                generation,
                kind: SocketEventKind::Ended,
            })));
        ctx.add_message_stream(events);

        info!("Connection {} established", connection_id);
        self.outbound = Some(tx);
        self.state.reconnect_attempts = 0;
        // The relay frees a seat as soon as its socket goes away
        if let Some(seat) = self.state.seat.take() {
            warn!(
                "Reconnected after losing game {}, the relay no longer holds the seat",
                seat.game_id
            );
        }
        self.connected.publish(true);
        self.set_status(ConnectionStatus::Connected);
    }

    fn is_live(&self, generation: u64) -> bool {
        generation == self.generation && self.outbound.is_some()
    }

    fn connection_lost(&mut self, ctx: &mut Context<Self>) {
        if self.outbound.take().is_some() {
            self.connected.publish(false);
        }
        if self.closing {
            return;
        }

        if self.state.reconnect_attempts < self.config.max_reconnect_attempts {
            self.state.reconnect_attempts += 1;
            info!(
                "Attempting to reconnect ({}/{}) in {:?}",
                self.state.reconnect_attempts,
                self.config.max_reconnect_attempts,
                self.config.reconnect_delay
            );
            self.publish();
            self.retry = Some(ctx.run_later(self.config.reconnect_delay, |act, ctx| {
                act.connect(ctx);
            }));
        } else {
            error!(
                "Giving up on {} after {} reconnection attempts",
                self.config.server_url, self.state.reconnect_attempts
            );
            self.state.seat = None;
            self.set_status(ConnectionStatus::Disconnected);
        }
    }

    fn handle_text(&mut self, text: &str) {
        let msg = match serde_json::from_str::<ServerMessage>(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Dropping unreadable message {}: {}", text, e);
                return;
            }
        };

        match msg {
            ServerMessage::GameCreated { game_id, color } => {
                info!("Created game {} playing {}", game_id, color);
                self.state.seat = Some(GameSeat { game_id, color });
                self.set_status(ConnectionStatus::WaitingForOpponent);
            }
            ServerMessage::GameStarted { game_id, color } => {
                info!("Game {} started, playing {}", game_id, color);
                self.state.seat = Some(GameSeat { game_id, color });
                self.set_status(ConnectionStatus::Playing);
            }
            ServerMessage::MoveMade { mv: Some(mv), .. } => {
                debug!("Opponent played {:?}", mv);
                self.opponent_moves.publish(mv);
            }
            ServerMessage::MoveMade { mv: None, .. } => {
                debug!("Ignoring move_made without a move");
            }
            ServerMessage::OpponentDisconnected {
                game_id,
                player_color,
            } => {
                info!("Opponent left the game");
                if self.state.seat.is_none() {
                    if let (Some(game_id), Some(color)) = (game_id, player_color) {
                        self.state.seat = Some(GameSeat { game_id, color });
                    }
                }
                self.set_status(ConnectionStatus::OpponentDisconnected);
            }
            ServerMessage::Error { message } => {
                warn!("Relay reported an error: {}", message);
            }
        }
    }

    fn send(&self, msg: &ClientMessage) -> Result<(), SendError> {
        let outbound = match &self.outbound {
            Some(outbound) => outbound,
            None => {
                error!("WebSocket is not connected, dropping {:?}", msg);
                return Err(SendError::NotConnected);
            }
        };
        let text = serde_json::to_string(msg).map_err(|e| SendError::Serialize(e.to_string()))?;
        outbound
            .unbounded_send(OutboundFrame::Text(text))
            .map_err(|_| SendError::NotConnected)
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        self.state.status = status;
        self.publish();
    }

    fn publish(&self) {
        self.states.publish(self.state.clone());
    }
}

impl Actor for MultiplayerClient {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.connect(ctx);
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        info!("Multiplayer client stopped");
    }
}

#[derive(Message)]
#[rtype(result = "()")]
struct SocketEvent {
    generation: u64,
    kind: SocketEventKind,
}

enum SocketEventKind {
    Frame(InboundFrame),
    Failed(TransportError),
    Ended,
}

impl Handler<SocketEvent> for MultiplayerClient {
    type Result = ();

    fn handle(&mut self, event: SocketEvent, ctx: &mut Self::Context) {
        if !self.is_live(event.generation) {
            return;
        }

        match event.kind {
            SocketEventKind::Frame(InboundFrame::Text(text)) => self.handle_text(&text),
            SocketEventKind::Frame(InboundFrame::Ping(data)) => {
                if let Some(outbound) = &self.outbound {
                    let _ = outbound.unbounded_send(OutboundFrame::Pong(data));
                }
            }
            SocketEventKind::Frame(InboundFrame::Close) => {
                info!("WebSocket connection closed");
                self.connection_lost(ctx);
            }
            SocketEventKind::Failed(e) => {
                warn!("WebSocket error: {}", e);
                self.connection_lost(ctx);
            }
            SocketEventKind::Ended => {
                info!("WebSocket stream ended");
                self.connection_lost(ctx);
            }
        }
    }
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Result<(), SendError>")]
pub struct CreateGame;

#[derive(Message, Debug, Clone)]
#[rtype(result = "Result<(), SendError>")]
pub struct JoinGame(pub String);

#[derive(Message, Debug, Clone)]
#[rtype(result = "Result<(), SendError>")]
pub struct MakeMove {
    pub mv: WireMove,
    pub position: String,
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "ConnectionState")]
pub struct GetConnectionState;

/// Close the socket for good. No reconnection follows.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct Disconnect;

impl Handler<CreateGame> for MultiplayerClient {
    type Result = Result<(), SendError>;

    fn handle(&mut self, _: CreateGame, _: &mut Self::Context) -> Self::Result {
        self.send(&ClientMessage::CreateGame)
    }
}

impl Handler<JoinGame> for MultiplayerClient {
    type Result = Result<(), SendError>;

    fn handle(&mut self, msg: JoinGame, _: &mut Self::Context) -> Self::Result {
        self.send(&ClientMessage::JoinGame { game_id: msg.0 })
    }
}

impl Handler<MakeMove> for MultiplayerClient {
    type Result = Result<(), SendError>;

    fn handle(&mut self, msg: MakeMove, _: &mut Self::Context) -> Self::Result {
        let game_id = match self.state.game_id() {
            Some(game_id) => game_id.to_string(),
            None => {
                debug!("Not in a game, not sending {:?}", msg.mv);
                return Err(SendError::NotInGame);
            }
        };
        self.send(&ClientMessage::Move {
            game_id,
            mv: msg.mv,
            position: msg.position,
        })
    }
}

impl Handler<GetConnectionState> for MultiplayerClient {
    type Result = MessageResult<GetConnectionState>;

    fn handle(&mut self, _: GetConnectionState, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.state.clone())
    }
}

impl Handler<Disconnect> for MultiplayerClient {
    type Result = ();

    fn handle(&mut self, _: Disconnect, ctx: &mut Self::Context) {
        info!("Disconnecting from {}", self.config.server_url);
        self.closing = true;
        if let Some(retry) = self.retry.take() {
            ctx.cancel_future(retry);
        }
        self.state.seat = None;
        self.set_status(ConnectionStatus::Disconnected);

        // Dropping the sender ends the writer once Close is flushed; the
        // writer's completion stops the actor.
        match self.outbound.take() {
            Some(outbound) => {
                self.connected.publish(false);
                if outbound.unbounded_send(OutboundFrame::Close).is_err() {
                    ctx.stop();
                }
            }
            None => ctx.stop(),
        }
    }
}
