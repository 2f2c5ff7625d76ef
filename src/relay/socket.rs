use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use uuid::Uuid;

use super::state::RelayState;
use crate::error::RelayError;
use crate::models::{ClientMessage, PlayerColor, ServerMessage, WireMove};

/// One relay connection. Moves are passed through untouched; the relay
/// never checks chess rules.
pub struct RelaySocket {
    id: String,
    state: web::Data<RelayState>,
    seat: Option<(String, PlayerColor)>,
}

impl RelaySocket {
    pub fn new(state: web::Data<RelayState>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state,
            seat: None,
        }
    }
}

/// Serialized server message for a connection's client
#[derive(Message)]
#[rtype(result = "()")]
pub struct Deliver(pub String);

impl Actor for RelaySocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let total = self.state.register(&self.id, ctx.address());
        info!("WebSocket connection started: {}", self.id);
        info!("Total active sessions: {}", total);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.leave_game();
        let total = self.state.unregister(&self.id);
        info!("WebSocket connection closed: {}", self.id);
        info!("Total active sessions: {}", total);
        Running::Stop
    }
}

impl Handler<Deliver> for RelaySocket {
    type Result = ();

    fn handle(&mut self, msg: Deliver, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for RelaySocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                info!("Received text message: {}", text);
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => self.handle_message(client_msg, ctx),
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        self.reply_error(format!("Invalid message format: {}", e), ctx);
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.reply_error("Binary messages are not supported".to_string(), ctx);
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

impl RelaySocket {
    fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg {
            ClientMessage::CreateGame => self.handle_create(ctx),
            ClientMessage::JoinGame { game_id } => self.handle_join(game_id, ctx),
            ClientMessage::Move {
                game_id,
                mv,
                position,
            } => self.handle_move(game_id, mv, position, ctx),
        }
    }

    fn handle_create(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        self.leave_game();
        let game_id = self.state.create_game(&self.id);
        self.seat = Some((game_id.clone(), PlayerColor::White));
        self.reply(
            &ServerMessage::GameCreated {
                game_id,
                color: PlayerColor::White,
            },
            ctx,
        );
    }

    fn handle_join(&mut self, game_id: String, ctx: &mut ws::WebsocketContext<Self>) {
        if self.seat.as_ref().map(|(id, _)| id) != Some(&game_id) {
            self.leave_game();
        }

        let joined = match self.state.join_game(&game_id, &self.id) {
            Ok(joined) => joined,
            Err(e) => {
                info!("Player {} cannot join game {}: {}", self.id, game_id, e);
                self.reply_error(e.to_string(), ctx);
                return;
            }
        };
        self.seat = Some((game_id.clone(), joined.color));

        let opponent = match joined.opponent {
            Some(opponent) => opponent,
            None => {
                // Took the seat of a player who left; wait for the next one
                self.reply(
                    &ServerMessage::GameCreated {
                        game_id,
                        color: joined.color,
                    },
                    ctx,
                );
                return;
            }
        };

        self.reply(
            &ServerMessage::GameStarted {
                game_id: game_id.clone(),
                color: joined.color,
            },
            ctx,
        );
        self.deliver(
            &opponent,
            &ServerMessage::GameStarted {
                game_id,
                color: joined.color.opposite(),
            },
        );
    }

    fn handle_move(
        &mut self,
        game_id: String,
        mv: WireMove,
        position: String,
        ctx: &mut ws::WebsocketContext<Self>,
    ) {
        let seated = match &self.seat {
            Some((id, _)) if *id == game_id => Ok(()),
            _ => Err(RelayError::NotSeated(game_id.clone())),
        };
        let opponent = seated.and_then(|_| self.state.opponent_of(&game_id, &self.id));

        match opponent {
            Ok(Some(opponent)) => {
                info!("Relaying {}{} in game {}", mv.from, mv.to, game_id);
                self.deliver(
                    &opponent,
                    &ServerMessage::MoveMade {
                        mv: Some(mv),
                        position: Some(position),
                    },
                );
            }
            Ok(None) => {
                info!("No opponent in game {} to relay to", game_id);
            }
            Err(e) => {
                warn!("Rejecting move from {}: {}", self.id, e);
                self.reply_error(e.to_string(), ctx);
            }
        }
    }

    fn leave_game(&mut self) {
        let (game_id, _) = match self.seat.take() {
            Some(seat) => seat,
            None => return,
        };
        let left = match self.state.leave_game(&game_id, &self.id) {
            Some(left) => left,
            None => return,
        };
        info!("Removed player {} as {} from game {}", self.id, left.color, game_id);

        if let Some(opponent) = left.opponent {
            self.deliver(
                &opponent,
                &ServerMessage::OpponentDisconnected {
                    game_id: Some(game_id),
                    player_color: Some(left.color),
                },
            );
        }
    }

    fn deliver(&self, connection_id: &str, message: &ServerMessage) {
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                warn!("Error serializing message: {}", e);
                return;
            }
        };
        match self.state.address(connection_id) {
            Some(addr) => addr.do_send(Deliver(text)),
            None => warn!("Session not found for connection ID: {}", connection_id),
        }
    }

    fn reply(&self, message: &ServerMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Error serializing message: {}", e),
        }
    }

    fn reply_error(&self, message: String, ctx: &mut ws::WebsocketContext<Self>) {
        self.reply(&ServerMessage::Error { message }, ctx);
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<RelayState>,
) -> Result<HttpResponse, Error> {
    let socket = RelaySocket::new(state);
    info!("New WebSocket connection: {}", socket.id);
    ws::start(socket, &req, stream)
}
