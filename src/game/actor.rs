use actix::prelude::*;
use log::{info, warn};

use super::rules::{ChessRules, RulesEngine};
use super::session::{MoveOutcome, Session};
use crate::error::MoveError;
use crate::models::{AppliedMove, PlayerColor, PromotionPiece, SessionSnapshot, WireMove};

/// Actor owning a [`Session`]. Its mailbox is the single queue every move,
/// local or remote, passes through.
pub struct SessionActor<R: RulesEngine + Unpin + 'static = ChessRules> {
    session: Session<R>,
}

impl<R: RulesEngine + Unpin + 'static> SessionActor<R> {
    pub fn new(session: Session<R>) -> Self {
        Self { session }
    }
}

impl<R: RulesEngine + Unpin + 'static> Actor for SessionActor<R> {
    type Context = Context<Self>;

    fn started(&mut self, _: &mut Self::Context) {
        info!("Session actor started at {}", self.session.position());
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        info!(
            "Session actor stopped after {} moves",
            self.session.history().len()
        );
    }
}

#[derive(Message, Debug, Clone)]
#[rtype(result = "Result<MoveOutcome, MoveError>")]
pub struct ApplyMove {
    pub from: String,
    pub to: String,
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Result<AppliedMove, MoveError>")]
pub struct ResolvePromotion(pub PromotionPiece);

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "bool")]
pub struct CancelPromotion;

#[derive(Message, Debug, Clone)]
#[rtype(result = "Result<AppliedMove, MoveError>")]
pub struct ApplyRemoteMove(pub WireMove);

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Result<AppliedMove, MoveError>")]
pub struct Undo;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "Result<AppliedMove, MoveError>")]
pub struct Redo;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct StartNewGame;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct FlipBoard;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct SetOrientation(pub PlayerColor);

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "SessionSnapshot")]
pub struct GetSnapshot;

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct StopSession;

impl<R: RulesEngine + Unpin + 'static> Handler<ApplyMove> for SessionActor<R> {
    type Result = Result<MoveOutcome, MoveError>;

    fn handle(&mut self, msg: ApplyMove, _: &mut Self::Context) -> Self::Result {
        let result = self.session.apply_move(&msg.from, &msg.to);
        if let Err(e) = &result {
            info!("Rejected move {}{}: {}", msg.from, msg.to, e);
        }
        result
    }
}

impl<R: RulesEngine + Unpin + 'static> Handler<ResolvePromotion> for SessionActor<R> {
    type Result = Result<AppliedMove, MoveError>;

    fn handle(&mut self, msg: ResolvePromotion, _: &mut Self::Context) -> Self::Result {
        self.session.resolve_promotion(msg.0)
    }
}

impl<R: RulesEngine + Unpin + 'static> Handler<CancelPromotion> for SessionActor<R> {
    type Result = bool;

    fn handle(&mut self, _: CancelPromotion, _: &mut Self::Context) -> Self::Result {
        self.session.cancel_promotion()
    }
}

impl<R: RulesEngine + Unpin + 'static> Handler<ApplyRemoteMove> for SessionActor<R> {
    type Result = Result<AppliedMove, MoveError>;

    fn handle(&mut self, msg: ApplyRemoteMove, _: &mut Self::Context) -> Self::Result {
        let result = self.session.apply_remote_move(&msg.0);
        if let Err(e) = &result {
            warn!("Discarding remote move {:?}: {}", msg.0, e);
        }
        result
    }
}

impl<R: RulesEngine + Unpin + 'static> Handler<Undo> for SessionActor<R> {
    type Result = Result<AppliedMove, MoveError>;

    fn handle(&mut self, _: Undo, _: &mut Self::Context) -> Self::Result {
        self.session.undo()
    }
}

impl<R: RulesEngine + Unpin + 'static> Handler<Redo> for SessionActor<R> {
    type Result = Result<AppliedMove, MoveError>;

    fn handle(&mut self, _: Redo, _: &mut Self::Context) -> Self::Result {
        self.session.redo()
    }
}

impl<R: RulesEngine + Unpin + 'static> Handler<StartNewGame> for SessionActor<R> {
    type Result = ();

    fn handle(&mut self, _: StartNewGame, _: &mut Self::Context) {
        self.session.start_new_game();
    }
}

impl<R: RulesEngine + Unpin + 'static> Handler<FlipBoard> for SessionActor<R> {
    type Result = ();

    fn handle(&mut self, _: FlipBoard, _: &mut Self::Context) {
        self.session.flip_board();
    }
}

impl<R: RulesEngine + Unpin + 'static> Handler<SetOrientation> for SessionActor<R> {
    type Result = ();

    fn handle(&mut self, msg: SetOrientation, _: &mut Self::Context) {
        self.session.set_orientation(msg.0);
    }
}

impl<R: RulesEngine + Unpin + 'static> Handler<GetSnapshot> for SessionActor<R> {
    type Result = MessageResult<GetSnapshot>;

    fn handle(&mut self, _: GetSnapshot, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.session.snapshot())
    }
}

impl<R: RulesEngine + Unpin + 'static> Handler<StopSession> for SessionActor<R> {
    type Result = ();

    fn handle(&mut self, _: StopSession, ctx: &mut Self::Context) {
        ctx.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameStatus, MoveCommitted, MoveOrigin};
    use std::sync::{Arc, Mutex};

    #[actix_rt::test]
    async fn serializes_local_and_remote_moves() {
        let session = Session::new();
        let moves = session.moves();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = moves.subscribe(move |m: &MoveCommitted| sink.lock().unwrap().push(m.origin));

        let addr = SessionActor::new(session).start();

        // Fired without waiting; the mailbox keeps them in order
        addr.do_send(ApplyMove {
            from: "e2".to_string(),
            to: "e4".to_string(),
        });
        addr.do_send(ApplyRemoteMove(WireMove::new("e7", "e5")));
        // Replaying the same remote move is illegal now and gets discarded
        addr.do_send(ApplyRemoteMove(WireMove::new("e7", "e5")));

        let snapshot = addr.send(GetSnapshot).await.unwrap();
        assert_eq!(snapshot.move_count, 2);
        assert_eq!(snapshot.turn, PlayerColor::White);
        assert_eq!(snapshot.status, GameStatus::Active);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![MoveOrigin::Local, MoveOrigin::Remote]
        );
    }

    #[actix_rt::test]
    async fn reports_failures_to_the_caller() {
        let addr = SessionActor::new(Session::new()).start();

        assert_eq!(
            addr.send(Undo).await.unwrap(),
            Err(MoveError::NothingToUndo)
        );
        assert_eq!(
            addr.send(Redo).await.unwrap(),
            Err(MoveError::NothingToRedo)
        );
        assert_eq!(
            addr.send(ResolvePromotion(PromotionPiece::Queen))
                .await
                .unwrap(),
            Err(MoveError::NoPendingPromotion)
        );
        assert!(!addr.send(CancelPromotion).await.unwrap());
    }

    #[actix_rt::test]
    async fn stops_on_request() {
        let addr = SessionActor::new(Session::new()).start();
        addr.send(StopSession).await.unwrap();
        actix_rt::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!addr.connected());
    }
}
