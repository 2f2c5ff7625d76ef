//! Move history, undo/redo and the two-phase promotion protocol.

use chess::Piece;
use log::{debug, info, warn};

use super::rules::{ChessRules, RulesEngine};
use super::utils::{is_last_rank, parse_square};
use crate::error::MoveError;
use crate::models::{
    AppliedMove, GameStatus, MoveCommitted, MoveOrigin, PendingPromotion, PlayerColor,
    PromotionPiece, SessionSnapshot, WireMove,
};
use crate::observable::Observable;

/// Result of a local move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Committed(AppliedMove),
    /// The move promotes a pawn; nothing was committed and the caller should
    /// ask for a piece.
    PromotionPending(PendingPromotion),
}

pub struct Session<R: RulesEngine = ChessRules> {
    rules: R,
    status: GameStatus,
    move_history: Vec<AppliedMove>,
    redo_stack: Vec<AppliedMove>,
    pending_promotion: Option<PendingPromotion>,
    orientation: PlayerColor,
    snapshots: Observable<SessionSnapshot>,
    moves: Observable<MoveCommitted>,
    undone: Observable<AppliedMove>,
}

impl Session<ChessRules> {
    pub fn new() -> Self {
        Self::with_rules(ChessRules::new())
    }
}

impl Default for Session<ChessRules> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RulesEngine> Session<R> {
    /// Wrap an engine as-is, keeping whatever position it holds.
    pub fn with_rules(rules: R) -> Self {
        let status = derive_status(&rules);
        let snapshot = SessionSnapshot {
            position: rules.serialize_position(),
            turn: rules.turn().into(),
            status,
            pending_promotion: None,
            can_undo: false,
            can_redo: false,
            move_count: 0,
            last_move: None,
            orientation: PlayerColor::White,
        };

        Self {
            rules,
            status,
            move_history: Vec::new(),
            redo_stack: Vec::new(),
            pending_promotion: None,
            orientation: PlayerColor::White,
            snapshots: Observable::state(snapshot),
            moves: Observable::events(),
            undone: Observable::events(),
        }
    }

    pub fn snapshots(&self) -> Observable<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Committed moves, one event each.
    pub fn moves(&self) -> Observable<MoveCommitted> {
        self.moves.clone()
    }

    /// Moves taken back by `undo`, one event each.
    pub fn undone(&self) -> Observable<AppliedMove> {
        self.undone.clone()
    }

    pub fn position(&self) -> String {
        self.rules.serialize_position()
    }

    pub fn turn(&self) -> PlayerColor {
        self.rules.turn().into()
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn history(&self) -> &[AppliedMove] {
        &self.move_history
    }

    pub fn redo_stack(&self) -> &[AppliedMove] {
        &self.redo_stack
    }

    pub fn pending_promotion(&self) -> Option<PendingPromotion> {
        self.pending_promotion
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            position: self.rules.serialize_position(),
            turn: self.turn(),
            status: self.status,
            pending_promotion: self.pending_promotion,
            can_undo: !self.move_history.is_empty(),
            can_redo: !self.redo_stack.is_empty(),
            move_count: self.move_history.len(),
            last_move: self.move_history.last().copied(),
            orientation: self.orientation,
        }
    }

    /// Play a local move. A pawn reaching the last rank is probed as a queen
    /// promotion, rolled back, and parked as a pending promotion.
    pub fn apply_move(&mut self, from: &str, to: &str) -> Result<MoveOutcome, MoveError> {
        let from = parse_square(from)?;
        let to = parse_square(to)?;
        self.ensure_playable()?;

        let mover = self.rules.turn();
        let probe = self.rules.apply_move(from, to, Some(Piece::Queen))?;

        if probe.piece == Piece::Pawn && is_last_rank(probe.to, mover) {
            // The queen probe must never become visible
            if self.rules.undo().is_none() {
                warn!("Rules engine had nothing to roll back after promotion probe");
            }
            let pending = PendingPromotion {
                from,
                to,
                color: mover.into(),
            };
            info!("Promotion pending on {}{}", from, to);
            self.pending_promotion = Some(pending);
            self.publish_snapshot();
            return Ok(MoveOutcome::PromotionPending(pending));
        }

        if let Some(stale) = self.pending_promotion.take() {
            debug!("Discarding pending promotion {}{}", stale.from, stale.to);
        }
        self.commit(probe, MoveOrigin::Local);
        Ok(MoveOutcome::Committed(probe))
    }

    /// Complete the pending promotion with the chosen piece.
    pub fn resolve_promotion(&mut self, piece: PromotionPiece) -> Result<AppliedMove, MoveError> {
        let pending = self
            .pending_promotion
            .take()
            .ok_or(MoveError::NoPendingPromotion)?;

        match self
            .rules
            .apply_move(pending.from, pending.to, Some(piece.into()))
        {
            Ok(mv) => {
                self.commit(mv, MoveOrigin::Local);
                Ok(mv)
            }
            Err(e) => {
                warn!("Invalid promotion: {}", e);
                self.publish_snapshot();
                Err(e.into())
            }
        }
    }

    /// Drop a pending promotion without playing it.
    pub fn cancel_promotion(&mut self) -> bool {
        if self.pending_promotion.take().is_some() {
            self.publish_snapshot();
            true
        } else {
            false
        }
    }

    /// Apply a move received from the opponent. The peer has validated it,
    /// but it still goes through the rules engine.
    pub fn apply_remote_move(&mut self, mv: &WireMove) -> Result<AppliedMove, MoveError> {
        let from = parse_square(&mv.from)?;
        let to = parse_square(&mv.to)?;
        self.ensure_playable()?;

        let promotion = mv.promotion.unwrap_or(PromotionPiece::Queen);
        let applied = self.rules.apply_move(from, to, Some(promotion.into()))?;

        self.pending_promotion = None;
        self.commit(applied, MoveOrigin::Remote);
        Ok(applied)
    }

    pub fn undo(&mut self) -> Result<AppliedMove, MoveError> {
        if self.move_history.is_empty() {
            return Err(MoveError::NothingToUndo);
        }
        self.rules.undo().ok_or(MoveError::NothingToUndo)?;

        let mv = self.move_history.pop().ok_or(MoveError::NothingToUndo)?;
        self.redo_stack.push(mv);
        self.pending_promotion = None;
        self.refresh_status();
        self.publish_snapshot();
        self.undone.publish(mv);
        info!("Undid {}", mv);
        Ok(mv)
    }

    pub fn redo(&mut self) -> Result<AppliedMove, MoveError> {
        let next = *self.redo_stack.last().ok_or(MoveError::NothingToRedo)?;
        let mv = self.rules.apply_move(next.from, next.to, next.promotion)?;

        self.redo_stack.pop();
        self.pending_promotion = None;
        self.commit(mv, MoveOrigin::Redo);
        Ok(mv)
    }

    pub fn start_new_game(&mut self) {
        self.rules.new_game();
        self.move_history.clear();
        self.redo_stack.clear();
        self.pending_promotion = None;
        self.refresh_status();
        self.publish_snapshot();
        info!("New game started");
    }

    pub fn flip_board(&mut self) -> PlayerColor {
        self.set_orientation(self.orientation.opposite());
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: PlayerColor) {
        if self.orientation != orientation {
            self.orientation = orientation;
            self.publish_snapshot();
        }
    }

    fn ensure_playable(&self) -> Result<(), MoveError> {
        if self.status.is_terminal() {
            Err(MoveError::GameOver)
        } else {
            Ok(())
        }
    }

    fn commit(&mut self, mv: AppliedMove, origin: MoveOrigin) {
        self.move_history.push(mv);
        if origin != MoveOrigin::Redo {
            self.redo_stack.clear();
        }
        self.refresh_status();
        info!("Applied {:?} move {} ({})", origin, mv, self.status);

        self.publish_snapshot();
        self.moves.publish(MoveCommitted {
            mv,
            origin,
            position: self.rules.serialize_position(),
        });
    }

    fn refresh_status(&mut self) {
        self.status = derive_status(&self.rules);
    }

    fn publish_snapshot(&self) {
        self.snapshots.publish(self.snapshot());
    }
}

fn derive_status<R: RulesEngine>(rules: &R) -> GameStatus {
    if rules.is_checkmate() {
        GameStatus::Checkmate
    } else if rules.is_draw() {
        GameStatus::Draw
    } else if rules.is_check() {
        GameStatus::Check
    } else {
        GameStatus::Active
    }
}
