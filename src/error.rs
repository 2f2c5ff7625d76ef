use thiserror::Error;

use crate::models::PlayerColor;

/// Rejections from the rules-engine collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("illegal move {from}{to}")]
    IllegalMove { from: String, to: String },

    #[error("invalid position: {0}")]
    InvalidPosition(String),
}

/// Local actions the session refuses. None of these mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("invalid square: {0}")]
    InvalidSquare(String),

    #[error("invalid promotion piece: {0}")]
    InvalidPromotion(String),

    #[error(transparent)]
    Illegal(#[from] RulesError),

    #[error("no promotion is pending")]
    NoPendingPromotion,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("game is already over")]
    GameOver,
}

/// Failures opening or using the socket to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("receive failed: {0}")]
    Receive(String),
}

/// Outbound messages that could not be handed to the socket.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("websocket is not connected")]
    NotConnected,

    #[error("not in a game")]
    NotInGame,

    #[error("failed to serialize message: {0}")]
    Serialize(String),
}

/// Requests the game table refuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("time control can only change before the first move")]
    GameInProgress,

    #[error("you play {seat}, it is {turn}'s move")]
    NotYourTurn { seat: PlayerColor, turn: PlayerColor },

    #[error(transparent)]
    Move(#[from] MoveError),

    #[error(transparent)]
    Send(#[from] SendError),

    #[error("actor mailbox is closed")]
    Mailbox,
}

impl From<actix::MailboxError> for TableError {
    fn from(_: actix::MailboxError) -> Self {
        TableError::Mailbox
    }
}

/// Relay-side refusals, reported back to the client as `error` messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Game not found")]
    GameNotFound,

    #[error("Game is full")]
    GameFull,

    #[error("Not seated in game {0}")]
    NotSeated(String),
}

/// Lines the terminal client cannot make sense of.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("{command} needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
