pub mod actor;
pub mod rules;
pub mod session;
pub mod utils;

pub use actor::*;
pub use rules::{ChessRules, RulesEngine};
pub use session::{MoveOutcome, Session};
