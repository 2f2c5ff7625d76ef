pub mod clock_state;
pub mod connection_state;
pub mod game_state;
pub mod messages;

// Re-export important types
pub use clock_state::*;
pub use connection_state::*;
pub use game_state::*;
pub use messages::*;
