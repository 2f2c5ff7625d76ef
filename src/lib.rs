//! Synchronisation core for a two-player chess session: the board state
//! machine, the link to a relay server and the game clock.

pub mod commands;
pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod observable;
pub mod relay;
pub mod table;
pub mod timer;
pub mod websocket;

pub use config::{ClientConfig, RelayConfig};
pub use table::GameTable;
