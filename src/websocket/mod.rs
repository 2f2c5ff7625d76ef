pub mod client;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::*;
pub use transport::{AwcConnector, Connection, Connector, InboundFrame, OutboundFrame};
