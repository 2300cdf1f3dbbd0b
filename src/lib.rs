pub mod cli;
pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod parser;
pub mod protocol;

// Re-export key types for easy consumption
pub use client::RconClient;
pub use config::RelayConfig;
pub use connection::RconConnection;
pub use dispatch::{CommandObserver, Priority, RconDispatcher};
pub use error::{RconError, Result};
pub use protocol::{Packet, PacketType};
