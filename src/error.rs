//! Error taxonomy for the RCON transport and dispatch stack.

use std::io;
use thiserror::Error;

/// Errors surfaced by the RCON client, connection, and dispatcher layers.
#[derive(Error, Debug)]
pub enum RconError {
    /// The TCP connection to the server could not be established.
    #[error("failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        source: io::Error,
    },

    /// The server rejected the RCON password. Retrying with the same
    /// credentials will not succeed.
    #[error("RCON authentication rejected by server")]
    AuthenticationFailed,

    /// A command was sent before a successful connect + authenticate, or
    /// after the client was closed.
    #[error("not connected or not authenticated")]
    NotAuthenticated,

    /// The remote end produced a frame that violates the RCON framing rules.
    /// The current connection is unusable; the next send reconnects.
    #[error("malformed RCON packet: {reason}")]
    MalformedPacket { reason: String },

    /// The operation was interrupted by shutdown. Cooperative, not a fault.
    #[error("operation cancelled")]
    Cancelled,

    /// Transport-level I/O failure on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, RconError>;
