//! Low-level RCON client: one TCP stream, one exchange in flight at a time.

use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::{RconError, Result};
use crate::protocol::{self, PacketType};

/// Raw RCON protocol client.
///
/// Owns a single TCP connection and the per-exchange correlation state.
/// Request/response pairing is strictly sequential: the `&mut self` receiver
/// on [`send_command`](Self::send_command) guarantees a second command cannot
/// be written before the previous response has been read. Shared callers
/// serialize through the `tokio::sync::Mutex` held by
/// [`RconConnection`](crate::connection::RconConnection).
///
/// All async methods are cancel-safe in the cooperative sense: dropping an
/// in-flight future aborts the underlying I/O.
pub struct RconClient {
    stream: Option<TcpStream>,
    next_request_id: i32,
    authenticated: bool,
}

impl RconClient {
    pub fn new() -> Self {
        Self {
            stream: None,
            next_request_id: 1,
            authenticated: false,
        }
    }

    /// Whether the client is usable for commands. A bare TCP connect does
    /// not count; only a successful [`authenticate`](Self::authenticate)
    /// promotes the client.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some() && self.authenticated
    }

    /// Opens the TCP transport. Does not authenticate.
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        let stream = TcpStream::connect((host, port)).await.map_err(|source| {
            RconError::ConnectFailed {
                host: host.to_string(),
                port,
                source,
            }
        })?;
        debug!(host, port, "TCP connection established");
        self.stream = Some(stream);
        Ok(())
    }

    /// Authenticates with the server password.
    ///
    /// Success is signaled by a response echoing the request id; the server
    /// answers with id `-1` when the password is rejected. On rejection the
    /// socket stays open but the client remains unusable; callers wanting to
    /// retry must build a fresh client.
    pub async fn authenticate(&mut self, password: &str) -> Result<bool> {
        let request_id = self.next_request_id();
        let stream = self.stream.as_mut().ok_or(RconError::NotAuthenticated)?;

        protocol::write_packet(stream, request_id, PacketType::Login, password).await?;
        let response = protocol::read_packet(stream).await?;

        self.authenticated = response.request_id == request_id;
        if self.authenticated {
            debug!("RCON authentication succeeded");
        } else {
            warn!(
                response_id = response.request_id,
                "RCON authentication rejected"
            );
        }
        Ok(self.authenticated)
    }

    /// Sends one command and returns the server's response payload verbatim.
    ///
    /// Reads exactly one response packet. Long responses that real servers
    /// fragment across several packets sharing one request id are not
    /// reassembled here; see DESIGN.md for the open question.
    pub async fn send_command(&mut self, command: &str) -> Result<String> {
        if !self.authenticated {
            return Err(RconError::NotAuthenticated);
        }
        let request_id = self.next_request_id();
        let stream = self.stream.as_mut().ok_or(RconError::NotAuthenticated)?;

        protocol::write_packet(stream, request_id, PacketType::Command, command).await?;
        let response = protocol::read_packet(stream).await?;

        if response.request_id != request_id {
            warn!(
                expected = request_id,
                received = response.request_id,
                "response id does not match request id"
            );
        }
        Ok(response.payload)
    }

    /// Closes the transport. Subsequent sends fail with
    /// [`RconError::NotAuthenticated`] rather than hanging.
    pub fn close(&mut self) {
        self.authenticated = false;
        self.stream = None;
    }

    fn next_request_id(&mut self) -> i32 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }
}

impl Default for RconClient {
    fn default() -> Self {
        Self::new()
    }
}
