//! Resilient RCON connection: reconnect-on-demand with backoff.
//!
//! Wraps [`RconClient`] behind a stable send surface. Connection lifecycle
//! (connect, authenticate, teardown, retry) lives here; protocol semantics
//! do not change.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::client::RconClient;
use crate::error::{RconError, Result};

/// Backoff ladder between failed connection attempts.
const BACKOFF_DELAYS: [Duration; 5] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(5),
    Duration::from_secs(10),
    Duration::from_secs(30),
];

/// Default number of connect + authenticate attempts per send.
const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Managed RCON connection with transparent reconnect.
///
/// The inner client is created lazily on the first send and re-created
/// whenever the transport dies. All callers serialize through one mutex, so
/// the single-exchange invariant of [`RconClient`] holds across tasks.
pub struct RconConnection {
    host: String,
    port: u16,
    password: String,
    max_attempts: usize,
    client: Mutex<Option<RconClient>>,
    connected: AtomicBool,
}

impl RconConnection {
    pub fn new(host: &str, port: u16, password: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            password: password.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            client: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    /// Caps the number of connect attempts per send. Mostly useful for tests
    /// and one-shot tools that want fast failure instead of the backoff
    /// ladder.
    pub fn with_retry_limit(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Advisory snapshot of the last known handshake. A send may still find
    /// the connection dead and re-establish it.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Sends a command, connecting and authenticating first if needed.
    ///
    /// A transport error on an established connection tears the client down
    /// and retries exactly once over a fresh connection. Authentication
    /// rejection is surfaced immediately as
    /// [`RconError::AuthenticationFailed`]; credentials do not become valid
    /// by retrying.
    pub async fn send_command(&self, command: &str) -> Result<String> {
        let mut guard = self.client.lock().await;
        self.ensure_connected(&mut guard).await?;

        let client = guard.as_mut().ok_or(RconError::NotAuthenticated)?;
        match client.send_command(command).await {
            Ok(response) => Ok(response),
            Err(RconError::Io(err)) => {
                warn!(error = %err, "RCON connection lost, reconnecting");
                *guard = None;
                self.connected.store(false, Ordering::Release);

                self.ensure_connected(&mut guard).await?;
                let client = guard.as_mut().ok_or(RconError::NotAuthenticated)?;
                client.send_command(command).await
            }
            Err(err @ RconError::MalformedPacket { .. }) => {
                // Protocol violation is fatal to this connection; the next
                // send goes through a fresh handshake.
                warn!(error = %err, "malformed packet from server, dropping connection");
                *guard = None;
                self.connected.store(false, Ordering::Release);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Drops the owned client. Safe to call when never connected.
    pub async fn close(&self) {
        let mut guard = self.client.lock().await;
        if let Some(client) = guard.as_mut() {
            client.close();
        }
        *guard = None;
        self.connected.store(false, Ordering::Release);
    }

    async fn ensure_connected(&self, guard: &mut Option<RconClient>) -> Result<()> {
        if guard.as_ref().is_some_and(|c| c.is_connected()) {
            return Ok(());
        }
        *guard = None;
        self.connected.store(false, Ordering::Release);

        let mut last_error = None;
        for attempt in 0..self.max_attempts {
            match self.try_handshake().await {
                Ok(client) => {
                    info!(host = %self.host, port = self.port, "RCON connected");
                    *guard = Some(client);
                    self.connected.store(true, Ordering::Release);
                    return Ok(());
                }
                Err(err @ RconError::AuthenticationFailed) => return Err(err),
                Err(err) => {
                    let delay = BACKOFF_DELAYS[attempt.min(BACKOFF_DELAYS.len() - 1)];
                    warn!(
                        attempt = attempt + 1,
                        error = %err,
                        "RCON connection attempt failed"
                    );
                    last_error = Some(err);
                    if attempt + 1 < self.max_attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        match last_error {
            Some(err) => Err(err),
            None => Err(RconError::NotAuthenticated),
        }
    }

    async fn try_handshake(&self) -> Result<RconClient> {
        let mut client = RconClient::new();
        client.connect(&self.host, self.port).await?;
        if client.authenticate(&self.password).await? {
            Ok(client)
        } else {
            Err(RconError::AuthenticationFailed)
        }
    }
}
