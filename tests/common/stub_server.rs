//! In-process TCP server speaking the RCON protocol.
//!
//! Accepts connections, answers the auth handshake, records every command
//! it receives with a receipt timestamp, and replies with configurable
//! payloads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use super::frames::{self, TYPE_COMMAND, TYPE_LOGIN, TYPE_RESPONSE};

#[derive(Default)]
struct StubState {
    reject_auth: bool,
    /// When set, the connection is closed after serving this many commands.
    commands_per_connection: Option<usize>,
    responses: Mutex<HashMap<String, String>>,
    received: Mutex<Vec<(String, Instant)>>,
    auth_count: AtomicUsize,
}

pub struct StubRconServer {
    port: u16,
    state: Arc<StubState>,
    accept_task: JoinHandle<()>,
}

impl StubRconServer {
    /// Starts a stub that accepts any password.
    pub async fn start() -> Self {
        Self::start_with(StubState::default()).await
    }

    /// Starts a stub that answers every auth packet with request id `-1`.
    pub async fn start_rejecting_auth() -> Self {
        Self::start_with(StubState {
            reject_auth: true,
            ..StubState::default()
        })
        .await
    }

    /// Starts a stub that drops each connection after `limit` commands,
    /// forcing clients to reconnect.
    pub async fn start_dropping_after(limit: usize) -> Self {
        Self::start_with(StubState {
            commands_per_connection: Some(limit),
            ..StubState::default()
        })
        .await
    }

    async fn start_with(state: StubState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub server");
        let port = listener.local_addr().expect("stub local addr").port();
        let state = Arc::new(state);

        let accept_state = Arc::clone(&state);
        let accept_task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let state = Arc::clone(&accept_state);
                tokio::spawn(handle_client(stream, state));
            }
        });

        Self {
            port,
            state,
            accept_task,
        }
    }

    pub fn host(&self) -> &'static str {
        "127.0.0.1"
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Sets the payload returned for an exact command string. Commands
    /// without an entry get an empty response.
    pub fn set_response(&self, command: &str, payload: &str) {
        self.state
            .responses
            .lock()
            .expect("responses lock")
            .insert(command.to_string(), payload.to_string());
    }

    pub fn received_commands(&self) -> Vec<String> {
        self.state
            .received
            .lock()
            .expect("received lock")
            .iter()
            .map(|(command, _)| command.clone())
            .collect()
    }

    pub fn receipt_times(&self) -> Vec<Instant> {
        self.state
            .received
            .lock()
            .expect("received lock")
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }

    /// Number of auth handshakes the stub has answered.
    pub fn auth_count(&self) -> usize {
        self.state.auth_count.load(Ordering::SeqCst)
    }
}

impl Drop for StubRconServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn handle_client(mut stream: TcpStream, state: Arc<StubState>) {
    let mut commands_served = 0;
    loop {
        let Some((request_id, packet_type, payload)) = frames::read_frame(&mut stream).await else {
            break;
        };
        match packet_type {
            TYPE_LOGIN => {
                if state.reject_auth {
                    frames::write_frame(&mut stream, -1, TYPE_COMMAND, "").await;
                } else {
                    state.auth_count.fetch_add(1, Ordering::SeqCst);
                    frames::write_frame(&mut stream, request_id, TYPE_COMMAND, "").await;
                }
            }
            TYPE_COMMAND => {
                let response = {
                    let mut received = state.received.lock().expect("received lock");
                    received.push((payload.clone(), Instant::now()));
                    state
                        .responses
                        .lock()
                        .expect("responses lock")
                        .get(&payload)
                        .cloned()
                        .unwrap_or_default()
                };
                frames::write_frame(&mut stream, request_id, TYPE_RESPONSE, &response).await;

                commands_served += 1;
                if state
                    .commands_per_connection
                    .is_some_and(|limit| commands_served >= limit)
                {
                    break;
                }
            }
            _ => break,
        }
    }
}
