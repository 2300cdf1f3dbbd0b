//! Priority-based, rate-limited command dispatch.
//!
//! This is the layer application code actually calls. Per command it applies
//! duplicate suppression, routes by priority through a shared token bucket,
//! and drains a bounded low-priority queue from one background task.

pub mod limiter;
pub mod queue;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::connection::RconConnection;
use crate::error::{RconError, Result};
pub use limiter::TokenBucket;
pub use queue::{BoundedQueue, PushOutcome};

/// Fixed backoff used by the Normal path (once) and the queue drain loop
/// (repeatedly) when no token is available.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_millis(100);

/// How long shutdown waits for the drain task before detaching it.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Last-sent registry size above which stale entries are pruned.
const LAST_SENT_PRUNE_THRESHOLD: usize = 1024;

/// Priority attached to an outgoing command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    /// Bulk traffic. Queued for later when the rate limit is hit; the caller
    /// gets an empty string back, meaning "accepted for best-effort
    /// delivery", never success or failure.
    Low,
    /// Default. Waits one short backoff when rate-limited, then sends anyway.
    #[default]
    Normal,
    /// Latency-sensitive traffic. Bypasses the rate limiter entirely.
    High,
}

/// Hook invoked with the elapsed round-trip time after every physically-sent
/// command. Never invoked for suppressed or queued-without-send calls.
pub type CommandObserver = Arc<dyn Fn(Duration) + Send + Sync>;

struct DispatchInner {
    connection: RconConnection,
    bucket: Mutex<TokenBucket>,
    last_sent: Mutex<HashMap<String, Instant>>,
    queue: BoundedQueue<String>,
    min_interval: Duration,
    shutdown: AtomicBool,
    observer: Option<CommandObserver>,
}

impl DispatchInner {
    fn try_acquire_token(&self) -> bool {
        self.bucket
            .lock()
            .expect("token bucket mutex poisoned")
            .try_acquire()
    }

    /// True when an identical command went out (or was queued) within the
    /// configured minimum interval. Checking does not refresh the timestamp;
    /// otherwise a steady stream of duplicates would never send again.
    fn is_duplicate(&self, command: &str) -> bool {
        if self.min_interval.is_zero() {
            return false;
        }
        let registry = self.last_sent.lock().expect("last-sent mutex poisoned");
        registry
            .get(command)
            .is_some_and(|sent| sent.elapsed() < self.min_interval)
    }

    /// Stamps the registry for this command. Called on every real send and
    /// on every enqueue. Entries are never individually expired; stale ones
    /// are pruned in bulk once the map grows past a threshold.
    fn record_sent(&self, command: &str) {
        if self.min_interval.is_zero() {
            return;
        }
        let mut registry = self.last_sent.lock().expect("last-sent mutex poisoned");
        if registry.len() >= LAST_SENT_PRUNE_THRESHOLD {
            let min_interval = self.min_interval;
            registry.retain(|_, sent| sent.elapsed() < min_interval);
        }
        registry.insert(command.to_string(), Instant::now());
    }

    /// The one path every physical send goes through: stamp the registry,
    /// send over the resilient connection, report the round trip.
    async fn execute(&self, command: &str) -> Result<String> {
        self.record_sent(command);
        let started = Instant::now();
        let response = self.connection.send_command(command).await?;
        if let Some(observer) = &self.observer {
            observer(started.elapsed());
        }
        Ok(response)
    }
}

/// Rate-limited, deduplicating RCON command dispatcher.
///
/// Owns the token bucket, the duplicate-suppression registry, and the
/// bounded low-priority queue. The underlying connection is established
/// lazily on the first send. Must be constructed inside a Tokio runtime
/// (the queue drain task is spawned at construction).
pub struct RconDispatcher {
    inner: Arc<DispatchInner>,
    drain: Mutex<Option<JoinHandle<()>>>,
}

impl RconDispatcher {
    pub fn new(config: RelayConfig) -> Self {
        Self::with_observer(config, None)
    }

    /// Builds a dispatcher with a round-trip observer hook.
    pub fn with_observer(config: RelayConfig, observer: Option<CommandObserver>) -> Self {
        let inner = Arc::new(DispatchInner {
            connection: RconConnection::new(&config.host, config.port, &config.password)
                .with_retry_limit(config.connect_attempts),
            bucket: Mutex::new(TokenBucket::new(config.max_commands_per_second)),
            last_sent: Mutex::new(HashMap::new()),
            queue: BoundedQueue::new(config.queue_capacity),
            min_interval: config.min_command_interval(),
            shutdown: AtomicBool::new(false),
            observer,
        });
        let drain = tokio::spawn(drain_loop(Arc::clone(&inner)));
        Self {
            inner,
            drain: Mutex::new(Some(drain)),
        }
    }

    /// Advisory connection state; see
    /// [`RconConnection::is_connected`](crate::connection::RconConnection::is_connected).
    pub fn is_connected(&self) -> bool {
        self.inner.connection.is_connected()
    }

    /// Number of low-priority commands waiting in the queue.
    pub fn pending(&self) -> usize {
        self.inner.queue.len()
    }

    /// Sends a command at [`Priority::Normal`].
    pub async fn send_command(&self, command: &str) -> Result<String> {
        self.send_with_priority(command, Priority::Normal).await
    }

    /// Sends a command at the given priority.
    ///
    /// High and Normal sends surface connection and protocol errors to the
    /// caller. A Low send that gets queued returns `Ok("")` immediately;
    /// its eventual failure is only logged.
    pub async fn send_with_priority(&self, command: &str, priority: Priority) -> Result<String> {
        let inner = &self.inner;
        if inner.shutdown.load(Ordering::Acquire) {
            return Err(RconError::Cancelled);
        }
        if inner.is_duplicate(command) {
            debug!(command, "suppressed duplicate command");
            return Ok(String::new());
        }

        match priority {
            Priority::High => inner.execute(command).await,
            Priority::Normal => {
                if !inner.try_acquire_token() {
                    // Soft limit: one fixed wait, then send regardless.
                    debug!(command, "rate limit reached, backing off once");
                    tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
                }
                inner.execute(command).await
            }
            Priority::Low => {
                if inner.try_acquire_token() {
                    inner.execute(command).await
                } else {
                    // Throttled attempts stamp the registry too, so a burst
                    // of identical low-priority commands collapses.
                    inner.record_sent(command);
                    match inner.queue.push(command.to_string()) {
                        PushOutcome::Accepted => {
                            debug!(command, "queued low-priority command");
                        }
                        PushOutcome::Displaced(dropped) => {
                            warn!(dropped = %dropped, "queue full, dropped oldest pending command");
                        }
                        PushOutcome::Closed(_) => return Err(RconError::Cancelled),
                    }
                    Ok(String::new())
                }
            }
        }
    }

    /// Graceful shutdown: stop accepting queue entries, stop the drain task
    /// (bounded wait), discard whatever is still queued, close the
    /// connection. Sends after shutdown fail with [`RconError::Cancelled`].
    pub async fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Release);
        self.inner.queue.close();

        let handle = self
            .drain
            .lock()
            .expect("drain handle mutex poisoned")
            .take();
        if let Some(handle) = handle {
            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(error = %err, "drain task ended abnormally"),
                Err(_) => warn!("drain task did not stop within the grace period"),
            }
        }

        self.inner.connection.close().await;
        info!("dispatcher shut down");
    }
}

/// Long-lived consumer of the low-priority queue.
///
/// Blocks only on queue entries and token availability. A queued command
/// that fails is reported and dropped; the drain loop never dies with it.
async fn drain_loop(inner: Arc<DispatchInner>) {
    while let Some(command) = inner.queue.pop().await {
        loop {
            if inner.shutdown.load(Ordering::Acquire) {
                return;
            }
            if inner.try_acquire_token() {
                break;
            }
            tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
        }

        // No duplicate re-check here: the enqueue already stamped the
        // registry, so the command would suppress itself. Stamping again on
        // the physical send happens inside execute.
        if let Err(err) = inner.execute(&command).await {
            warn!(command = %command, error = %err, "queued command failed");
        }
    }
}
