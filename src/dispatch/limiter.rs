//! Lazily-refilled token bucket used to rate-limit outgoing commands.

use tokio::time::Instant;

/// Token bucket where capacity and refill rate are both "N per second".
///
/// Tokens are recomputed from elapsed wall-clock time at every acquire
/// attempt, capped at capacity, so no timer task is needed. Uses
/// `tokio::time::Instant` so tests can pause and advance the clock.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_second: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a bucket that starts full.
    pub fn new(per_second: u32) -> Self {
        let capacity = f64::from(per_second.max(1));
        Self {
            capacity,
            tokens: capacity,
            refill_per_second: capacity,
            last_refill: Instant::now(),
        }
    }

    /// Refill-then-consume as one step. Returns whether a token was taken.
    pub fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        self.last_refill = now;
        self.tokens =
            (self.tokens + elapsed.as_secs_f64() * self.refill_per_second).min(self.capacity);
    }
}
