//! Bounded multi-producer/single-consumer queue with drop-oldest overflow.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;

/// Outcome of pushing onto the queue.
#[derive(Debug, PartialEq, Eq)]
pub enum PushOutcome<T> {
    /// Item accepted with room to spare.
    Accepted,
    /// Item accepted; the oldest pending entry was evicted to make room.
    Displaced(T),
    /// The queue is closed; the item is handed back untouched.
    Closed(T),
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Bounded FIFO that favors recency: when full, the oldest entry is dropped
/// to admit the newest. Producers never block; the single consumer awaits
/// [`pop`](BoundedQueue::pop).
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    notify: Notify,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.max(1)),
                closed: false,
            }),
            notify: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, item: T) -> PushOutcome<T> {
        let displaced = {
            let mut state = self.state.lock().expect("queue mutex poisoned");
            if state.closed {
                return PushOutcome::Closed(item);
            }
            let displaced = if state.items.len() >= self.capacity {
                state.items.pop_front()
            } else {
                None
            };
            state.items.push_back(item);
            displaced
        };
        self.notify.notify_one();
        match displaced {
            Some(old) => PushOutcome::Displaced(old),
            None => PushOutcome::Accepted,
        }
    }

    /// Waits for the next entry. Returns `None` once the queue is closed.
    pub async fn pop(&self) -> Option<T> {
        loop {
            {
                let mut state = self.state.lock().expect("queue mutex poisoned");
                if let Some(item) = state.items.pop_front() {
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }
            // notify_one stores a permit when no-one is waiting, so a push
            // racing this gap still wakes us.
            self.notify.notified().await;
        }
    }

    /// Closes the queue and discards everything still pending.
    pub fn close(&self) {
        {
            let mut state = self.state.lock().expect("queue mutex poisoned");
            state.closed = true;
            state.items.clear();
        }
        self.notify.notify_one();
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("queue mutex poisoned").items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn overflow_evicts_oldest_never_newest() {
        let queue = BoundedQueue::new(2);
        assert_eq!(queue.push("a"), PushOutcome::Accepted);
        assert_eq!(queue.push("b"), PushOutcome::Accepted);
        assert_eq!(queue.push("c"), PushOutcome::Displaced("a"));
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn pop_returns_fifo_order() {
        let queue = BoundedQueue::new(4);
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.pop().await, Some(1));
        assert_eq!(queue.pop().await, Some(2));
        assert_eq!(queue.pop().await, Some(3));
    }

    #[tokio::test]
    async fn pop_wakes_on_push() {
        let queue = Arc::new(BoundedQueue::new(1));
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push("wake");
        let item = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item, Some("wake"));
    }

    #[tokio::test]
    async fn close_discards_pending_and_unblocks_consumer() {
        let queue = Arc::new(BoundedQueue::new(4));
        queue.push("doomed");
        queue.close();

        assert_eq!(queue.pop().await, None);
        assert!(queue.is_empty());
        assert_eq!(queue.push("late"), PushOutcome::Closed("late"));
    }
}
