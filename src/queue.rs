use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use tracing::trace;

/// A multi-producer/multi-consumer FIFO queue with a one-shot close signal.
///
/// Guarded by a single mutex + condition variable, matching the producer /
/// consumer coordination the async engine needs: `push` never blocks beyond
/// the critical section, `pop` may block indefinitely until data arrives or
/// the queue is closed.
pub struct ConcurrentQueue<T> {
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
}

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> ConcurrentQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    /// Appends `value` to the tail. Silently dropped if the queue has
    /// already been closed, so producers never need to check closure before
    /// pushing and the shutdown path stays authoritative.
    pub fn push(&self, value: T) {
        let mut guard = self.inner.lock().unwrap();
        if guard.closed {
            trace!("push on closed queue dropped");
            return;
        }
        guard.items.push_back(value);
        drop(guard);
        self.not_empty.notify_one();
    }

    /// Blocks until the queue is non-empty or closed.
    ///
    /// Returns `Some(value)` after moving the head out, or `None` once the
    /// queue is empty and closed. Tolerates spurious wakeups.
    pub fn pop(&self) -> Option<T> {
        let mut guard = self.inner.lock().unwrap();
        loop {
            if let Some(value) = guard.items.pop_front() {
                return Some(value);
            }
            if guard.closed {
                return None;
            }
            guard = self.not_empty.wait(guard).unwrap();
        }
    }

    /// Non-blocking: returns `Some(value)` if the head was available right
    /// now, `None` otherwise (whether or not the queue is closed).
    pub fn try_pop(&self) -> Option<T> {
        let mut guard = self.inner.lock().unwrap();
        guard.items.pop_front()
    }

    /// Idempotent. Marks the queue closed and wakes every waiter; no new
    /// pushes are accepted afterwards. Already-enqueued values remain
    /// drainable via `pop`/`try_pop`.
    pub fn close(&self) {
        let mut guard = self.inner.lock().unwrap();
        if guard.closed {
            return;
        }
        guard.closed = true;
        drop(guard);
        self.not_empty.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
