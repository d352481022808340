use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::foundation::error::{OrrbError, OrrbResult};

/// Wake-up tuning for [`WorkQueue::dequeue_blocking`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct QueueOpts {
    /// Immediate re-checks, each followed by a thread yield, before parking.
    pub spin_checks: u32,
    /// Upper bound on one parked wait, in milliseconds. The wait is repeated until an item
    /// arrives or the queue is closed.
    pub idle_wait_ms: u64,
}

impl Default for QueueOpts {
    fn default() -> Self {
        Self {
            spin_checks: 8,
            idle_wait_ms: 10,
        }
    }
}

impl QueueOpts {
    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms.max(1))
    }
}

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Unbounded multi-producer FIFO with a blocking consumer side.
///
/// Producers hold the lock only to push. Consumers spin briefly and then park on a condition
/// variable. After [`WorkQueue::close`] producers are rejected and consumers drain what is left.
pub struct WorkQueue<T> {
    inner: Mutex<Inner<T>>,
    ready: Condvar,
    opts: QueueOpts,
}

impl<T> WorkQueue<T> {
    pub fn new(opts: QueueOpts) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                closed: false,
            }),
            ready: Condvar::new(),
            opts,
        }
    }

    /// Append `item` and wake one consumer.
    pub fn enqueue(&self, item: T) -> OrrbResult<()> {
        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Err(OrrbError::shutdown("queue is closed"));
            }
            inner.items.push_back(item);
        }
        self.ready.notify_one();
        Ok(())
    }

    /// Remove the oldest item without blocking.
    pub fn try_dequeue(&self) -> Option<T> {
        self.inner.lock().items.pop_front()
    }

    /// Remove the oldest item, blocking while the queue is empty.
    ///
    /// Returns `None` only once the queue is closed and drained.
    pub fn dequeue_blocking(&self) -> Option<T> {
        for _ in 0..self.opts.spin_checks {
            {
                let mut inner = self.inner.lock();
                if let Some(item) = inner.items.pop_front() {
                    return Some(item);
                }
                if inner.closed {
                    return None;
                }
            }
            std::thread::yield_now();
        }

        let wait = self.opts.idle_wait();
        let mut inner = self.inner.lock();
        loop {
            if let Some(item) = inner.items.pop_front() {
                return Some(item);
            }
            if inner.closed {
                return None;
            }
            self.ready.wait_for(&mut inner, wait);
        }
    }

    /// Reject further producers and wake every consumer.
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new(QueueOpts::default())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/queue.rs"]
mod tests;
