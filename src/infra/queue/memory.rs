//! Bounded in-memory FIFO with drop-on-full enqueue and blocking, closable dequeue.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error};

use crate::core::dispatch::PaymentDispatch;
use crate::core::error::DispatchError;
use crate::core::expense::PaymentJob;

/// Why an item was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The queue was at capacity.
    Full,
    /// The queue had been closed.
    Closed,
}

/// An item handed back by [`BoundedQueue::try_push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected<T> {
    /// Why it was refused.
    pub reason: RejectReason,
    /// The refused item, returned to the caller.
    pub item: T,
}

/// Result of waiting on the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pop<T> {
    /// Next item in FIFO order.
    Item(T),
    /// Nothing arrived before the timeout.
    TimedOut,
    /// The queue is closed and fully drained.
    Closed,
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Capacity-bounded multi-producer/multi-consumer FIFO.
///
/// Every accepted item is handed to exactly one consumer. Producers never
/// block: a push into a full queue is refused and the item returned.
pub struct BoundedQueue<T> {
    capacity: usize,
    state: Mutex<QueueState<T>>,
    available: Condvar,
    accepted: AtomicU64,
    dropped: AtomicU64,
}

/// The payment job queue.
pub type PaymentQueue = BoundedQueue<PaymentJob>;

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.min(1024)),
                closed: false,
            }),
            available: Condvar::new(),
            accepted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Append an item if there is room and the queue is open.
    ///
    /// # Errors
    ///
    /// Returns the item inside [`Rejected`] when the queue is full or closed.
    pub fn try_push(&self, item: T) -> Result<(), Rejected<T>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Rejected {
                reason: RejectReason::Closed,
                item,
            });
        }
        if state.items.len() >= self.capacity {
            drop(state);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(Rejected {
                reason: RejectReason::Full,
                item,
            });
        }
        state.items.push_back(item);
        drop(state);
        self.accepted.fetch_add(1, Ordering::Relaxed);
        self.available.notify_one();
        Ok(())
    }

    /// Take the oldest item, waiting up to `timeout` for one to arrive.
    ///
    /// Items still queued after [`close`](Self::close) are handed out until the
    /// queue is empty; only then is [`Pop::Closed`] returned.
    pub fn pop_timeout(&self, timeout: Duration) -> Pop<T> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Pop::Item(item);
            }
            if state.closed {
                return Pop::Closed;
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return state.items.pop_front().map_or_else(
                    || if state.closed { Pop::Closed } else { Pop::TimedOut },
                    Pop::Item,
                );
            }
        }
    }

    /// Take the oldest item without waiting.
    pub fn try_pop(&self) -> Option<T> {
        self.state.lock().items.pop_front()
    }

    /// Stop accepting items and wake every waiting consumer.
    ///
    /// Returns `true` on the call that actually closed the queue.
    pub fn close(&self) -> bool {
        let mut state = self.state.lock();
        let first = !state.closed;
        state.closed = true;
        drop(state);
        self.available.notify_all();
        first
    }

    /// Remove and return everything still queued.
    pub fn drain(&self) -> Vec<T> {
        self.state.lock().items.drain(..).collect()
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Maximum number of queued items.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items ever accepted.
    #[must_use]
    pub fn accepted_count(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Items refused because the queue was full.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl PaymentDispatch for BoundedQueue<PaymentJob> {
    fn dispatch(&self, job: PaymentJob) -> Result<(), DispatchError> {
        let expense_id = job.expense_id;
        match self.try_push(job) {
            Ok(()) => {
                debug!(expense_id, "Payment job queued");
                Ok(())
            }
            Err(Rejected {
                reason: RejectReason::Full,
                ..
            }) => {
                error!(expense_id, capacity = self.capacity, "Payment queue full, job dropped");
                Err(DispatchError::QueueFull {
                    expense_id,
                    capacity: self.capacity,
                })
            }
            Err(Rejected {
                reason: RejectReason::Closed,
                ..
            }) => {
                error!(expense_id, "Payment queue closed, job rejected");
                Err(DispatchError::QueueClosed { expense_id })
            }
        }
    }
}
