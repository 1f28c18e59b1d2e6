//! In-process record of payment jobs that will not be paid without intervention.
//!
//! Letters live in memory only and are lost on restart; they exist so that
//! dropped or failed jobs can be inspected and reconciled instead of surviving
//! only as a log line.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::core::expense::PaymentJob;
use crate::util::clock::now_ms;

/// Why a job was dead-lettered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadLetterReason {
    /// Enqueue found the queue at capacity.
    QueueFull,
    /// Enqueue happened after the queue was closed.
    QueueClosed,
    /// Every attempt failed.
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// Error of the final attempt.
        last_error: String,
    },
    /// The expense could not be read before paying.
    LookupFailed {
        /// Repository error.
        error: String,
    },
    /// The gateway settled the payment but the expense could not be updated.
    RecordFailed {
        /// Gateway payment id, when one was issued.
        payment_id: Option<String>,
        /// Repository error.
        error: String,
    },
    /// Still queued when the pool was stopped.
    Abandoned,
}

/// A job that needs manual reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    /// The job as it was enqueued.
    pub job: PaymentJob,
    /// Why it was set aside.
    pub reason: DeadLetterReason,
    /// Time recorded, milliseconds since epoch.
    pub recorded_at_ms: u128,
}

impl DeadLetter {
    /// Create a letter stamped with the current time.
    #[must_use]
    pub fn new(job: PaymentJob, reason: DeadLetterReason) -> Self {
        Self {
            job,
            reason,
            recorded_at_ms: now_ms(),
        }
    }
}

/// Destination for dead letters.
pub trait DeadLetterSink: Send + Sync {
    /// Record a letter.
    fn record(&self, letter: DeadLetter);
}

/// Bounded in-memory dead-letter buffer; the oldest letter is evicted when full.
pub struct InMemoryDeadLetters {
    letters: Mutex<VecDeque<DeadLetter>>,
    max_letters: usize,
}

impl InMemoryDeadLetters {
    /// Create a buffer holding at most `max_letters`.
    #[must_use]
    pub fn new(max_letters: usize) -> Self {
        Self {
            letters: Mutex::new(VecDeque::new()),
            max_letters,
        }
    }

    /// Snapshot of stored letters, oldest first.
    #[must_use]
    pub fn letters(&self) -> Vec<DeadLetter> {
        self.letters.lock().iter().cloned().collect()
    }

    /// Number of stored letters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.letters.lock().len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.letters.lock().is_empty()
    }
}

impl DeadLetterSink for InMemoryDeadLetters {
    fn record(&self, letter: DeadLetter) {
        let mut letters = self.letters.lock();
        if letters.len() >= self.max_letters {
            letters.pop_front();
        }
        letters.push_back(letter);
    }
}
