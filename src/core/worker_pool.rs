//! Payment worker pool with dedicated worker threads.
//!
//! A fixed set of workers drains the shared [`PaymentQueue`](crate::infra::PaymentQueue),
//! each running a [`JobHandler`](crate::core::JobHandler) on one job at a time.
//! The queue is the only state the workers share; every queued job reaches
//! exactly one worker.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use expense_dispatch::config::WorkerPoolConfig;
//! use expense_dispatch::core::PaymentWorkerPool;
//! use expense_dispatch::infra::PaymentQueue;
//!
//! let queue = Arc::new(PaymentQueue::new(100));
//! let pool = PaymentWorkerPool::start(
//!     WorkerPoolConfig::new().with_worker_count(5),
//!     Arc::clone(&queue),
//!     processor,
//! )?;
//!
//! // ... enqueue jobs through the queue ...
//!
//! let abandoned = pool.stop()?;
//! ```

mod native;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::retry::PaymentOutcome;

/// Errors that can occur when managing a worker pool.
#[derive(Debug)]
pub enum PoolError {
    /// Configuration validation failed.
    InvalidConfig(String),

    /// A worker thread could not be spawned.
    Spawn(String),

    /// The pool was already stopped.
    AlreadyStopped,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Spawn(msg) => write!(f, "failed to spawn worker: {msg}"),
            Self::AlreadyStopped => write!(f, "pool has already been stopped"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Statistics about pool activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Jobs currently being processed.
    pub active_jobs: u64,

    /// Jobs waiting in the queue.
    pub queued_jobs: usize,

    /// Jobs taken off the queue by workers.
    pub dispatched_jobs: u64,

    /// Jobs paid by the gateway.
    pub paid_jobs: u64,

    /// Jobs resolved through an idempotency conflict.
    pub already_processed_jobs: u64,

    /// Jobs whose expense was no longer payable.
    pub skipped_jobs: u64,

    /// Jobs that used up every attempt.
    pub exhausted_jobs: u64,

    /// Jobs that failed reading or recording the expense.
    pub failed_jobs: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_jobs: AtomicU64,
    pub dispatched_jobs: AtomicU64,
    pub paid_jobs: AtomicU64,
    pub already_processed_jobs: AtomicU64,
    pub skipped_jobs: AtomicU64,
    pub exhausted_jobs: AtomicU64,
    pub failed_jobs: AtomicU64,
}

impl PoolCounters {
    /// Count a finished job by outcome.
    pub fn record(&self, outcome: &PaymentOutcome) {
        let counter = match outcome {
            PaymentOutcome::Paid { .. } => &self.paid_jobs,
            PaymentOutcome::AlreadyProcessed { .. } => &self.already_processed_jobs,
            PaymentOutcome::Skipped { .. } => &self.skipped_jobs,
            PaymentOutcome::Exhausted { .. } => &self.exhausted_jobs,
            PaymentOutcome::LookupFailed { .. } | PaymentOutcome::RecordFailed { .. } => {
                &self.failed_jobs
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize, queued_jobs: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_jobs: self.active_jobs.load(Ordering::Relaxed),
            queued_jobs,
            dispatched_jobs: self.dispatched_jobs.load(Ordering::Relaxed),
            paid_jobs: self.paid_jobs.load(Ordering::Relaxed),
            already_processed_jobs: self.already_processed_jobs.load(Ordering::Relaxed),
            skipped_jobs: self.skipped_jobs.load(Ordering::Relaxed),
            exhausted_jobs: self.exhausted_jobs.load(Ordering::Relaxed),
            failed_jobs: self.failed_jobs.load(Ordering::Relaxed),
        }
    }
}

pub use native::PaymentWorkerPool;
