//! Thread-backed implementation of `PaymentWorkerPool`.
//!
//! Each worker is an OS thread with its own single-threaded tokio runtime.
//! Workers block on the queue with a bounded wait so that a raised
//! cancellation flag is observed at the next job boundary, never mid-job:
//! a job that has started runs to its terminal outcome, backoff sleeps included.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, info_span, warn};

use crate::config::WorkerPoolConfig;
use crate::core::expense::PaymentJob;
use crate::core::handler::JobHandler;
use crate::infra::queue::{PaymentQueue, Pop};

use super::{PoolCounters, PoolError, PoolStats};

/// Fixed-size pool of payment workers draining a shared queue.
pub struct PaymentWorkerPool<H>
where
    H: JobHandler,
{
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Shared job queue.
    queue: Arc<PaymentQueue>,

    /// Pool statistics counters (lock-free atomics).
    counters: Arc<PoolCounters>,

    /// Cancellation token observed by workers between jobs.
    cancelled: Arc<AtomicBool>,

    /// Set once `stop` or `drain_and_stop` has run.
    stopped: AtomicBool,

    /// Worker thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,

    _handler: PhantomData<H>,
}

impl<H> PaymentWorkerPool<H>
where
    H: JobHandler,
{
    /// Spawn `config.worker_count` workers draining `queue` with `handler`.
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidConfig` if the configuration is invalid
    /// - `PoolError::Spawn` if a worker thread could not be created; workers
    ///   already started are cancelled and joined first
    pub fn start(
        config: WorkerPoolConfig,
        queue: Arc<PaymentQueue>,
        handler: H,
    ) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let counters = Arc::new(PoolCounters::default());
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut workers = Vec::with_capacity(config.worker_count);

        for worker_id in 0..config.worker_count {
            let spawned = spawn_worker(
                worker_id,
                Arc::clone(&queue),
                Arc::clone(&counters),
                Arc::clone(&cancelled),
                handler.clone(),
                config.poll_interval,
                config.thread_stack_size,
            );
            match spawned {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    cancelled.store(true, Ordering::Release);
                    for worker in workers {
                        let _ = worker.join();
                    }
                    return Err(PoolError::Spawn(e.to_string()));
                }
            }
        }

        info!(
            worker_count = config.worker_count,
            queue_capacity = queue.capacity(),
            "Payment worker pool started"
        );

        Ok(Self {
            config,
            queue,
            counters,
            cancelled,
            stopped: AtomicBool::new(false),
            workers: Mutex::new(workers),
            _handler: PhantomData,
        })
    }

    /// Stop the pool.
    ///
    /// Raises the cancellation token, closes the queue so nothing new is
    /// accepted, and waits for every worker to finish its in-flight job.
    /// Jobs still queued are not processed; they are removed and returned so
    /// the caller can reconcile them.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::AlreadyStopped` on a second call.
    pub fn stop(&self) -> Result<Vec<PaymentJob>, PoolError> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Err(PoolError::AlreadyStopped);
        }

        info!("Stopping payment worker pool");
        self.cancelled.store(true, Ordering::Release);
        self.queue.close();
        self.join_workers();

        let abandoned = self.queue.drain();
        if !abandoned.is_empty() {
            warn!(count = abandoned.len(), "Payment jobs left unprocessed at shutdown");
        }
        info!("Payment worker pool stopped");
        Ok(abandoned)
    }

    /// Close the queue and let workers finish everything already queued
    /// before they exit.
    ///
    /// Returns any jobs that could not be drained (only possible if every
    /// worker died early).
    ///
    /// # Errors
    ///
    /// Returns `PoolError::AlreadyStopped` on a second call.
    pub fn drain_and_stop(&self) -> Result<Vec<PaymentJob>, PoolError> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Err(PoolError::AlreadyStopped);
        }

        info!(queued = self.queue.len(), "Draining payment worker pool");
        self.queue.close();
        self.join_workers();
        self.cancelled.store(true, Ordering::Release);

        let leftover = self.queue.drain();
        if !leftover.is_empty() {
            warn!(count = leftover.len(), "Payment jobs left undrained at shutdown");
        }
        info!("Payment worker pool drained and stopped");
        Ok(leftover)
    }

    /// Whether the pool has been stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// The queue this pool drains.
    #[must_use]
    pub const fn queue(&self) -> &Arc<PaymentQueue> {
        &self.queue
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters
            .snapshot(self.config.worker_count, self.queue.len())
    }

    fn join_workers(&self) {
        let mut workers = self.workers.lock();
        for (worker_id, worker) in workers.drain(..).enumerate() {
            if worker.join().is_err() {
                warn!(worker_id, "Payment worker panicked");
            } else {
                debug!(worker_id, "Payment worker joined");
            }
        }
    }
}

impl<H> Drop for PaymentWorkerPool<H>
where
    H: JobHandler,
{
    fn drop(&mut self) {
        // Signal but don't join: an explicit stop is required for a graceful wait.
        if !self.stopped.swap(true, Ordering::AcqRel) {
            self.cancelled.store(true, Ordering::Release);
            self.queue.close();
            debug!("PaymentWorkerPool dropped without explicit stop - workers will be detached");
        }
    }
}

/// Spawn a worker thread.
fn spawn_worker<H>(
    worker_id: usize,
    queue: Arc<PaymentQueue>,
    counters: Arc<PoolCounters>,
    cancelled: Arc<AtomicBool>,
    handler: H,
    poll_interval: Duration,
    stack_size: usize,
) -> std::io::Result<JoinHandle<()>>
where
    H: JobHandler,
{
    thread::Builder::new()
        .name(format!("payment-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            let span = info_span!("payment_worker", worker_id);
            let _entered = span.enter();

            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!(error = %e, "Failed to create worker runtime");
                    return;
                }
            };

            debug!("Payment worker started");

            loop {
                if cancelled.load(Ordering::Acquire) {
                    debug!("Payment worker cancelled, exiting");
                    break;
                }

                let job = match queue.pop_timeout(poll_interval) {
                    Pop::Item(job) => job,
                    Pop::TimedOut => continue,
                    Pop::Closed => {
                        debug!("Payment queue closed and drained, exiting");
                        break;
                    }
                };

                counters.dispatched_jobs.fetch_add(1, Ordering::Relaxed);
                counters.active_jobs.fetch_add(1, Ordering::Relaxed);
                info!(expense_id = job.expense_id, "Processing payment");

                let outcome = rt.block_on(handler.handle(job));

                counters.active_jobs.fetch_sub(1, Ordering::Relaxed);
                counters.record(&outcome);
                debug!(?outcome, "Payment job finished");
            }

            debug!("Payment worker exiting");
        })
}
