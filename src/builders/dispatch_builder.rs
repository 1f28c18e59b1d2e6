//! Assembles the queue, worker pool, processor and service from configuration.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::config::{DispatchConfig, WorkerPoolConfig};
use crate::core::{
    AppResult, AuditSink, DeadLetter, DeadLetterReason, DeadLetterSink, DispatchError,
    ExpenseRepository, ExpenseService, InMemoryDeadLetters, PaymentDispatch, PaymentGateway,
    PaymentJob, PaymentProcessor, PaymentWorkerPool, PoolError, PoolStats, RetryPolicy,
};
use crate::infra::{HttpPaymentGateway, PaymentQueue};

/// A running dispatch system: the service callers use, plus the workers behind it.
pub struct DispatchSystem {
    service: Arc<ExpenseService>,
    pool: PaymentWorkerPool<PaymentProcessor>,
    queue: Arc<PaymentQueue>,
    dead_letters: Arc<InMemoryDeadLetters>,
}

impl DispatchSystem {
    /// Service for submissions and decisions.
    #[must_use]
    pub const fn service(&self) -> &Arc<ExpenseService> {
        &self.service
    }

    /// The shared payment queue.
    #[must_use]
    pub const fn queue(&self) -> &Arc<PaymentQueue> {
        &self.queue
    }

    /// Jobs awaiting manual reconciliation.
    #[must_use]
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters.letters()
    }

    /// Worker statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Stop the workers after their in-flight jobs; still-queued jobs are
    /// dead-lettered as abandoned. Returns how many were abandoned.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::AlreadyStopped` on a second shutdown.
    pub fn shutdown(&self) -> Result<usize, PoolError> {
        let abandoned = self.pool.stop()?;
        Ok(self.abandon(abandoned))
    }

    /// Process everything queued, then stop the workers.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::AlreadyStopped` on a second shutdown.
    pub fn drain_and_shutdown(&self) -> Result<usize, PoolError> {
        let leftover = self.pool.drain_and_stop()?;
        Ok(self.abandon(leftover))
    }

    fn abandon(&self, jobs: Vec<PaymentJob>) -> usize {
        let count = jobs.len();
        for job in jobs {
            warn!(expense_id = job.expense_id, "Payment job abandoned at shutdown");
            self.dead_letters
                .record(DeadLetter::new(job, DeadLetterReason::Abandoned));
        }
        count
    }
}

/// Build and start a dispatch system around the given collaborators.
///
/// # Errors
///
/// Fails if the configuration is invalid or the workers cannot be started.
pub fn build_dispatch_system(
    cfg: &DispatchConfig,
    repository: Arc<dyn ExpenseRepository>,
    audit: Arc<dyn AuditSink>,
    gateway: Arc<dyn PaymentGateway>,
) -> AppResult<DispatchSystem> {
    cfg.validate().map_err(DispatchError::Config)?;

    let queue = Arc::new(PaymentQueue::new(cfg.queue_capacity));
    let dead_letters = Arc::new(InMemoryDeadLetters::new(cfg.dead_letter_capacity));

    let processor = PaymentProcessor::new(
        gateway,
        Arc::clone(&repository),
        Arc::clone(&audit),
        RetryPolicy::from_config(cfg),
    )
    .with_dead_letters(Arc::clone(&dead_letters) as Arc<dyn DeadLetterSink>);

    let pool = PaymentWorkerPool::start(
        WorkerPoolConfig::from_dispatch(cfg),
        Arc::clone(&queue),
        processor,
    )
    .context("failed to start payment workers")?;

    let service = ExpenseService::new(
        repository,
        audit,
        Arc::clone(&queue) as Arc<dyn PaymentDispatch>,
        cfg.approval,
    )
    .with_dead_letters(Arc::clone(&dead_letters) as Arc<dyn DeadLetterSink>);

    info!(
        queue_capacity = cfg.queue_capacity,
        worker_count = cfg.worker_count,
        max_attempts = cfg.max_attempts,
        "Dispatch system started"
    );

    Ok(DispatchSystem {
        service: Arc::new(service),
        pool,
        queue,
        dead_letters,
    })
}

/// Build a dispatch system that pays through the HTTP gateway in `cfg.gateway`.
///
/// # Errors
///
/// Fails if the HTTP client cannot be built, or for any reason
/// [`build_dispatch_system`] fails.
pub fn build_http_dispatch_system(
    cfg: &DispatchConfig,
    repository: Arc<dyn ExpenseRepository>,
    audit: Arc<dyn AuditSink>,
) -> AppResult<DispatchSystem> {
    let gateway = HttpPaymentGateway::new(&cfg.gateway)
        .with_context(|| format!("failed to build payment client for {}", cfg.gateway.base_url))?;
    build_dispatch_system(cfg, repository, audit, Arc::new(gateway))
}
