//! Bounded retries around the payment gateway with idempotency handling.
//!
//! For each job the processor makes up to `max_attempts` gateway calls:
//!
//! - a payment id settles the job: the expense records it, moves to
//!   `Completed` and a `complete` audit event is written;
//! - an idempotency conflict means an earlier attempt already paid, so the
//!   expense is completed without a payment id and no further attempt is made;
//! - any other failure sleeps `attempt * backoff_step` and retries, until the
//!   budget is spent. The expense then stays `Approved` and the job is
//!   dead-lettered for manual reconciliation.
//!
//! Jobs are serialized per `external_id`, and a job whose expense is no longer
//! `Approved` when its turn comes is skipped, so a duplicated job neither
//! calls the gateway again nor races the status updates of the first.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::config::DispatchConfig;
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::dead_letter::{DeadLetter, DeadLetterReason, DeadLetterSink};
use crate::core::error::DispatchError;
use crate::core::expense::{ExpenseStatus, PaymentJob, Transition};
use crate::core::gateway::{GatewayError, PaymentGateway};
use crate::core::repository::ExpenseRepository;
use crate::util::clock::now_ms;
use crate::util::keyed_lock::KeyedLock;

/// Attempt budget and linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Gateway calls per job, at least one.
    pub max_attempts: u32,
    /// Backoff unit.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    /// Create a policy; a zero attempt budget is raised to one.
    #[must_use]
    pub fn new(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_step,
        }
    }

    /// Policy described by the dispatch configuration.
    #[must_use]
    pub fn from_config(cfg: &DispatchConfig) -> Self {
        Self::new(cfg.max_attempts, cfg.backoff_step())
    }

    /// Sleep after failed attempt `attempt` (1-based). Grows without a cap.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt)
    }
}

/// Terminal result of processing one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The gateway issued a payment and the expense is completed.
    Paid {
        /// Gateway payment id.
        payment_id: String,
        /// Attempts used.
        attempts: u32,
    },
    /// The gateway had already processed this external id; the expense is completed.
    AlreadyProcessed {
        /// Attempts used.
        attempts: u32,
    },
    /// The expense was no longer payable when the job ran.
    Skipped {
        /// Status found.
        status: ExpenseStatus,
    },
    /// Every attempt failed; the expense remains approved.
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Failure of the last attempt.
        last_error: GatewayError,
    },
    /// The expense could not be read before paying.
    LookupFailed {
        /// Repository error.
        error: String,
    },
    /// The payment settled but the expense could not be updated.
    RecordFailed {
        /// Gateway payment id, if one was issued.
        payment_id: Option<String>,
        /// Repository error.
        error: String,
    },
}

impl PaymentOutcome {
    /// Whether the expense ended up completed.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Paid { .. } | Self::AlreadyProcessed { .. })
    }
}

/// Runs the retry/idempotency policy for payment jobs.
#[derive(Clone)]
pub struct PaymentProcessor {
    gateway: Arc<dyn PaymentGateway>,
    repository: Arc<dyn ExpenseRepository>,
    audit: Arc<dyn AuditSink>,
    dead_letters: Option<Arc<dyn DeadLetterSink>>,
    locks: Arc<KeyedLock>,
    policy: RetryPolicy,
}

impl PaymentProcessor {
    /// Create a processor over the given collaborators.
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        repository: Arc<dyn ExpenseRepository>,
        audit: Arc<dyn AuditSink>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            gateway,
            repository,
            audit,
            dead_letters: None,
            locks: Arc::new(KeyedLock::new()),
            policy,
        }
    }

    /// Send unpayable jobs to `sink` in addition to logging them.
    #[must_use]
    pub fn with_dead_letters(mut self, sink: Arc<dyn DeadLetterSink>) -> Self {
        self.dead_letters = Some(sink);
        self
    }

    /// The policy in effect.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Process one job to a terminal outcome.
    pub async fn process(&self, job: PaymentJob) -> PaymentOutcome {
        let _guard = self.locks.acquire(&job.external_id).await;

        match self.repository.get_by_id(job.expense_id).await {
            Ok(expense) if expense.status == ExpenseStatus::Approved => {}
            Ok(expense) => {
                info!(
                    expense_id = job.expense_id,
                    status = %expense.status,
                    "Expense no longer payable, skipping job"
                );
                return PaymentOutcome::Skipped {
                    status: expense.status,
                };
            }
            Err(err) => {
                error!(
                    expense_id = job.expense_id,
                    error = %err,
                    "Failed to load expense for payment"
                );
                let error = err.to_string();
                self.dead_letter(&job, DeadLetterReason::LookupFailed { error: error.clone() });
                return PaymentOutcome::LookupFailed { error };
            }
        }

        let max_attempts = self.policy.max_attempts;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            debug!(expense_id = job.expense_id, attempt, "Calling payment gateway");
            match self.gateway.create_payment(job.amount, &job.external_id).await {
                Ok(payment_id) => return self.complete(&job, Some(payment_id), attempt).await,
                Err(GatewayError::IdempotencyConflict) => {
                    info!(
                        expense_id = job.expense_id,
                        external_id = %job.external_id,
                        "Expense already processed (idempotency check), marking as completed"
                    );
                    return self.complete(&job, None, attempt).await;
                }
                Err(err) => {
                    if attempt < max_attempts {
                        let backoff = self.policy.backoff_for(attempt);
                        warn!(
                            expense_id = job.expense_id,
                            attempt,
                            max_attempts,
                            backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                            error = %err,
                            "Payment attempt failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        let last_error =
            last_error.unwrap_or_else(|| GatewayError::Transport("no attempt made".into()));
        error!(
            expense_id = job.expense_id,
            attempts = max_attempts,
            error = %last_error,
            "Payment failed after all attempts; expense left approved"
        );
        self.dead_letter(
            &job,
            DeadLetterReason::RetriesExhausted {
                attempts: max_attempts,
                last_error: last_error.to_string(),
            },
        );
        PaymentOutcome::Exhausted {
            attempts: max_attempts,
            last_error,
        }
    }

    async fn complete(
        &self,
        job: &PaymentJob,
        payment_id: Option<String>,
        attempts: u32,
    ) -> PaymentOutcome {
        let recorded = async {
            if let Some(id) = payment_id.as_deref() {
                self.repository
                    .update_payment_info(job.expense_id, id, &job.external_id)
                    .await?;
            }
            let completed = ExpenseStatus::Approved.apply(Transition::PaymentResolved)?;
            self.repository
                .update_status(job.expense_id, completed, Some(now_ms()))
                .await?;
            Ok::<_, DispatchError>(completed)
        }
        .await;

        let completed = match recorded {
            Ok(status) => status,
            Err(err) => {
                error!(
                    expense_id = job.expense_id,
                    payment_id = payment_id.as_deref().unwrap_or(""),
                    error = %err,
                    "Payment settled but expense could not be updated"
                );
                let error = err.to_string();
                self.dead_letter(
                    job,
                    DeadLetterReason::RecordFailed {
                        payment_id: payment_id.clone(),
                        error: error.clone(),
                    },
                );
                return PaymentOutcome::RecordFailed { payment_id, error };
            }
        };

        let mut metadata = Map::new();
        metadata.insert("external_id".into(), json!(job.external_id));
        metadata.insert("amount".into(), json!(job.amount));
        metadata.insert("attempts".into(), json!(attempts));
        match payment_id.as_deref() {
            Some(id) => metadata.insert("payment_id".into(), json!(id)),
            None => metadata.insert("idempotent_replay".into(), Value::Bool(true)),
        };
        let event = build_audit_event(
            job.expense_id,
            None,
            AuditAction::Complete,
            Some(ExpenseStatus::Approved),
            completed,
            metadata,
        );
        if let Err(err) = self.audit.record(event) {
            warn!(expense_id = job.expense_id, error = %err, "Failed to write audit event");
        }

        match payment_id {
            Some(payment_id) => {
                info!(
                    expense_id = job.expense_id,
                    payment_id = %payment_id,
                    attempts,
                    "Payment successful"
                );
                PaymentOutcome::Paid {
                    payment_id,
                    attempts,
                }
            }
            None => PaymentOutcome::AlreadyProcessed { attempts },
        }
    }

    fn dead_letter(&self, job: &PaymentJob, reason: DeadLetterReason) {
        if let Some(sink) = &self.dead_letters {
            sink.record(DeadLetter::new(job.clone(), reason));
        }
    }
}
