//! Expense lifecycle service: submission, approval and rejection.
//!
//! Each successful call persists the new status, writes exactly one audit
//! event and, when the expense becomes payable, hands exactly one
//! [`PaymentJob`](crate::core::PaymentJob) to the dispatcher. A dropped job is
//! reported on the returned receipt and logged; it never fails the call.

use std::sync::Arc;

use serde_json::{json, Map};
use tracing::{error, info, warn};

use crate::config::ApprovalPolicy;
use crate::core::audit::{build_audit_event, AuditAction, AuditEvent, AuditSink};
use crate::core::dead_letter::{DeadLetter, DeadLetterReason, DeadLetterSink};
use crate::core::dispatch::{DispatchState, PaymentDispatch};
use crate::core::error::{DispatchError, ValidationError};
use crate::core::expense::{Expense, ExpenseId, ExpenseStatus, NewExpense, Transition, UserId};
use crate::core::repository::ExpenseRepository;
use crate::util::clock::now_ms;

/// A new expense claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitExpense {
    /// Claimed amount in the smallest currency unit.
    pub amount: i64,
    /// Description of the claim.
    pub description: String,
    /// Optional receipt link.
    pub receipt_url: Option<String>,
}

/// Result of a successful transition.
#[derive(Debug)]
pub struct TransitionReceipt {
    /// The expense after the transition.
    pub expense: Expense,
    /// What happened to the payment job, if the transition produced one.
    pub dispatch: DispatchState,
}

/// A manager's decision on an expense awaiting approval.
#[derive(Debug, Clone, Copy)]
enum Decision {
    Approve,
    Reject,
}

/// Drives expense transitions and payment dispatch.
pub struct ExpenseService {
    repository: Arc<dyn ExpenseRepository>,
    audit: Arc<dyn AuditSink>,
    dispatcher: Arc<dyn PaymentDispatch>,
    dead_letters: Option<Arc<dyn DeadLetterSink>>,
    policy: ApprovalPolicy,
}

impl ExpenseService {
    /// Create a service.
    pub fn new(
        repository: Arc<dyn ExpenseRepository>,
        audit: Arc<dyn AuditSink>,
        dispatcher: Arc<dyn PaymentDispatch>,
        policy: ApprovalPolicy,
    ) -> Self {
        Self {
            repository,
            audit,
            dispatcher,
            dead_letters: None,
            policy,
        }
    }

    /// Record dropped jobs in `sink` as well as the log.
    #[must_use]
    pub fn with_dead_letters(mut self, sink: Arc<dyn DeadLetterSink>) -> Self {
        self.dead_letters = Some(sink);
        self
    }

    /// Submission rules in effect.
    #[must_use]
    pub const fn policy(&self) -> &ApprovalPolicy {
        &self.policy
    }

    /// Submit a claim.
    ///
    /// Amounts below the approval threshold are approved immediately and a
    /// payment job is dispatched; others wait for a manager.
    ///
    /// # Errors
    ///
    /// - `DispatchError::Validation` for an out-of-range amount or blank description
    /// - `DispatchError::Repository` if the expense cannot be stored
    pub async fn submit(
        &self,
        user_id: UserId,
        claim: SubmitExpense,
    ) -> Result<TransitionReceipt, DispatchError> {
        let ApprovalPolicy {
            threshold,
            min_amount,
            max_amount,
        } = self.policy;

        if claim.amount < min_amount || claim.amount > max_amount {
            return Err(ValidationError::AmountOutOfRange {
                amount: claim.amount,
                min: min_amount,
                max: max_amount,
            }
            .into());
        }
        if claim.description.trim().is_empty() {
            return Err(ValidationError::DescriptionRequired.into());
        }

        let status = ExpenseStatus::initial(claim.amount, threshold);
        let auto_approved = status == ExpenseStatus::Approved;
        let expense = self
            .repository
            .create(NewExpense {
                user_id,
                amount: claim.amount,
                description: claim.description,
                receipt_url: claim.receipt_url,
                status,
                auto_approved,
                external_id: uuid::Uuid::new_v4().to_string(),
                submitted_at_ms: now_ms(),
            })
            .await?;

        let mut metadata = Map::new();
        metadata.insert("amount".into(), json!(expense.amount));
        metadata.insert("auto_approved".into(), json!(auto_approved));
        self.audit(build_audit_event(
            expense.id,
            Some(user_id),
            AuditAction::Submit,
            None,
            status,
            metadata,
        ));

        let dispatch = if auto_approved {
            info!(
                expense_id = expense.id,
                amount = expense.amount,
                "Expense auto-approved, sending to payment queue"
            );
            info!(
                expense_id = expense.id,
                user_id,
                "Notification: auto-approval sent to submitter"
            );
            self.dispatch(&expense)
        } else {
            info!(
                expense_id = expense.id,
                amount = expense.amount,
                threshold,
                "Expense requires manager approval"
            );
            info!(
                expense_id = expense.id,
                user_id,
                "Notification: approval request sent to managers"
            );
            DispatchState::NotRequired
        };

        Ok(TransitionReceipt { expense, dispatch })
    }

    /// Approve an expense awaiting approval and dispatch its payment.
    ///
    /// # Errors
    ///
    /// - `DispatchError::NotFound` for an unknown id
    /// - `DispatchError::Validation` unless the expense is awaiting approval
    /// - `DispatchError::Repository` if the status cannot be stored
    pub async fn approve(
        &self,
        manager_id: UserId,
        expense_id: ExpenseId,
        notes: Option<String>,
    ) -> Result<TransitionReceipt, DispatchError> {
        let expense = self
            .decide(manager_id, expense_id, Decision::Approve, notes)
            .await?;

        info!(expense_id, manager_id, "Expense approved, sending to payment queue");
        info!(
            expense_id,
            user_id = expense.user_id,
            "Notification: approval sent to submitter"
        );
        let dispatch = self.dispatch(&expense);
        Ok(TransitionReceipt { expense, dispatch })
    }

    /// Reject an expense awaiting approval. No payment is produced.
    ///
    /// # Errors
    ///
    /// Same as [`ExpenseService::approve`].
    pub async fn reject(
        &self,
        manager_id: UserId,
        expense_id: ExpenseId,
        notes: Option<String>,
    ) -> Result<TransitionReceipt, DispatchError> {
        let expense = self
            .decide(manager_id, expense_id, Decision::Reject, notes)
            .await?;

        info!(expense_id, manager_id, "Expense rejected");
        info!(
            expense_id,
            user_id = expense.user_id,
            "Notification: rejection sent to submitter"
        );
        Ok(TransitionReceipt {
            expense,
            dispatch: DispatchState::NotRequired,
        })
    }

    /// Fetch one expense.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotFound` for an unknown id.
    pub async fn get(&self, expense_id: ExpenseId) -> Result<Expense, DispatchError> {
        self.repository.get_by_id(expense_id).await
    }

    /// Expenses waiting for a manager, oldest first.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn pending_approvals(&self) -> Result<Vec<Expense>, DispatchError> {
        self.repository
            .list_by_status(ExpenseStatus::AwaitingApproval)
            .await
    }

    async fn decide(
        &self,
        manager_id: UserId,
        expense_id: ExpenseId,
        decision: Decision,
        notes: Option<String>,
    ) -> Result<Expense, DispatchError> {
        let (transition, action) = match decision {
            Decision::Approve => (Transition::Approve, AuditAction::Approve),
            Decision::Reject => (Transition::Reject, AuditAction::Reject),
        };
        let (old_status, expense) = self
            .repository
            .transition_status(expense_id, transition, Some(now_ms()))
            .await?;

        let mut metadata = Map::new();
        metadata.insert("approver_id".into(), json!(manager_id));
        metadata.insert("notes".into(), json!(notes));
        self.audit(build_audit_event(
            expense_id,
            Some(manager_id),
            action,
            Some(old_status),
            expense.status,
            metadata,
        ));

        Ok(expense)
    }

    fn dispatch(&self, expense: &Expense) -> DispatchState {
        let job = expense.payment_job();
        match self.dispatcher.dispatch(job.clone()) {
            Ok(()) => DispatchState::Queued,
            Err(err) => {
                error!(
                    expense_id = expense.id,
                    error = %err,
                    "Could not queue payment; expense stays approved until reconciled"
                );
                if let Some(sink) = &self.dead_letters {
                    let reason = match err {
                        DispatchError::QueueClosed { .. } => DeadLetterReason::QueueClosed,
                        _ => DeadLetterReason::QueueFull,
                    };
                    sink.record(DeadLetter::new(job, reason));
                }
                DispatchState::Dropped(err)
            }
        }
    }

    fn audit(&self, event: AuditEvent) {
        let expense_id = event.expense_id;
        if let Err(err) = self.audit.record(event) {
            warn!(expense_id, error = %err, "Failed to write audit event");
        }
    }
}
