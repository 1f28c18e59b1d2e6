//! Expense claim model and the legal status transitions between its states.
//!
//! The transition table lives here as pure logic; persistence and side effects
//! (audit records, payment dispatch) are driven by
//! [`ExpenseService`](crate::core::state_machine::ExpenseService) and the
//! [`PaymentProcessor`](crate::core::retry::PaymentProcessor).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::ValidationError;

/// Identifier of an expense claim.
pub type ExpenseId = u64;

/// Identifier of a user (submitter or approving manager).
pub type UserId = u64;

/// Lifecycle status of an expense claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    /// Submitted at or above the approval threshold, waiting for a manager.
    AwaitingApproval,
    /// Approved (manually or automatically) and payable.
    Approved,
    /// Rejected by a manager. Terminal.
    Rejected,
    /// Paid out. Terminal.
    Completed,
}

impl ExpenseStatus {
    /// Whether no further transition can leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Completed)
    }

    /// Apply a transition, returning the resulting status.
    ///
    /// `Submit` is not accepted here: a submission creates the expense and its
    /// initial status comes from [`ExpenseStatus::initial`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::IllegalTransition`] when the transition is not
    /// legal from the current status.
    pub fn apply(self, transition: Transition) -> Result<Self, ValidationError> {
        match (self, transition) {
            (Self::AwaitingApproval, Transition::Approve) => Ok(Self::Approved),
            (Self::AwaitingApproval, Transition::Reject) => Ok(Self::Rejected),
            (Self::Approved, Transition::PaymentResolved) => Ok(Self::Completed),
            (from, transition) => Err(ValidationError::IllegalTransition { from, transition }),
        }
    }

    /// Initial status for a submission of `amount` given the auto-approval threshold.
    #[must_use]
    pub const fn initial(amount: i64, threshold: i64) -> Self {
        if amount < threshold {
            Self::Approved
        } else {
            Self::AwaitingApproval
        }
    }

    /// Wire/storage name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingApproval => "awaiting_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transitions an expense can undergo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Initial submission.
    Submit,
    /// Manager approval.
    Approve,
    /// Manager rejection.
    Reject,
    /// Payment settled by the dispatch subsystem.
    PaymentResolved,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::PaymentResolved => "payment_resolved",
        };
        f.write_str(name)
    }
}

/// An expense claim as stored by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Repository-assigned identifier.
    pub id: ExpenseId,
    /// Submitting user.
    pub user_id: UserId,
    /// Claimed amount in the smallest currency unit.
    pub amount: i64,
    /// Free-form description of the claim.
    pub description: String,
    /// Optional link to a receipt.
    pub receipt_url: Option<String>,
    /// Current lifecycle status.
    pub status: ExpenseStatus,
    /// Whether the claim skipped manual review.
    pub auto_approved: bool,
    /// Idempotency key presented to the payment gateway. Never regenerated.
    pub external_id: String,
    /// Gateway payment identifier, set only after a successful payment.
    pub payment_id: Option<String>,
    /// Submission time, milliseconds since epoch.
    pub submitted_at_ms: u128,
    /// Time of the last approve/reject/complete transition.
    pub processed_at_ms: Option<u128>,
}

impl Expense {
    /// Build the payment job for this expense.
    #[must_use]
    pub fn payment_job(&self) -> PaymentJob {
        PaymentJob {
            expense_id: self.id,
            amount: self.amount,
            external_id: self.external_id.clone(),
        }
    }
}

/// Fields needed to create an expense record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    /// Submitting user.
    pub user_id: UserId,
    /// Claimed amount in the smallest currency unit.
    pub amount: i64,
    /// Description of the claim.
    pub description: String,
    /// Optional receipt link.
    pub receipt_url: Option<String>,
    /// Initial status.
    pub status: ExpenseStatus,
    /// Whether the claim was auto-approved.
    pub auto_approved: bool,
    /// Freshly generated idempotency key.
    pub external_id: String,
    /// Submission time, milliseconds since epoch.
    pub submitted_at_ms: u128,
}

/// Instruction to pay out one approved expense.
///
/// Immutable once created; lives only between enqueue and a worker's terminal
/// handling of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentJob {
    /// Expense being paid.
    pub expense_id: ExpenseId,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    /// Idempotency key shared with the gateway.
    pub external_id: String,
}
