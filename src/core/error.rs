//! Error types for expense transitions and payment dispatch.

use thiserror::Error;

use crate::core::expense::{ExpenseId, ExpenseStatus, Transition};

/// Errors produced by dispatch components.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// An illegal transition or invalid submission was attempted.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// The expense does not exist.
    #[error("expense {0} not found")]
    NotFound(ExpenseId),
    /// The payment queue was at capacity and the job was dropped.
    #[error("payment queue full (capacity {capacity}): dropped job for expense {expense_id}")]
    QueueFull {
        /// Expense whose job was dropped.
        expense_id: ExpenseId,
        /// Capacity of the queue at the time of the drop.
        capacity: usize,
    },
    /// The payment queue no longer accepts jobs.
    #[error("payment queue closed: rejected job for expense {expense_id}")]
    QueueClosed {
        /// Expense whose job was rejected.
        expense_id: ExpenseId,
    },
    /// Repository failure with context.
    #[error("repository error: {0}")]
    Repository(String),
    /// Audit sink failure with context.
    #[error("audit error: {0}")]
    Audit(String),
    /// Invalid configuration.
    #[error("config invalid: {0}")]
    Config(String),
}

/// Rejections surfaced synchronously to the caller of submit/approve/reject.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The transition is not legal from the current status.
    #[error("illegal transition {transition} from status {from}")]
    IllegalTransition {
        /// Status the expense was in.
        from: ExpenseStatus,
        /// Transition that was attempted.
        transition: Transition,
    },
    /// Submitted amount lies outside the accepted range.
    #[error("amount {amount} must be between {min} and {max}")]
    AmountOutOfRange {
        /// Submitted amount.
        amount: i64,
        /// Smallest accepted amount.
        min: i64,
        /// Largest accepted amount.
        max: i64,
    },
    /// The description was empty.
    #[error("description is required")]
    DescriptionRequired,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
