//! Expense persistence contract consumed by the state machine and the workers.

use async_trait::async_trait;

use crate::core::error::DispatchError;
use crate::core::expense::{Expense, ExpenseId, ExpenseStatus, NewExpense, Transition};

/// Storage for expense claims.
///
/// Each call must be atomic on its own; the dispatch subsystem never relies on
/// atomicity across calls.
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Persist a new expense and return it with its assigned id.
    async fn create(&self, expense: NewExpense) -> Result<Expense, DispatchError>;

    /// Fetch an expense.
    ///
    /// Returns [`DispatchError::NotFound`] when the id is unknown.
    async fn get_by_id(&self, id: ExpenseId) -> Result<Expense, DispatchError>;

    /// Overwrite the status and processing time of an expense.
    async fn update_status(
        &self,
        id: ExpenseId,
        status: ExpenseStatus,
        processed_at_ms: Option<u128>,
    ) -> Result<(), DispatchError>;

    /// Apply `transition` to the stored status and set the processing time, as
    /// one step.
    ///
    /// Returns the previous status and the updated expense. Fails with
    /// [`ValidationError::IllegalTransition`](crate::core::ValidationError) and
    /// leaves the expense untouched when the current status does not allow the
    /// transition, so of two racing decisions only one can succeed.
    async fn transition_status(
        &self,
        id: ExpenseId,
        transition: Transition,
        processed_at_ms: Option<u128>,
    ) -> Result<(ExpenseStatus, Expense), DispatchError>;

    /// Record the gateway payment id alongside the idempotency key used.
    async fn update_payment_info(
        &self,
        id: ExpenseId,
        payment_id: &str,
        external_id: &str,
    ) -> Result<(), DispatchError>;

    /// All expenses currently in `status`, oldest submission first.
    async fn list_by_status(&self, status: ExpenseStatus) -> Result<Vec<Expense>, DispatchError>;
}
