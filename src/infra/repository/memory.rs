//! In-memory expense repository for development and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::error::DispatchError;
use crate::core::expense::{Expense, ExpenseId, ExpenseStatus, NewExpense, Transition};
use crate::core::repository::ExpenseRepository;

/// Expense storage backed by a locked map; each call is atomic.
pub struct InMemoryExpenseRepository {
    expenses: RwLock<HashMap<ExpenseId, Expense>>,
    next_id: AtomicU64,
}

impl Default for InMemoryExpenseRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryExpenseRepository {
    /// Create an empty repository; ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            expenses: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of stored expenses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expenses.read().len()
    }

    /// Whether the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expenses.read().is_empty()
    }

    fn with_expense<F>(&self, id: ExpenseId, update: F) -> Result<(), DispatchError>
    where
        F: FnOnce(&mut Expense),
    {
        let mut expenses = self.expenses.write();
        let expense = expenses.get_mut(&id).ok_or(DispatchError::NotFound(id))?;
        update(expense);
        Ok(())
    }
}

#[async_trait]
impl ExpenseRepository for InMemoryExpenseRepository {
    async fn create(&self, expense: NewExpense) -> Result<Expense, DispatchError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stored = Expense {
            id,
            user_id: expense.user_id,
            amount: expense.amount,
            description: expense.description,
            receipt_url: expense.receipt_url,
            status: expense.status,
            auto_approved: expense.auto_approved,
            external_id: expense.external_id,
            payment_id: None,
            submitted_at_ms: expense.submitted_at_ms,
            processed_at_ms: None,
        };
        self.expenses.write().insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: ExpenseId) -> Result<Expense, DispatchError> {
        self.expenses
            .read()
            .get(&id)
            .cloned()
            .ok_or(DispatchError::NotFound(id))
    }

    async fn update_status(
        &self,
        id: ExpenseId,
        status: ExpenseStatus,
        processed_at_ms: Option<u128>,
    ) -> Result<(), DispatchError> {
        self.with_expense(id, |expense| {
            expense.status = status;
            expense.processed_at_ms = processed_at_ms;
        })
    }

    async fn transition_status(
        &self,
        id: ExpenseId,
        transition: Transition,
        processed_at_ms: Option<u128>,
    ) -> Result<(ExpenseStatus, Expense), DispatchError> {
        let mut expenses = self.expenses.write();
        let expense = expenses.get_mut(&id).ok_or(DispatchError::NotFound(id))?;
        let previous = expense.status;
        expense.status = previous.apply(transition)?;
        expense.processed_at_ms = processed_at_ms;
        Ok((previous, expense.clone()))
    }

    async fn update_payment_info(
        &self,
        id: ExpenseId,
        payment_id: &str,
        external_id: &str,
    ) -> Result<(), DispatchError> {
        self.with_expense(id, |expense| {
            expense.payment_id = Some(payment_id.to_owned());
            expense.external_id = external_id.to_owned();
        })
    }

    async fn list_by_status(&self, status: ExpenseStatus) -> Result<Vec<Expense>, DispatchError> {
        let mut matching: Vec<Expense> = self
            .expenses
            .read()
            .values()
            .filter(|e| e.status == status)
            .cloned()
            .collect();
        matching.sort_by_key(|e| (e.submitted_at_ms, e.id));
        Ok(matching)
    }
}
