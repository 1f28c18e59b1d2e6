//! Tests for the in-memory expense repository

use expense_dispatch::core::{
    DispatchError, ExpenseRepository, ExpenseStatus, NewExpense, Transition, ValidationError,
};
use expense_dispatch::infra::InMemoryExpenseRepository;

fn new_expense(amount: i64, status: ExpenseStatus, submitted_at_ms: u128) -> NewExpense {
    NewExpense {
        user_id: 1,
        amount,
        description: "Taxi".into(),
        receipt_url: None,
        status,
        auto_approved: status == ExpenseStatus::Approved,
        external_id: format!("ext-{amount}"),
        submitted_at_ms,
    }
}

#[tokio::test]
async fn test_create_assigns_sequential_ids() {
    let repo = InMemoryExpenseRepository::new();
    assert!(repo.is_empty());

    let a = repo.create(new_expense(10_000, ExpenseStatus::Approved, 1)).await.unwrap();
    let b = repo
        .create(new_expense(20_000, ExpenseStatus::AwaitingApproval, 2))
        .await
        .unwrap();

    assert_eq!((a.id, b.id), (1, 2));
    assert_eq!(repo.len(), 2);
    assert_eq!(a.payment_id, None);
    assert_eq!(a.processed_at_ms, None);
    assert_eq!(repo.get_by_id(b.id).await.unwrap(), b);
}

#[tokio::test]
async fn test_updates_apply_to_stored_expense() {
    let repo = InMemoryExpenseRepository::new();
    let e = repo.create(new_expense(10_000, ExpenseStatus::Approved, 1)).await.unwrap();

    repo.update_payment_info(e.id, "pay_1", "ext-10000").await.unwrap();
    repo.update_status(e.id, ExpenseStatus::Completed, Some(42)).await.unwrap();

    let stored = repo.get_by_id(e.id).await.unwrap();
    assert_eq!(stored.status, ExpenseStatus::Completed);
    assert_eq!(stored.payment_id.as_deref(), Some("pay_1"));
    assert_eq!(stored.processed_at_ms, Some(42));
}

#[tokio::test]
async fn test_transition_status_checks_and_writes_together() {
    let repo = InMemoryExpenseRepository::new();
    let e = repo
        .create(new_expense(2_000_000, ExpenseStatus::AwaitingApproval, 1))
        .await
        .unwrap();

    let (previous, updated) = repo
        .transition_status(e.id, Transition::Reject, Some(7))
        .await
        .unwrap();
    assert_eq!(previous, ExpenseStatus::AwaitingApproval);
    assert_eq!(updated.status, ExpenseStatus::Rejected);
    assert_eq!(updated.processed_at_ms, Some(7));

    let err = repo
        .transition_status(e.id, Transition::Approve, Some(8))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Validation(ValidationError::IllegalTransition {
            from: ExpenseStatus::Rejected,
            transition: Transition::Approve,
        })
    ));
    let stored = repo.get_by_id(e.id).await.unwrap();
    assert_eq!(stored.status, ExpenseStatus::Rejected);
    assert_eq!(stored.processed_at_ms, Some(7));
}

#[tokio::test]
async fn test_missing_expense_is_not_found() {
    let repo = InMemoryExpenseRepository::new();
    assert!(matches!(repo.get_by_id(3).await, Err(DispatchError::NotFound(3))));
    assert!(matches!(
        repo.update_status(3, ExpenseStatus::Approved, None).await,
        Err(DispatchError::NotFound(3))
    ));
    assert!(matches!(
        repo.transition_status(3, Transition::Approve, None).await,
        Err(DispatchError::NotFound(3))
    ));
}

#[tokio::test]
async fn test_list_by_status_oldest_first() {
    let repo = InMemoryExpenseRepository::new();
    repo.create(new_expense(30_000, ExpenseStatus::AwaitingApproval, 30))
        .await
        .unwrap();
    repo.create(new_expense(40_000, ExpenseStatus::Approved, 5)).await.unwrap();
    repo.create(new_expense(50_000, ExpenseStatus::AwaitingApproval, 10))
        .await
        .unwrap();

    let pending = repo.list_by_status(ExpenseStatus::AwaitingApproval).await.unwrap();
    let amounts: Vec<i64> = pending.iter().map(|e| e.amount).collect();
    assert_eq!(amounts, vec![50_000, 30_000]);
    assert!(repo.list_by_status(ExpenseStatus::Rejected).await.unwrap().is_empty());
}
