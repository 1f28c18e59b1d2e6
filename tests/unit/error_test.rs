//! Tests for error types

use expense_dispatch::core::{
    DispatchError, ExpenseStatus, GatewayError, PoolError, Transition, ValidationError,
};

#[test]
fn test_queue_full_error() {
    let err = DispatchError::QueueFull {
        expense_id: 7,
        capacity: 100,
    };
    assert_eq!(
        format!("{err}"),
        "payment queue full (capacity 100): dropped job for expense 7"
    );
}

#[test]
fn test_illegal_transition_error() {
    let err: DispatchError = ValidationError::IllegalTransition {
        from: ExpenseStatus::Completed,
        transition: Transition::Approve,
    }
    .into();
    assert_eq!(
        format!("{err}"),
        "validation failed: illegal transition approve from status completed"
    );
}

#[test]
fn test_amount_out_of_range_error() {
    let err = ValidationError::AmountOutOfRange {
        amount: 5,
        min: 10_000,
        max: 50_000_000,
    };
    assert_eq!(format!("{err}"), "amount 5 must be between 10000 and 50000000");
}

#[test]
fn test_not_found_error() {
    assert_eq!(format!("{}", DispatchError::NotFound(12)), "expense 12 not found");
}

#[test]
fn test_gateway_error_display() {
    let err = GatewayError::Status {
        status: 502,
        message: None,
    };
    assert_eq!(format!("{err}"), "payment failed with status 502");
    assert!(GatewayError::IdempotencyConflict.is_idempotency_conflict());
    assert!(!GatewayError::Transport("reset".into()).is_idempotency_conflict());
}

#[test]
fn test_config_error() {
    let err = DispatchError::Config("worker_count must be greater than 0".into());
    assert_eq!(format!("{err}"), "config invalid: worker_count must be greater than 0");
}

#[test]
fn test_pool_error() {
    let err = PoolError::Spawn("resource temporarily unavailable".into());
    assert_eq!(
        format!("{err}"),
        "failed to spawn worker: resource temporarily unavailable"
    );
}
