//! Core dispatch abstractions: the expense state machine, payment retries and workers.

pub mod audit;
pub mod dead_letter;
pub mod dispatch;
pub mod error;
pub mod expense;
pub mod gateway;
pub mod handler;
pub mod repository;
pub mod retry;
pub mod state_machine;
pub mod worker_pool;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use dead_letter::{DeadLetter, DeadLetterReason, DeadLetterSink, InMemoryDeadLetters};
pub use dispatch::{DispatchState, PaymentDispatch};
pub use error::{AppResult, DispatchError, ValidationError};
pub use expense::{
    Expense, ExpenseId, ExpenseStatus, NewExpense, PaymentJob, Transition, UserId,
};
pub use gateway::{GatewayError, PaymentGateway};
pub use handler::JobHandler;
pub use repository::ExpenseRepository;
pub use retry::{PaymentOutcome, PaymentProcessor, RetryPolicy};
pub use state_machine::{ExpenseService, SubmitExpense, TransitionReceipt};
pub use worker_pool::{PaymentWorkerPool, PoolError, PoolStats};
