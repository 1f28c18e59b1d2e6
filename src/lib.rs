//! # Expense Dispatch
//!
//! Approval state machine and asynchronous payment dispatch for expense claims.
//!
//! An expense is submitted, approved (automatically below a threshold, or by
//! a manager) or rejected, and every approval produces exactly one payment
//! job. Jobs flow through a bounded queue to a fixed pool of worker threads
//! that call the payment gateway with bounded, linearly backed-off retries
//! and an idempotency key, so a payment is never issued twice for one expense.
//!
//! ## Moving parts
//!
//! - [`core::ExpenseService`]: validates claims and drives the
//!   `awaiting_approval -> approved -> completed` lifecycle, auditing every step
//! - [`infra::PaymentQueue`]: bounded FIFO; a full queue drops the job and logs it
//! - [`core::PaymentWorkerPool`]: dedicated OS threads, each with its own
//!   single-threaded tokio runtime, draining the queue
//! - [`core::PaymentProcessor`]: retry and idempotency policy around a
//!   [`core::PaymentGateway`]
//! - [`infra::HttpPaymentGateway`]: the HTTP payment API client
//!
//! ## Wiring
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use expense_dispatch::builders::build_http_dispatch_system;
//! use expense_dispatch::config::DispatchConfig;
//! use expense_dispatch::core::{InMemoryAuditSink, SubmitExpense};
//! use expense_dispatch::infra::InMemoryExpenseRepository;
//!
//! let cfg = DispatchConfig::from_env().map_err(anyhow::Error::msg)?;
//! let system = build_http_dispatch_system(
//!     &cfg,
//!     Arc::new(InMemoryExpenseRepository::new()),
//!     Arc::new(InMemoryAuditSink::new(10_000)),
//! )?;
//!
//! let receipt = system
//!     .service()
//!     .submit(42, SubmitExpense {
//!         amount: 500_000,
//!         description: "Team lunch".into(),
//!         receipt_url: None,
//!     })
//!     .await?;
//! assert!(receipt.dispatch.is_queued());
//!
//! system.drain_and_shutdown()?;
//! ```
//!
//! For complete scenarios, see `tests/expense_lifecycle_test.rs`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Builders that assemble the dispatch system from configuration.
pub mod builders;
/// Configuration models for the queue, workers, gateway and approval rules.
pub mod config;
/// Expense state machine, payment retries and the worker pool.
pub mod core;
/// Infrastructure adapters for the queue, storage and the payment gateway.
pub mod infra;
/// Shared utilities.
pub mod util;
