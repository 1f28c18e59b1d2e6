//! Audit sink implementations.
//!
//! Every status transition produces exactly one [`AuditEvent`]. Sinks are
//! fire-and-forget from the caller's point of view: a failed write is logged
//! and never rolls back the transition that produced it.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::DispatchError;
use crate::core::expense::{ExpenseId, ExpenseStatus, UserId};
use crate::util::clock::now_ms;

/// Kind of transition recorded by an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Expense submitted.
    Submit,
    /// Expense approved by a manager.
    Approve,
    /// Expense rejected by a manager.
    Reject,
    /// Payment settled and expense completed.
    Complete,
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Expense the transition applied to.
    pub expense_id: ExpenseId,
    /// Acting user; `None` for transitions driven by the dispatch subsystem.
    pub actor: Option<UserId>,
    /// Action taken.
    pub action: AuditAction,
    /// Status before the transition (absent for submissions).
    pub old_status: Option<ExpenseStatus>,
    /// Status after the transition.
    pub new_status: ExpenseStatus,
    /// Transition-specific context (amounts, notes, payment ids).
    pub metadata: Map<String, Value>,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Append-only audit sink abstraction.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Audit`] when the event could not be stored.
    fn record(&self, event: AuditEvent) -> Result<(), DispatchError>;
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: Mutex<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Events for one expense, oldest first.
    #[must_use]
    pub fn events_for(&self, expense_id: ExpenseId) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.expense_id == expense_id)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), DispatchError> {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
        Ok(())
    }
}

/// Helper to build an audit event from context.
#[must_use]
pub fn build_audit_event(
    expense_id: ExpenseId,
    actor: Option<UserId>,
    action: AuditAction,
    old_status: Option<ExpenseStatus>,
    new_status: ExpenseStatus,
    metadata: Map<String, Value>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        expense_id,
        actor,
        action,
        old_status,
        new_status,
        metadata,
        created_at_ms: now_ms(),
    }
}
