//! Tests for audit sink

use expense_dispatch::core::{
    build_audit_event, AuditAction, AuditSink, ExpenseStatus, InMemoryAuditSink,
};
use serde_json::{json, Map};

fn submit_event(expense_id: u64) -> expense_dispatch::core::AuditEvent {
    build_audit_event(
        expense_id,
        Some(5),
        AuditAction::Submit,
        None,
        ExpenseStatus::AwaitingApproval,
        Map::new(),
    )
}

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);

    sink.record(submit_event(1)).unwrap();
    sink.record(submit_event(2)).unwrap();

    assert_eq!(sink.events().len(), 2);
    let events = sink.events_for(2);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].expense_id, 2);
    assert_eq!(events[0].action, AuditAction::Submit);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);

    sink.record(submit_event(1)).unwrap();
    sink.record(submit_event(2)).unwrap();
    sink.record(submit_event(3)).unwrap();

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].expense_id, 2); // First one popped
    assert_eq!(events[1].expense_id, 3);
}

#[test]
fn test_build_audit_event() {
    let mut metadata = Map::new();
    metadata.insert("notes".into(), json!("ok"));
    let event = build_audit_event(
        9,
        Some(77),
        AuditAction::Approve,
        Some(ExpenseStatus::AwaitingApproval),
        ExpenseStatus::Approved,
        metadata,
    );

    assert_eq!(event.expense_id, 9);
    assert_eq!(event.actor, Some(77));
    assert_eq!(event.old_status, Some(ExpenseStatus::AwaitingApproval));
    assert_eq!(event.new_status, ExpenseStatus::Approved);
    assert_eq!(event.metadata["notes"], json!("ok"));
    assert!(!event.event_id.is_empty());
    assert!(event.created_at_ms > 0);

    let other = submit_event(9);
    assert_ne!(event.event_id, other.event_id);
}

#[test]
fn test_audit_event_serializes_snake_case() {
    let event = build_audit_event(
        3,
        None,
        AuditAction::Complete,
        Some(ExpenseStatus::Approved),
        ExpenseStatus::Completed,
        Map::new(),
    );
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["action"], json!("complete"));
    assert_eq!(value["old_status"], json!("approved"));
    assert_eq!(value["new_status"], json!("completed"));
    assert_eq!(value["actor"], json!(null));
}
