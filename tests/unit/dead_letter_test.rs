//! Tests for the dead-letter store

use expense_dispatch::core::{
    DeadLetter, DeadLetterReason, DeadLetterSink, InMemoryDeadLetters, PaymentJob,
};

fn job(id: u64) -> PaymentJob {
    PaymentJob {
        expense_id: id,
        amount: 10_000,
        external_id: format!("ext-{id}"),
    }
}

#[test]
fn test_letters_kept_in_order() {
    let store = InMemoryDeadLetters::new(10);
    assert!(store.is_empty());

    store.record(DeadLetter::new(job(1), DeadLetterReason::QueueFull));
    store.record(DeadLetter::new(job(2), DeadLetterReason::Abandoned));

    let letters = store.letters();
    assert_eq!(store.len(), 2);
    assert_eq!(letters[0].job.expense_id, 1);
    assert_eq!(letters[0].reason, DeadLetterReason::QueueFull);
    assert_eq!(letters[1].reason, DeadLetterReason::Abandoned);
    assert!(letters[1].recorded_at_ms > 0);
}

#[test]
fn test_oldest_letter_evicted_at_capacity() {
    let store = InMemoryDeadLetters::new(2);
    for id in 1..=3 {
        store.record(DeadLetter::new(
            job(id),
            DeadLetterReason::RetriesExhausted {
                attempts: 3,
                last_error: "timeout".into(),
            },
        ));
    }

    let ids: Vec<u64> = store.letters().iter().map(|l| l.job.expense_id).collect();
    assert_eq!(ids, vec![2, 3]);
}
