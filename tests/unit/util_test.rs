//! Tests for utility functions

use std::sync::Arc;
use std::time::Duration;

use expense_dispatch::util::{init_tracing, now_ms, KeyedLock};

#[test]
fn test_now_ms_is_monotonic_enough() {
    let a = now_ms();
    std::thread::sleep(Duration::from_millis(2));
    let b = now_ms();
    assert!(b >= a);
    assert!(a > 1_600_000_000_000);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}

#[test]
fn test_keyed_lock_spans_runtimes() {
    let locks = Arc::new(KeyedLock::new());
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..2)
        .map(|worker| {
            let locks = Arc::clone(&locks);
            let order = Arc::clone(&order);
            std::thread::spawn(move || {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();
                rt.block_on(async {
                    let _guard = locks.acquire("ext-shared").await;
                    order.lock().push((worker, "enter"));
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    order.lock().push((worker, "exit"));
                });
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let order = order.lock();
    assert_eq!(order.len(), 4);
    // Critical sections never interleave.
    assert_eq!(order[0].0, order[1].0);
    assert_eq!(order[1].1, "exit");
    assert_eq!(order[2].0, order[3].0);
    assert_eq!(locks.active_keys(), 0);
}
