//! Tests for builder modules

use std::sync::Arc;

use expense_dispatch::builders::{build_dispatch_system, build_http_dispatch_system};
use expense_dispatch::config::DispatchConfig;
use expense_dispatch::core::{
    DeadLetterReason, GatewayError, InMemoryAuditSink, PaymentGateway, PoolError, SubmitExpense,
};
use expense_dispatch::infra::InMemoryExpenseRepository;

/// Gateway that never answers within the test.
struct StalledGateway;

#[async_trait::async_trait]
impl PaymentGateway for StalledGateway {
    async fn create_payment(
        &self,
        _amount: i64,
        _external_id: &str,
    ) -> Result<String, GatewayError> {
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        Err(GatewayError::Transport("stalled".into()))
    }
}

fn claim(amount: i64) -> SubmitExpense {
    SubmitExpense {
        amount,
        description: "Hotel".into(),
        receipt_url: None,
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    let cfg = DispatchConfig {
        queue_capacity: 0,
        ..DispatchConfig::default()
    };
    let err = build_dispatch_system(
        &cfg,
        Arc::new(InMemoryExpenseRepository::new()),
        Arc::new(InMemoryAuditSink::new(10)),
        Arc::new(StalledGateway),
    )
    .err()
    .expect("invalid config");
    assert_eq!(err.to_string(), "config invalid: queue_capacity must be greater than 0");
}

#[test]
fn test_http_system_builds_and_stops() {
    let system = build_http_dispatch_system(
        &DispatchConfig::default(),
        Arc::new(InMemoryExpenseRepository::new()),
        Arc::new(InMemoryAuditSink::new(10)),
    )
    .unwrap();

    let stats = system.stats();
    assert_eq!(stats.worker_count, 5);
    assert_eq!(system.queue().capacity(), 100);
    assert_eq!(system.service().policy().threshold, 1_000_000);

    assert_eq!(system.shutdown().unwrap(), 0);
    assert!(matches!(system.shutdown(), Err(PoolError::AlreadyStopped)));
    assert!(matches!(system.drain_and_shutdown(), Err(PoolError::AlreadyStopped)));
}

#[test]
fn test_shutdown_dead_letters_abandoned_jobs() {
    let cfg = DispatchConfig {
        worker_count: 1,
        max_attempts: 1,
        poll_interval_ms: 10,
        ..DispatchConfig::default()
    };
    let system = build_dispatch_system(
        &cfg,
        Arc::new(InMemoryExpenseRepository::new()),
        Arc::new(InMemoryAuditSink::new(100)),
        Arc::new(StalledGateway),
    )
    .unwrap();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    for amount in [100_000, 200_000, 300_000] {
        let receipt = rt.block_on(system.service().submit(3, claim(amount))).unwrap();
        assert!(receipt.dispatch.is_queued());
    }
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    while system.stats().active_jobs == 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    let abandoned = system.shutdown().unwrap();

    assert_eq!(abandoned, 2);
    let letters = system.dead_letters();
    let abandoned_letters = letters
        .iter()
        .filter(|l| l.reason == DeadLetterReason::Abandoned)
        .count();
    assert_eq!(abandoned_letters, 2);
    assert!(letters
        .iter()
        .any(|l| matches!(l.reason, DeadLetterReason::RetriesExhausted { attempts: 1, .. })));
}
