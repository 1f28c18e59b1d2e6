//! Tests for configuration validation and loading

use std::collections::HashMap;
use std::time::Duration;

use expense_dispatch::config::{DispatchConfig, WorkerPoolConfig};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_dispatch_config_defaults() {
    let cfg = DispatchConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.queue_capacity, 100);
    assert_eq!(cfg.worker_count, 5);
    assert_eq!(cfg.max_attempts, 3);
    assert_eq!(cfg.backoff_step(), Duration::from_secs(2));
    assert_eq!(cfg.gateway.base_url, "http://localhost:8081");
    assert_eq!(cfg.gateway.timeout(), Duration::from_secs(30));
    assert_eq!(cfg.approval.threshold, 1_000_000);
    assert_eq!(cfg.approval.min_amount, 10_000);
    assert_eq!(cfg.approval.max_amount, 50_000_000);
}

#[test]
fn test_dispatch_config_invalid_values() {
    let zero_queue = DispatchConfig {
        queue_capacity: 0,
        ..DispatchConfig::default()
    };
    assert!(zero_queue.validate().is_err());

    let zero_workers = DispatchConfig {
        worker_count: 0,
        ..DispatchConfig::default()
    };
    assert_eq!(
        zero_workers.validate().unwrap_err(),
        "worker_count must be greater than 0"
    );

    let zero_attempts = DispatchConfig {
        max_attempts: 0,
        ..DispatchConfig::default()
    };
    assert!(zero_attempts.validate().is_err());

    let mut no_url = DispatchConfig::default();
    no_url.gateway.base_url = "  ".into();
    assert!(no_url.validate().is_err());

    let mut inverted = DispatchConfig::default();
    inverted.approval.min_amount = 100;
    inverted.approval.max_amount = 10;
    assert!(inverted.validate().is_err());
}

#[test]
fn test_dispatch_config_from_json() {
    let json = r#"{
        "queue_capacity": 25,
        "worker_count": 2,
        "gateway": { "base_url": "https://pay.example.com" },
        "approval": { "threshold": 500000 }
    }"#;
    let cfg = DispatchConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.queue_capacity, 25);
    assert_eq!(cfg.worker_count, 2);
    assert_eq!(cfg.max_attempts, 3);
    assert_eq!(cfg.gateway.base_url, "https://pay.example.com");
    assert_eq!(cfg.gateway.timeout_secs, 30);
    assert_eq!(cfg.approval.threshold, 500_000);
    assert_eq!(cfg.approval.min_amount, 10_000);
}

#[test]
fn test_dispatch_config_from_json_rejects_invalid() {
    assert!(DispatchConfig::from_json_str("{ not json").is_err());
    assert!(DispatchConfig::from_json_str(r#"{"worker_count": 0}"#).is_err());
}

#[test]
fn test_dispatch_config_from_lookup() {
    let cfg = DispatchConfig::from_lookup(lookup(&[
        ("PAYMENT_API_URL", "http://gateway:9000"),
        ("PAYMENT_TIMEOUT_SECS", "10"),
        ("PAYMENT_QUEUE_CAPACITY", "250"),
        ("WORKER_POOL_SIZE", "8"),
        ("WORKER_MAX_RETRIES", "4"),
        ("WORKER_BACKOFF_STEP_SECS", "1"),
        ("APPROVAL_THRESHOLD", "2000000"),
    ]))
    .unwrap();

    assert_eq!(cfg.gateway.base_url, "http://gateway:9000");
    assert_eq!(cfg.gateway.timeout_secs, 10);
    assert_eq!(cfg.queue_capacity, 250);
    assert_eq!(cfg.worker_count, 8);
    assert_eq!(cfg.max_attempts, 4);
    assert_eq!(cfg.backoff_step_secs, 1);
    assert_eq!(cfg.approval.threshold, 2_000_000);
}

#[test]
fn test_dispatch_config_from_empty_lookup_uses_defaults() {
    let cfg = DispatchConfig::from_lookup(lookup(&[("WORKER_POOL_SIZE", "")])).unwrap();
    assert_eq!(cfg, DispatchConfig::default());
}

#[test]
fn test_dispatch_config_from_lookup_malformed_value() {
    let err = DispatchConfig::from_lookup(lookup(&[("WORKER_POOL_SIZE", "many")])).unwrap_err();
    assert!(err.starts_with("WORKER_POOL_SIZE: cannot parse `many`"), "{err}");

    let err = DispatchConfig::from_lookup(lookup(&[("WORKER_POOL_SIZE", "0")])).unwrap_err();
    assert_eq!(err, "worker_count must be greater than 0");
}

#[test]
fn test_worker_pool_config() {
    let cfg = WorkerPoolConfig::new();
    assert_eq!(cfg.worker_count, 5);
    assert!(cfg.validate().is_ok());

    let derived = WorkerPoolConfig::from_dispatch(&DispatchConfig {
        worker_count: 9,
        poll_interval_ms: 25,
        ..DispatchConfig::default()
    });
    assert_eq!(derived.worker_count, 9);
    assert_eq!(derived.poll_interval, Duration::from_millis(25));

    assert!(cfg.clone().with_worker_count(0).validate().is_err());
    assert!(cfg.clone().with_poll_interval(Duration::ZERO).validate().is_err());
    assert!(cfg.with_thread_stack_size(1024).validate().is_err());
}
