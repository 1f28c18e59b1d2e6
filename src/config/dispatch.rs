//! Dispatch subsystem configuration.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Auto-approval threshold and accepted submission range, in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalPolicy {
    /// Amounts strictly below this are approved without review.
    pub threshold: i64,
    /// Smallest amount accepted at submission.
    pub min_amount: i64,
    /// Largest amount accepted at submission.
    pub max_amount: i64,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            threshold: 1_000_000,
            min_amount: 10_000,
            max_amount: 50_000_000,
        }
    }
}

/// Payment gateway endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL; requests go to `{base_url}/v1/payments`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".into(),
            timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Request timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Root configuration, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum queued payment jobs before enqueue drops.
    pub queue_capacity: usize,
    /// Number of concurrent payment workers.
    pub worker_count: usize,
    /// Gateway attempts per job.
    pub max_attempts: u32,
    /// Backoff unit; attempt `n` waits `n * backoff_step_secs` before retrying.
    pub backoff_step_secs: u64,
    /// How long an idle worker waits on the queue before re-checking cancellation.
    pub poll_interval_ms: u64,
    /// Dead letters retained in memory.
    pub dead_letter_capacity: usize,
    /// Gateway endpoint.
    pub gateway: GatewayConfig,
    /// Submission rules.
    pub approval: ApprovalPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            worker_count: 5,
            max_attempts: 3,
            backoff_step_secs: 2,
            poll_interval_ms: 100,
            dead_letter_capacity: 1000,
            gateway: GatewayConfig::default(),
            approval: ApprovalPolicy::default(),
        }
    }
}

impl DispatchConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be greater than 0".into());
        }
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".into());
        }
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".into());
        }
        if self.dead_letter_capacity == 0 {
            return Err("dead_letter_capacity must be greater than 0".into());
        }
        if self.gateway.base_url.trim().is_empty() {
            return Err("gateway.base_url must not be empty".into());
        }
        if self.gateway.timeout_secs == 0 {
            return Err("gateway.timeout_secs must be greater than 0".into());
        }
        if self.approval.threshold <= 0 {
            return Err("approval.threshold must be greater than 0".into());
        }
        if self.approval.min_amount > self.approval.max_amount {
            return Err("approval.min_amount must not exceed approval.max_amount".into());
        }
        Ok(())
    }

    /// Backoff unit as a duration.
    #[must_use]
    pub const fn backoff_step(&self) -> Duration {
        Duration::from_secs(self.backoff_step_secs)
    }

    /// Idle poll interval as a duration.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a message on malformed JSON or invalid values.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the environment, reading a `.env` file first if present.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a message when a variable is set but malformed, or the result is invalid.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (environment-shaped).
    ///
    /// # Errors
    ///
    /// Same as [`DispatchConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(url) = lookup("PAYMENT_API_URL").filter(|v| !v.is_empty()) {
            cfg.gateway.base_url = url;
        }
        override_parsed(&lookup, "PAYMENT_TIMEOUT_SECS", &mut cfg.gateway.timeout_secs)?;
        override_parsed(&lookup, "PAYMENT_QUEUE_CAPACITY", &mut cfg.queue_capacity)?;
        override_parsed(&lookup, "WORKER_POOL_SIZE", &mut cfg.worker_count)?;
        override_parsed(&lookup, "WORKER_MAX_RETRIES", &mut cfg.max_attempts)?;
        override_parsed(&lookup, "WORKER_BACKOFF_STEP_SECS", &mut cfg.backoff_step_secs)?;
        override_parsed(&lookup, "APPROVAL_THRESHOLD", &mut cfg.approval.threshold)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, slot: &mut T) -> Result<(), String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(key).filter(|v| !v.is_empty()) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|e| format!("{key}: cannot parse `{raw}`: {e}"))?;
    }
    Ok(())
}
