//! Worker thread settings.

use std::time::Duration;

use crate::config::DispatchConfig;

/// Thread-level settings for the payment worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Number of worker threads.
    pub worker_count: usize,
    /// How long an idle worker blocks on the queue before re-checking cancellation.
    pub poll_interval: Duration,
    /// Stack size of each worker thread in bytes.
    pub thread_stack_size: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerPoolConfig {
    /// Defaults: five workers, 100 ms poll interval, 2 MiB stacks.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            worker_count: 5,
            poll_interval: Duration::from_millis(100),
            thread_stack_size: 2 * 1024 * 1024,
        }
    }

    /// Derive pool settings from the dispatch configuration.
    #[must_use]
    pub fn from_dispatch(cfg: &DispatchConfig) -> Self {
        Self::new()
            .with_worker_count(cfg.worker_count)
            .with_poll_interval(cfg.poll_interval())
    }

    /// Set the number of workers.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the idle poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Validate pool settings.
    ///
    /// # Errors
    ///
    /// Returns a message naming the invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.poll_interval.is_zero() {
            return Err("poll_interval must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64 KiB".into());
        }
        Ok(())
    }
}
