//! Job handling trait run by payment workers.

use async_trait::async_trait;

use crate::core::expense::PaymentJob;
use crate::core::retry::{PaymentOutcome, PaymentProcessor};

/// Processes one dequeued payment job to a terminal outcome.
///
/// The worker pool clones the handler into every worker thread. Each thread
/// drives `handle` on its own single-threaded tokio runtime, so handlers may
/// sleep and await I/O without blocking other workers.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use expense_dispatch::core::{JobHandler, PaymentJob, PaymentOutcome};
///
/// #[derive(Clone)]
/// struct AlwaysPaid;
///
/// #[async_trait]
/// impl JobHandler for AlwaysPaid {
///     async fn handle(&self, job: PaymentJob) -> PaymentOutcome {
///         PaymentOutcome::Paid { payment_id: format!("pay-{}", job.expense_id), attempts: 1 }
///     }
/// }
/// ```
#[async_trait]
pub trait JobHandler: Send + Sync + Clone + 'static {
    /// Handle the job. Must not return before the job is terminal.
    async fn handle(&self, job: PaymentJob) -> PaymentOutcome;
}

#[async_trait]
impl JobHandler for PaymentProcessor {
    async fn handle(&self, job: PaymentJob) -> PaymentOutcome {
        self.process(job).await
    }
}
