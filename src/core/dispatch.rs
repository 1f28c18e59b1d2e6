//! Seam between the state machine and the payment queue.

use crate::core::error::DispatchError;
use crate::core::expense::PaymentJob;

/// Non-blocking hand-off of a payment job to asynchronous processing.
pub trait PaymentDispatch: Send + Sync {
    /// Offer a job without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::QueueFull`] when the job was dropped for lack
    /// of capacity, or [`DispatchError::QueueClosed`] after shutdown began.
    fn dispatch(&self, job: PaymentJob) -> Result<(), DispatchError>;
}

/// What happened to the payment job produced by a transition.
#[derive(Debug)]
pub enum DispatchState {
    /// The transition does not produce a job.
    NotRequired,
    /// The job was accepted by the queue.
    Queued,
    /// The job was dropped; the expense stays payable until reconciled.
    Dropped(DispatchError),
}

impl DispatchState {
    /// Whether a job was accepted.
    #[must_use]
    pub const fn is_queued(&self) -> bool {
        matches!(self, Self::Queued)
    }
}
