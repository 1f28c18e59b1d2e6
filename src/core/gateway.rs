//! Payment gateway abstraction and outcome classification.

use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single payment attempt.
///
/// Only [`GatewayError::IdempotencyConflict`] is treated as a settled payment;
/// every other variant is an ordinary failure eligible for retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The gateway has already seen this external id.
    #[error("external id already exists")]
    IdempotencyConflict,
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-success HTTP status.
    #[error("payment failed with status {status}")]
    Status {
        /// HTTP status code returned by the gateway.
        status: u16,
        /// Gateway message, if one was returned.
        message: Option<String>,
    },
    /// HTTP 200 but the payment status was not `success`.
    #[error("payment status: {0}")]
    NotSuccessful(String),
    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Whether the gateway reported the external id as already used.
    #[must_use]
    pub const fn is_idempotency_conflict(&self) -> bool {
        matches!(self, Self::IdempotencyConflict)
    }
}

/// One synchronous request/response exchange with the payment provider.
///
/// Implementations perform exactly one attempt per call and never retry.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Request a payout of `amount` keyed by `external_id`.
    ///
    /// Returns the gateway payment id on success.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] classifying the failed attempt.
    async fn create_payment(&self, amount: i64, external_id: &str) -> Result<String, GatewayError>;
}
