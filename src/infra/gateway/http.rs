//! HTTP/JSON client for the external payment gateway.
//!
//! Wire contract:
//! - `POST {base_url}/v1/payments` with `{"amount": <int>, "external_id": <string>}`
//! - response `{"data": {"id", "external_id", "status"}, "message"?}`
//! - `200` with `data.status == "success"` is a payment; `400` with message
//!   `external id already exists` is an idempotency conflict; anything else fails.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GatewayConfig;
use crate::core::error::DispatchError;
use crate::core::gateway::{GatewayError, PaymentGateway};

/// Message the gateway returns when an external id is reused.
pub const IDEMPOTENCY_CONFLICT_MESSAGE: &str = "external id already exists";

#[derive(Debug, Serialize)]
struct PaymentRequest<'a> {
    amount: i64,
    external_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    #[serde(default)]
    data: Option<PaymentData>,
    #[serde(default)]
    message: Option<String>,
}

/// Classify a gateway response into a payment id or a [`GatewayError`].
///
/// # Errors
///
/// Returns the error variant matching the failed outcome.
pub fn classify_response(status: u16, body: &str) -> Result<String, GatewayError> {
    let parsed: Result<PaymentResponse, _> = serde_json::from_str(body);

    if status == 400 {
        if let Ok(PaymentResponse {
            message: Some(message),
            ..
        }) = &parsed
        {
            if message == IDEMPOTENCY_CONFLICT_MESSAGE {
                return Err(GatewayError::IdempotencyConflict);
            }
        }
    }

    if status != 200 {
        return Err(GatewayError::Status {
            status,
            message: parsed.ok().and_then(|r| r.message),
        });
    }

    let response = parsed.map_err(|e| GatewayError::Decode(e.to_string()))?;
    let data = response.data.unwrap_or_default();
    if data.status != "success" {
        return Err(GatewayError::NotSuccessful(data.status));
    }
    Ok(data.id)
}

/// Gateway client performing one POST per attempt.
pub struct HttpPaymentGateway {
    client: Client,
    endpoint: String,
}

impl HttpPaymentGateway {
    /// Create a client for the configured gateway.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, DispatchError> {
        // Each worker drives its own runtime; pooled connections would be tied to
        // whichever runtime opened them.
        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| DispatchError::Config(format!("gateway client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/payments", config.base_url.trim_end_matches('/')),
        })
    }

    /// Full URL payments are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_payment(&self, amount: i64, external_id: &str) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&PaymentRequest { amount, external_id })
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        debug!(external_id, status, "Gateway responded");
        classify_response(status, &body)
    }
}
