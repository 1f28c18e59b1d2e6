//! Payment gateway clients.

pub mod http;

pub use http::{classify_response, HttpPaymentGateway};
