//! Queue backends.

pub mod memory;

pub use memory::{BoundedQueue, PaymentQueue, Pop, RejectReason, Rejected};
