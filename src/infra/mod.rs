//! Infrastructure adapters: the job queue, expense storage and the HTTP gateway.

pub mod gateway;
pub mod queue;
pub mod repository;

pub use gateway::HttpPaymentGateway;
pub use queue::{BoundedQueue, PaymentQueue};
pub use repository::InMemoryExpenseRepository;
