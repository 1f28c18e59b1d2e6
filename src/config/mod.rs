//! Configuration models for the queue, workers, gateway and approval rules.

pub mod dispatch;
pub mod pool;

pub use dispatch::{ApprovalPolicy, DispatchConfig, GatewayConfig};
pub use pool::WorkerPoolConfig;
