//! Shared utilities.

pub mod clock;
pub mod keyed_lock;
pub mod telemetry;

pub use clock::now_ms;
pub use keyed_lock::{KeyedGuard, KeyedLock};
pub use telemetry::init_tracing;
