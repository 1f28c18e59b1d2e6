//! Builders to construct the dispatch system from configuration.

pub mod dispatch_builder;

pub use dispatch_builder::{build_dispatch_system, build_http_dispatch_system, DispatchSystem};
