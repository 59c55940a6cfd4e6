//! Core types and service wiring for the hentedag waste pickup sensors.

/// Domain models shared by the store, the sensors and the providers.
pub mod model;
/// Traits describing the provider and clock interfaces.
pub mod ports;
/// Per-category sensors with a staleness-driven refresh policy.
pub mod sensor;
/// High-level service that sets up and polls the sensors of one address.
pub mod service;
/// Shared schedule cache with single-flight refreshes.
pub mod store;

pub use model::*;
pub use ports::*;
pub use sensor::*;
pub use service::*;
pub use store::*;

#[cfg(test)]
mod testing;
