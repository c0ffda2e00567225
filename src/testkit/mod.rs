//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`clock`]: a manually advanced [`Clock`](crate::port::outbound::clock::Clock).
//! - [`source`]: scripted price and sentiment sources.
//! - [`sink`]: an alert sink that records deliveries.
//! - [`store`]: an in-memory state store.
//! - [`domain`]: builders for assets, samples and snapshots.

pub mod clock;
pub mod domain;
pub mod sink;
pub mod source;
pub mod store;
