//! Outbound adapters (driven side).

pub mod coingecko;
pub mod notifier;
pub mod sentiment;
pub mod state;
