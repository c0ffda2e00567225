//! Pegwatch - stablecoin peg monitoring with tiered alert dispatch.
//!
//! Every cycle fetches prices for the tracked assets, classifies their
//! deviation from the peg, scores depeg risk, and fans alerts out to
//! subscriber channels gated by per-tier thresholds and cooldowns.
//!
//! # Architecture
//!
//! - [`domain`] - Source-agnostic types and pure classification
//! - [`port`] - Traits the application depends on (price, sentiment, sink, store, clock)
//! - [`application`] - Risk engine, resilience layer, dispatch controller, scheduler
//! - [`adapter`] - CoinGecko, Telegram, JSON state file, and the CLI
//! - [`infrastructure`] - Configuration, composition root, runtime loop, health
//!
//! # Features
//!
//! - `telegram` (default) - Deliver alerts through a Telegram bot
//! - `testkit` - Expose deterministic fakes for integration tests

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
