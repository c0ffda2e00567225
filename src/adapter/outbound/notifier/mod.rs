//! Alert delivery adapters.
//!
//! Implements the `port::outbound::notifier::AlertSink` trait for chat
//! backends. The null and logging sinks live next to the trait.

#[cfg(feature = "telegram")]
pub mod telegram;
