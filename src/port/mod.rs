//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Outbound ports describe what the monitor needs from the outside world:
//! prices, sentiment, a place to deliver alerts, somewhere to persist state
//! and a source of time. Adapters in [`crate::adapter`] implement them.

pub mod outbound;
